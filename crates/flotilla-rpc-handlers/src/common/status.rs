//! Batched status updates.

use std::sync::Arc;

use flotilla_api::ErrorResults;
use flotilla_api::SetStatusArgs;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_core::Tag;

use crate::common::to_error_result;

/// Sets the status of a batch of entities.
///
/// Carries its own item loop rather than using `run_batch` because each
/// item brings a status payload alongside its tag; the protocol is the
/// same: parse, authorize, operate, one slot per item in input order.
pub struct StatusSetter {
    state: Arc<dyn StateBackend>,
    get_auth: AuthFuncFactory,
}

impl StatusSetter {
    pub fn new(state: Arc<dyn StateBackend>, get_auth: AuthFuncFactory) -> StatusSetter {
        StatusSetter { state, get_auth }
    }

    pub async fn set_status(&self, args: &SetStatusArgs) -> Result<ErrorResults, Error> {
        let auth = (self.get_auth)().await?;
        let mut results = Vec::with_capacity(args.entities.len());
        for item in &args.entities {
            let slot = match Tag::parse(&item.tag) {
                Err(err) => Err(err),
                Ok(tag) if !auth(&tag) => Err(Error::PermissionDenied),
                Ok(tag) => match self.state.find_entity(&tag).await {
                    Err(err) => Err(err),
                    Ok(entity) => entity.set_status(item.status, &item.info).await,
                },
            };
            results.push(to_error_result(slot));
        }
        Ok(ErrorResults { results })
    }
}
