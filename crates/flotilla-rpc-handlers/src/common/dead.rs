//! Batched dead-ensure.

use std::sync::Arc;

use flotilla_api::Entities;
use flotilla_api::ErrorResults;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_rpc_core::run_batch;

use crate::common::to_error_result;

/// Advances a batch of entities to Dead.
pub struct DeadEnsurer {
    state: Arc<dyn StateBackend>,
    get_auth: AuthFuncFactory,
}

impl DeadEnsurer {
    pub fn new(state: Arc<dyn StateBackend>, get_auth: AuthFuncFactory) -> DeadEnsurer {
        DeadEnsurer { state, get_auth }
    }

    pub async fn ensure_dead(&self, args: &Entities) -> Result<ErrorResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            async move { state.find_entity(&tag).await?.ensure_dead().await }
        })
        .await;
        Ok(ErrorResults {
            results: slots.into_iter().map(to_error_result).collect(),
        })
    }
}
