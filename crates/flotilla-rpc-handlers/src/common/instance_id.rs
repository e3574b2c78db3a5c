//! Batched instance-id lookup.

use std::sync::Arc;

use flotilla_api::Entities;
use flotilla_api::ErrorInfo;
use flotilla_api::StringResult;
use flotilla_api::StringResults;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Entity;
use flotilla_core::Error;
use flotilla_core::MachineEntity;
use flotilla_core::StateBackend;
use flotilla_rpc_core::run_batch;

/// Looks up the provider instance ids of a batch of machines.
pub struct InstanceIdGetter {
    state: Arc<dyn StateBackend>,
    get_auth: AuthFuncFactory,
}

impl InstanceIdGetter {
    pub fn new(state: Arc<dyn StateBackend>, get_auth: AuthFuncFactory) -> InstanceIdGetter {
        InstanceIdGetter { state, get_auth }
    }

    pub async fn instance_id(&self, args: &Entities) -> Result<StringResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            async move {
                match state.find_entity(&tag).await? {
                    Entity::Machine(machine) => Ok(machine.instance_id().await?.to_string()),
                    _ => Err(Error::backend(format!("{tag} is not a machine"))),
                }
            }
        })
        .await;
        Ok(StringResults {
            results: slots
                .into_iter()
                .map(|slot| match slot {
                    Ok(id) => StringResult {
                        result: Some(id),
                        error: None,
                    },
                    Err(err) => StringResult {
                        result: None,
                        error: Some(ErrorInfo::from(err)),
                    },
                })
                .collect(),
        })
    }
}
