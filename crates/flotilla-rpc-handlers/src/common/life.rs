//! Batched lifecycle lookup.

use std::sync::Arc;

use flotilla_api::Entities;
use flotilla_api::ErrorInfo;
use flotilla_api::LifeResult;
use flotilla_api::LifeResults;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_rpc_core::run_batch;

/// Looks up the lifecycle value of a batch of entities.
pub struct LifeGetter {
    state: Arc<dyn StateBackend>,
    get_auth: AuthFuncFactory,
}

impl LifeGetter {
    pub fn new(state: Arc<dyn StateBackend>, get_auth: AuthFuncFactory) -> LifeGetter {
        LifeGetter { state, get_auth }
    }

    pub async fn life(&self, args: &Entities) -> Result<LifeResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            async move { state.find_entity(&tag).await?.life().await }
        })
        .await;
        Ok(LifeResults {
            results: slots
                .into_iter()
                .map(|slot| match slot {
                    Ok(life) => LifeResult {
                        life: Some(life),
                        error: None,
                    },
                    Err(err) => LifeResult {
                        life: None,
                        error: Some(ErrorInfo::from(err)),
                    },
                })
                .collect(),
        })
    }
}
