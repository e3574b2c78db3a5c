//! Request/response message types, split per domain.

pub mod params;
pub mod results;
pub mod watch;

pub use params::*;
pub use results::*;
pub use watch::*;

use serde::Deserialize;
use serde::Serialize;

/// One RPC method call: every facade method is addressed as
/// `(facade, id, method+args)`.
///
/// The instance id is empty for ordinary facades; the watcher facades are
/// addressed with the resource id returned by the subscribe call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCall {
    /// Facade name, e.g. `"Client"` or `"NotifyWatcher"`.
    pub facade: String,
    /// Facade instance id; empty unless the facade is instance-addressed.
    #[serde(default)]
    pub id: String,
    /// Method selector plus its arguments.
    pub request: ApiRequest,
}

impl ApiCall {
    pub fn new(facade: impl Into<String>, request: ApiRequest) -> ApiCall {
        ApiCall {
            facade: facade.into(),
            id: String::new(),
            request,
        }
    }

    pub fn with_id(facade: impl Into<String>, id: impl Into<String>, request: ApiRequest) -> ApiCall {
        ApiCall {
            facade: facade.into(),
            id: id.into(),
            request,
        }
    }
}

/// Method selector and arguments for every facade method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiRequest {
    // Shared capability endpoints.
    Life(Entities),
    SetStatus(SetStatusArgs),
    EnsureDead(Entities),
    Watch(Entities),
    WatchUnits(Entities),
    WatchEnvironMachines,
    WatchForEnvironConfigChanges,
    EnvironConfig,
    InstanceId(Entities),

    // Key distribution.
    AuthorizedKeys(Entities),
    WatchAuthorizedKeys(Entities),

    // Client administrative operations.
    DestroyEnvironment,
    DestroySystem(DestroySystemArgs),
    DestroyMachines(DestroyMachinesArgs),
    DestroyUnits(DestroyUnitsArgs),
    Run(RunArgs),
    RunOnAllMachines(RunOnAllMachinesArgs),

    // Watcher polling, addressed by facade instance id.
    WatcherNext,
    WatcherStop,
}

/// Results for every facade method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiResponse {
    /// Operation completed; nothing to report.
    Empty,
    Life(LifeResults),
    Errors(ErrorResults),
    Strings(StringResults),
    StringsLists(StringsResults),
    EnvironConfig(EnvironConfigResult),
    Exec(ExecResults),
    NotifyWatch(NotifyWatchResult),
    NotifyWatches(NotifyWatchResults),
    StringsWatch(StringsWatchResult),
    StringsWatches(StringsWatchResults),
}
