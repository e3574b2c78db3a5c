//! Capability mixins.
//!
//! Small reusable endpoint bundles, each parameterized by one AuthFunc
//! factory and a handle on the state backend. A facade assembles the set
//! it needs by holding one field per capability and delegating. No
//! implicit promotion, every delegation is written out at the facade.

pub mod dead;
pub mod instance_id;
pub mod life;
pub mod status;
pub mod watch;

pub use dead::DeadEnsurer;
pub use instance_id::InstanceIdGetter;
pub use life::LifeGetter;
pub use status::StatusSetter;
pub use watch::AgentEntityWatcher;
pub use watch::EnvironConfigWatcher;
pub use watch::EnvironMachinesWatcher;
pub use watch::UnitsWatcher;

use flotilla_api::ErrorInfo;
use flotilla_api::ErrorResult;
use flotilla_core::Error;

/// Fold a per-item outcome into an [`ErrorResult`] slot.
pub(crate) fn to_error_result(slot: Result<(), Error>) -> ErrorResult {
    match slot {
        Ok(()) => ErrorResult::ok(),
        Err(err) => ErrorResult::err(ErrorInfo::from(err)),
    }
}
