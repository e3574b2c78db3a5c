//! Authorization for the flotilla control plane.
//!
//! There is no central ACL table. Whether a principal may touch a target
//! entity is decided purely from the shape of the two tags and the
//! principal's role, established once at login:
//!
//! - role predicates ([`Authorizer`]) gate facade construction, and
//! - per-call [`AuthFunc`] predicates gate each tag in a batch request.
//!
//! AuthFuncs are built by factories, once per RPC method invocation. Some
//! factories consult the state backend (e.g. resolving the authenticated
//! unit's owning service), which is why building one can fail; the result
//! must not be cached across calls, since that backing data can change.

pub mod authfunc;
pub mod principal;

pub use authfunc::auth_always;
pub use authfunc::auth_either;
pub use authfunc::auth_for_tag_kind;
pub use authfunc::auth_owner;
pub use authfunc::factory_always;
pub use authfunc::factory_const;
pub use authfunc::factory_for_tag_kind;
pub use authfunc::factory_owner;
pub use authfunc::factory_unit_or_owning_service;
pub use authfunc::AuthFunc;
pub use authfunc::AuthFuncFactory;
pub use principal::Authorizer;
pub use principal::Principal;
