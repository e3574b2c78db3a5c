//! Wire-shaped request and response types.
//!
//! Everything a facade accepts or returns crosses this crate: the
//! [`ApiRequest`]/[`ApiResponse`] enums, the per-domain params/results
//! structs, and the structured [`ErrorInfo`] surface. The transport that
//! frames these (and the login handshake that establishes the principal)
//! is out of scope; any request/response RPC layer that can carry serde
//! values will do.

pub mod error_info;
pub mod messages;

pub use error_info::ErrorCode;
pub use error_info::ErrorInfo;
pub use messages::*;
