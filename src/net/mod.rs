//! Networking: wire types, the transport seam and the API gateway.
//!
//! SYSTEM CONTEXT
//! ==============
//! `gateway` is what the rest of the crate calls; `transport` is the only code
//! that performs I/O; `types` defines the auth endpoint payloads.

pub mod gateway;
pub mod transport;
pub mod types;

pub use gateway::ApiGateway;
pub use transport::{ApiResponse, HttpRequest, HttpTransport, ReqwestTransport, RequestBody, RequestOptions};
pub use types::{LoginResponse, RegisterRequest, UserSummary};
