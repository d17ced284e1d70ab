//! Shared types for the parley session client: user records, request payloads,
//! API errors and the Socket.IO wire codec.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::*;
pub use models::*;
pub use protocol::*;
