//! HTTP API for the Shinwa Agent backend.
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check

mod routes;
pub mod types;

pub use routes::serve;
pub use types::*;
