//! API response types.

use serde::Serialize;

/// Service banner returned from `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    /// Human-readable service name
    pub message: String,

    /// Crate version
    pub version: String,

    /// Always `running` while the process accepts requests
    pub status: String,
}

/// Health probe response returned from `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
