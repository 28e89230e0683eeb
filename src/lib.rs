//! # Shinwa Agent
//!
//! Autonomous AI agent backend.
//!
//! This snapshot provides:
//! - Configuration resolution with env-file and environment overrides and a
//!   process-wide cached instance
//! - An HTTP surface with CORS wired from the resolved settings
//!
//! ## Modules
//! - `config`: settings resolution, the process-wide cache, and reload
//! - `api`: HTTP routes and response types

pub mod api;
pub mod config;

pub use config::{get_settings, reload_settings, ConfigError, ProactiveMode, Settings};
