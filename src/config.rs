//! Configuration resolution for the Shinwa Agent backend.
//!
//! Settings are resolved from three layers, lowest precedence first:
//! built-in defaults, an optional `.env` file in the working directory,
//! and live process environment variables. Keys are matched
//! case-insensitively and unknown keys are ignored.
//!
//! Recognized keys:
//! - `API_HOST` - Optional. HTTP bind address. Defaults to `0.0.0.0`.
//! - `API_PORT` - Optional. HTTP bind port. Defaults to `8000`.
//! - `CORS_ORIGINS` - Optional. Comma-separated list of allowed origins.
//! - `DATABASE_URL` - Optional. Database connection string.
//! - `REDIS_URL` - Optional. Redis connection string.
//! - `OPENAI_API_KEY` - Optional. API key for the built-in LLM client.
//! - `OPENAI_BASE_URL` - Optional. Override endpoint for the LLM client.
//! - `OPENAI_MODEL` - Optional. Model identifier. Defaults to `gpt-4.1-mini`.
//! - `SECRET_KEY` - Optional. Signing secret.
//! - `SANDBOX_ROOT` - Optional. Filesystem root for sandboxed execution.
//! - `PROACTIVE_MODE` - Optional. One of `reactive`, `proactive`, `dormant`.
//! - `MAX_FREQUENCY_PER_HOUR` - Optional. Proactive message rate cap.
//! - `COOLDOWN_MINUTES` - Optional. Minimum gap between proactive messages.
//! - `DND_HOURS` - Optional. Comma-separated do-not-disturb hours (0-23).
//! - `LOG_LEVEL` - Optional. Defaults to `INFO`.
//! - `STRUCTURED_LOGGING` - Optional. `true` emits JSON log lines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Env file consulted by [`Settings::load`], relative to the working directory.
const ENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Malformed env file {0}: {1}")]
    EnvFile(String, String),
}

/// Proactive-engagement mode for the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProactiveMode {
    /// Only acts on incoming requests.
    #[default]
    Reactive,
    /// May initiate contact, within the configured rate limits.
    Proactive,
    /// Never initiates contact and ignores proactive scheduling.
    Dormant,
}

impl ProactiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProactiveMode::Reactive => "reactive",
            ProactiveMode::Proactive => "proactive",
            ProactiveMode::Dormant => "dormant",
        }
    }
}

impl FromStr for ProactiveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reactive" => Ok(ProactiveMode::Reactive),
            "proactive" => Ok(ProactiveMode::Proactive),
            "dormant" => Ok(ProactiveMode::Dormant),
            other => Err(format!(
                "expected one of reactive, proactive, dormant; got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for ProactiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved application settings.
///
/// Values are fixed once constructed; a fresh view of the environment
/// requires a new instance (see [`reload_settings`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// HTTP bind address
    pub api_host: String,

    /// HTTP bind port
    pub api_port: u16,

    /// Origins allowed to make cross-origin requests
    pub cors_origins: Vec<String>,

    /// Database connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// API key for the built-in LLM client (empty when unset)
    pub openai_api_key: String,

    /// Override endpoint for the LLM client (empty when unset)
    pub openai_base_url: String,

    /// Model identifier for the built-in LLM client
    pub openai_model: String,

    /// Signing secret
    pub secret_key: String,

    /// Filesystem root for sandboxed execution
    pub sandbox_root: PathBuf,

    /// Proactive-engagement mode
    pub proactive_mode: ProactiveMode,

    /// Maximum proactive messages per hour
    pub max_frequency_per_hour: u32,

    /// Minimum gap between proactive messages, in minutes
    pub cooldown_minutes: u32,

    /// Hours of the day (0-23) during which the agent stays quiet
    pub dnd_hours: Vec<u8>,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones
    pub structured_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            database_url: "sqlite:///./shinwa_agent.db".to_string(),
            redis_url: "redis://localhost:6379/0".to_string(),
            openai_api_key: String::new(),
            openai_base_url: String::new(),
            openai_model: "gpt-4.1-mini".to_string(),
            secret_key: "dev-secret-key-change-in-production".to_string(),
            sandbox_root: PathBuf::from("/workspace"),
            proactive_mode: ProactiveMode::Reactive,
            max_frequency_per_hour: 3,
            cooldown_minutes: 15,
            dnd_hours: vec![22, 23, 0, 1, 2, 3, 4, 5, 6],
            log_level: "INFO".to_string(),
            structured_logging: true,
        }
    }
}

impl Settings {
    /// Resolve settings from `.env` (if present) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when an override cannot be coerced
    /// to its field's type, and `ConfigError::EnvFile` when a present `.env`
    /// file contains a malformed line.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(ENV_FILE))
    }

    /// Resolve settings against an explicit env file path.
    pub fn load_from(env_file: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(env_file, std::env::vars())
    }

    /// Resolver with the environment passed in explicitly.
    /// Tests inject pairs here instead of mutating process state.
    fn from_sources(
        env_file: &Path,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let mut overlay: HashMap<String, String> = HashMap::new();

        match dotenvy::from_path_iter(env_file) {
            Ok(entries) => {
                for entry in entries {
                    let (key, value) = entry.map_err(|e| {
                        ConfigError::EnvFile(env_file.display().to_string(), e.to_string())
                    })?;
                    overlay.insert(key.to_ascii_lowercase(), value);
                }
            }
            // The env file is optional; a file we cannot open is skipped.
            Err(dotenvy::Error::Io(e)) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        "Skipping unreadable env file {}: {}",
                        env_file.display(),
                        e
                    );
                }
            }
            Err(e) => {
                return Err(ConfigError::EnvFile(
                    env_file.display().to_string(),
                    e.to_string(),
                ));
            }
        }

        // Live environment wins over the file.
        for (key, value) in env {
            overlay.insert(key.to_ascii_lowercase(), value);
        }

        Self::resolve(&overlay)
    }

    /// Apply an overlay of case-folded key/value pairs on top of defaults.
    fn resolve(overlay: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        if let Some(v) = overlay.get("api_host") {
            settings.api_host = v.clone();
        }
        if let Some(v) = overlay.get("api_port") {
            settings.api_port = parse_int("api_port", v)?;
        }
        if let Some(v) = overlay.get("cors_origins") {
            settings.cors_origins = parse_string_list(v);
        }
        if let Some(v) = overlay.get("database_url") {
            settings.database_url = v.clone();
        }
        if let Some(v) = overlay.get("redis_url") {
            settings.redis_url = v.clone();
        }
        if let Some(v) = overlay.get("openai_api_key") {
            settings.openai_api_key = v.clone();
        }
        if let Some(v) = overlay.get("openai_base_url") {
            settings.openai_base_url = v.clone();
        }
        if let Some(v) = overlay.get("openai_model") {
            settings.openai_model = v.clone();
        }
        if let Some(v) = overlay.get("secret_key") {
            settings.secret_key = v.clone();
        }
        if let Some(v) = overlay.get("sandbox_root") {
            settings.sandbox_root = PathBuf::from(v);
        }
        if let Some(v) = overlay.get("proactive_mode") {
            settings.proactive_mode = v
                .parse()
                .map_err(|e| ConfigError::InvalidValue("proactive_mode".to_string(), e))?;
        }
        if let Some(v) = overlay.get("max_frequency_per_hour") {
            settings.max_frequency_per_hour = parse_int("max_frequency_per_hour", v)?;
        }
        if let Some(v) = overlay.get("cooldown_minutes") {
            settings.cooldown_minutes = parse_int("cooldown_minutes", v)?;
        }
        if let Some(v) = overlay.get("dnd_hours") {
            settings.dnd_hours = parse_int_list("dnd_hours", v)?;
        }
        if let Some(v) = overlay.get("log_level") {
            settings.log_level = v.clone();
        }
        if let Some(v) = overlay.get("structured_logging") {
            settings.structured_logging = parse_bool("structured_logging", v)?;
        }

        Ok(settings)
    }
}

fn parse_int<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(field.to_string(), format!("{e} (got '{value}')")))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            field.to_string(),
            format!("expected a boolean, got '{value}'"),
        )),
    }
}

/// Split a comma-separated value, dropping empty items, so an empty string
/// yields an empty list.
fn parse_string_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_int_list(field: &str, value: &str) -> Result<Vec<u8>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_int(field, item))
        .collect()
}

/// Process-wide settings cache.
static SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Return the process-wide settings, constructing them on first call.
///
/// The instance is cached; later changes to the environment are not visible
/// until [`reload_settings`] is called. A construction failure propagates and
/// leaves the cache empty, so the next call resolves again.
pub fn get_settings() -> Result<Arc<Settings>, ConfigError> {
    if let Some(settings) = SETTINGS.read().expect("settings lock poisoned").as_ref() {
        return Ok(Arc::clone(settings));
    }

    let mut cached = SETTINGS.write().expect("settings lock poisoned");
    // Re-check: another thread may have populated the cache between the read
    // and write lock acquisitions.
    if let Some(settings) = cached.as_ref() {
        return Ok(Arc::clone(settings));
    }

    let settings = Arc::new(Settings::load()?);
    *cached = Some(Arc::clone(&settings));
    Ok(settings)
}

/// Re-resolve settings from the current environment and replace the cache.
///
/// In-flight holders of the previous instance keep their unchanged view; the
/// swap only affects later [`get_settings`] calls. On failure the previously
/// cached instance stays in place.
pub fn reload_settings() -> Result<Arc<Settings>, ConfigError> {
    let settings = Arc::new(Settings::load()?);
    *SETTINGS.write().expect("settings lock poisoned") = Some(Arc::clone(&settings));
    Ok(settings)
}
