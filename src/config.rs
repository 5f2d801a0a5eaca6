//! Runtime settings sourced from environment variables.
//!
//! Settings are loaded once at startup into an immutable struct and passed
//! into constructors; components never read the environment themselves.

use std::path::Path;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Planning horizon used when `PLANNER_TIME_HORIZON_HOURS` is not set.
pub const DEFAULT_TIME_HORIZON_HOURS: u32 = 8;

/// Runtime settings for Graph and OpenAI access.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Azure AD tenant for the client-credential flow.
    pub tenant_id: String,
    /// App registration client ID.
    pub client_id: String,
    /// App registration client secret.
    pub client_secret: SecretString,
    /// OpenAI API key.
    pub openai_api_key: SecretString,
    /// OpenAI model identifier.
    pub openai_model: String,
    /// Alternate OpenAI-compatible base URL.
    pub openai_base_url: Option<String>,
    /// Default planning horizon in hours.
    pub time_horizon_hours: u32,
}

impl Settings {
    /// Load settings from environment variables, optionally reading an env
    /// file first.
    ///
    /// `require_ai` and `require_graph` control which variables are hard
    /// requirements; when a group is not required its values fall back to
    /// `"offline"` placeholders so offline runs need no credentials.
    pub fn from_env(
        env_file: Option<&Path>,
        require_ai: bool,
        require_graph: bool,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = env_file
            && path.exists()
            && let Err(e) = dotenvy::from_path(path)
        {
            tracing::warn!(path = %path.display(), "Failed to load env file: {e}");
        }

        let tenant_id = graph_var("TEAMS_TENANT_ID", require_graph)?;
        let client_id = graph_var("TEAMS_CLIENT_ID", require_graph)?;
        let client_secret = graph_var("TEAMS_CLIENT_SECRET", require_graph)?;

        let openai_api_key = match env_var("OPENAI_API_KEY") {
            Some(key) => key,
            None if require_ai => {
                return Err(ConfigError::MissingRequired {
                    key: "OPENAI_API_KEY".into(),
                    hint: "Set it or run with --fake-ai for offline testing.".into(),
                });
            }
            None => "offline".to_string(),
        };

        let time_horizon_hours = match env_var("PLANNER_TIME_HORIZON_HOURS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PLANNER_TIME_HORIZON_HOURS".into(),
                message: format!("expected a whole number of hours, got '{raw}'"),
            })?,
            None => DEFAULT_TIME_HORIZON_HOURS,
        };

        Ok(Self {
            tenant_id,
            client_id,
            client_secret: SecretString::from(client_secret),
            openai_api_key: SecretString::from(openai_api_key),
            openai_model: env_var("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env_var("OPENAI_BASE_URL"),
            time_horizon_hours,
        })
    }
}

/// Read an env var, treating empty values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a Graph credential: required when Graph access is needed, an
/// `"offline"` placeholder otherwise.
fn graph_var(key: &str, required: bool) -> Result<String, ConfigError> {
    match env_var(key) {
        Some(value) => Ok(value),
        None if required => Err(ConfigError::MissingEnvVar(key.to_string())),
        None => Ok("offline".to_string()),
    }
}
