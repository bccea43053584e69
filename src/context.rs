//! Named Data Plane endpoints (kubeconfig-style contexts)
//!
//! Operators usually talk to more than one HAProxy instance; a context
//! names one Data Plane endpoint together with its credentials, and the
//! config file at `~/.dpsync/config` remembers them plus the currently
//! selected one.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Data Plane API port
pub const DEFAULT_DATAPLANE_PORT: u16 = 5555;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default config file location: ~/.dpsync/config
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dpsync")
        .join("config")
}

/// Errors that can occur during context operations
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Context '{0}' not found")]
    ContextNotFound(String),

    #[error("No current context set")]
    NoCurrentContext,

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to write config: {0}")]
    WriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single context naming one Data Plane endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Display name for this context
    pub name: String,
    /// URL of the Data Plane API (e.g., "http://10.0.0.5:5555")
    pub url: String,
    /// Basic-auth username
    #[serde(default = "default_username")]
    pub username: String,
    /// Basic-auth password; prefer the DPSYNC_PASSWORD environment
    /// variable for anything shared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Context {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: default_username(),
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            description: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// The complete configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Currently active context name
    #[serde(rename = "current-context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,

    /// Map of context name to context definition
    #[serde(default)]
    pub contexts: HashMap<String, Context>,
}

impl Config {
    /// Resolve the context the CLI should talk to
    ///
    /// An explicit name wins; otherwise the file's current context; a
    /// config with neither falls back to a localhost endpoint on the
    /// default port.
    pub fn resolve(&self, name: Option<&str>) -> Result<Context, ContextError> {
        match name.or(self.current_context.as_deref()) {
            Some(name) => get_context(self, name).cloned(),
            None => Ok(Context::new(
                "default",
                format!("http://127.0.0.1:{}", DEFAULT_DATAPLANE_PORT),
            )),
        }
    }
}

// ============================================================================
// Pure config manipulation (no I/O)
// ============================================================================

/// Parse config from YAML string
pub fn parse_config(content: &str) -> Result<Config, ContextError> {
    serde_yaml::from_str(content).map_err(|e| ContextError::ParseError(e.to_string()))
}

/// Serialize config to YAML string
pub fn serialize_config(config: &Config) -> Result<String, ContextError> {
    serde_yaml::to_string(config).map_err(|e| ContextError::WriteError(e.to_string()))
}

/// Add or update a context in the config
pub fn add_context(config: &mut Config, context: Context) {
    config.contexts.insert(context.name.clone(), context);
}

/// Remove a context from the config
pub fn remove_context(config: &mut Config, name: &str) -> Option<Context> {
    let removed = config.contexts.remove(name);
    if config.current_context.as_deref() == Some(name) {
        config.current_context = None;
    }
    removed
}

/// Set the current context
pub fn set_current_context(config: &mut Config, name: &str) -> Result<(), ContextError> {
    if !config.contexts.contains_key(name) {
        return Err(ContextError::ContextNotFound(name.to_string()));
    }
    config.current_context = Some(name.to_string());
    Ok(())
}

/// Get a context by name
pub fn get_context<'a>(config: &'a Config, name: &str) -> Result<&'a Context, ContextError> {
    config
        .contexts
        .get(name)
        .ok_or_else(|| ContextError::ContextNotFound(name.to_string()))
}

/// List all context names
pub fn list_contexts(config: &Config) -> Vec<&str> {
    let mut names: Vec<&str> = config.contexts.keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names
}

// ============================================================================
// I/O boundary functions
// ============================================================================

/// Load config from the default location
pub fn load_config() -> Result<Config, ContextError> {
    load_config_from(&default_config_path())
}

/// Load config from a specific path; a missing file is an empty config
pub fn load_config_from(path: &PathBuf) -> Result<Config, ContextError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Save config to the default location
pub fn save_config(config: &Config) -> Result<(), ContextError> {
    save_config_to(config, &default_config_path())
}

/// Save config to a specific path
pub fn save_config_to(config: &Config, path: &PathBuf) -> Result<(), ContextError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serialize_config(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
