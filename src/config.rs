//! Run configuration
//!
//! Defaults live here; an optional JSON config file can override them and CLI
//! flags override both. A corrupt config file is warned about and ignored
//! rather than aborting the run.

use crate::client;
use crate::filter;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_model() -> String {
    "openai/gpt-4-turbo".to_string()
}

fn default_max_attempts() -> u32 {
    50
}

fn default_endpoint() -> String {
    client::DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_case_timeout_secs() -> u64 {
    10
}

fn default_denylist() -> Vec<String> {
    filter::default_denylist()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model identifier sent to the generation service
    #[serde(default = "default_model")]
    pub model: String,
    /// Attempt ceiling before the loop gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Chat-completions endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Timeout for one generation-service round trip
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Wall-clock bound on a single candidate invocation
    #[serde(default = "default_case_timeout_secs")]
    pub case_timeout_secs: u64,
    /// Forbidden-construct denylist for the hallucination filter
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_attempts: default_max_attempts(),
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            case_timeout_secs: default_case_timeout_secs(),
            denylist: default_denylist(),
        }
    }
}

impl RunConfig {
    /// Load from a JSON file, falling back to defaults (with a warning) if
    /// the file is unreadable or corrupt.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!(
                        "  Warning: Config file {} is corrupt ({}). Using defaults.",
                        path.display(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!(
                    "  Warning: Could not read config file {} ({}). Using defaults.",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// API key from the environment: `OPENROUTER_API_KEY`, then
    /// `OPENAI_API_KEY`.
    pub fn api_key() -> Option<String> {
        std::env::var("OPENROUTER_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty())
    }
}
