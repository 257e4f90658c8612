//! Console-side client configuration.

use serde::{Deserialize, Serialize};

/// Settings used by the administration console when talking to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the `/api` surface.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// JSON file holding the personal hidden-menu list.
    #[serde(default = "default_hide_store_path")]
    pub hide_store_path: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            hide_store_path: default_hide_store_path(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3001/api".to_string()
}

fn default_hide_store_path() -> String {
    "data/hidden_menus.json".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
