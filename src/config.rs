//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `SERVER_ORIGIN`: Base URL of the ceremony server (default: http://localhost:8080)
//! - `CEREMONY_TIMEOUT_SECS`: Upper bound for one authenticator interaction (unset = wait forever)
//! - `RELOAD_PATH`: Path of the development reload event stream (default: /__livereload)

use anyhow::Result;
use std::{env, time::Duration};

use crate::ceremony::Flow;

/// Origin used when `SERVER_ORIGIN` is not set, matching the demo server's
/// default bind address.
pub const DEFAULT_SERVER_ORIGIN: &str = "http://localhost:8080";

/// Path of the server-sent-events endpoint the reload listener subscribes to.
pub const DEFAULT_RELOAD_PATH: &str = "/__livereload";

/// Client configuration
///
/// This struct holds everything the ceremony client needs to find its server.
/// All fields are public for easy access from other modules.
///
/// The `#[derive(Debug, Clone)]` attributes allow:
/// - Debug: Pretty-printing the config for logging
/// - Clone: Making copies of the config (needed for sharing across tasks)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ceremony server
    /// Must include the protocol (http:// or https://)
    /// Example: "http://localhost:8080" or "https://example.com"
    pub server_origin: String,

    /// How long one authenticator interaction may take
    /// `None` means wait indefinitely, which is what browsers do by default
    pub authenticator_timeout: Option<Duration>,

    /// Path of the development reload event stream on the server
    pub reload_path: String,
}

impl ClientConfig {
    /// Create a configuration pointing at the given server origin,
    /// with no authenticator deadline and the default reload path.
    pub fn new(server_origin: impl Into<String>) -> Self {
        ClientConfig {
            server_origin: server_origin.into(),
            authenticator_timeout: None,
            reload_path: DEFAULT_RELOAD_PATH.to_string(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads variables from .env file (if present) using dotenvy
    /// 2. Reads each configuration value from environment
    /// 3. Falls back to sensible defaults if variables aren't set
    /// 4. Returns an error if required parsing fails (e.g., invalid timeout)
    ///
    /// ## Example .env file
    /// ```text
    /// SERVER_ORIGIN=http://localhost:8080
    /// CEREMONY_TIMEOUT_SECS=60
    /// RELOAD_PATH=/__livereload
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (dotenvy doesn't error if file missing)
        // This is useful for local development
        dotenvy::dotenv().ok();

        Ok(ClientConfig {
            // Where the ceremony server lives, protocol included
            server_origin: env::var("SERVER_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_SERVER_ORIGIN.to_string()),

            // Authenticator deadline in whole seconds
            // Parse string to u64, return error if invalid
            // The ? operator propagates parse errors
            authenticator_timeout: match env::var("CEREMONY_TIMEOUT_SECS") {
                Ok(secs) => Some(Duration::from_secs(secs.parse()?)),
                Err(_) => None,
            },

            // Development reload stream path
            reload_path: env::var("RELOAD_PATH")
                .unwrap_or_else(|_| DEFAULT_RELOAD_PATH.to_string()),
        })
    }

    /// URL of the options endpoint for a flow
    ///
    /// Example: "http://localhost:8080/auth/register"
    pub fn options_url(&self, flow: Flow) -> String {
        self.endpoint(flow.options_path())
    }

    /// URL of the validation endpoint for a flow
    ///
    /// Example: "http://localhost:8080/auth/validate-login"
    pub fn validate_url(&self, flow: Flow) -> String {
        self.endpoint(flow.validate_path())
    }

    /// URL of the development reload event stream
    pub fn reload_url(&self) -> String {
        self.endpoint(&self.reload_path)
    }

    // Joins origin and path without doubling or dropping the slash between
    // them, whichever way either side was written.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_origin.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
