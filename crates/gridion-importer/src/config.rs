// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridion_core::ImportError;
use gridion_entsoe::Endpoint;
use gridion_types::DEFAULT_DERIVED_SOURCE_NAME;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "gridion.toml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Country code of the transmission zone to import for.
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// IANA timezone the zone's data is localized in. This is what we
    /// receive for the default zone, even if the platform documents
    /// Europe/Brussels.
    #[serde(default = "default_country_timezone")]
    pub country_timezone: String,

    /// API token for the production server.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// API token for the platform's test server.
    #[serde(default)]
    pub auth_token_test_server: Option<String>,

    /// Talk to the platform's iop test server instead of production.
    #[serde(default)]
    pub use_test_server: bool,

    /// Source name for data derived locally, like the CO₂ signal.
    #[serde(default = "default_derived_source_name")]
    pub derived_data_source_name: String,

    /// Path to the SQLite database.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_country_code() -> String {
    "NL".to_owned()
}

fn default_country_timezone() -> String {
    "Europe/Amsterdam".to_owned()
}

fn default_derived_source_name() -> String {
    DEFAULT_DERIVED_SOURCE_NAME.to_owned()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("gridion.db")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            country_timezone: default_country_timezone(),
            auth_token: None,
            auth_token_test_server: None,
            use_test_server: false,
            derived_data_source_name: default_derived_source_name(),
            database_path: default_database_path(),
        }
    }
}

impl AppConfig {
    /// Which API server to talk to.
    pub fn endpoint(&self) -> Endpoint {
        if self.use_test_server {
            Endpoint::TestServer
        } else {
            Endpoint::Production
        }
    }

    /// The token for the selected server. Missing credentials abort
    /// before any network call.
    pub fn resolve_auth_token(&self) -> Result<String, ImportError> {
        let (token, which) = if self.use_test_server {
            (&self.auth_token_test_server, "auth_token_test_server")
        } else {
            (&self.auth_token, "auth_token")
        };
        match token {
            Some(token) if !token.is_empty() => Ok(token.clone()),
            _ => Err(ImportError::Config(format!(
                "{which} is not set; generate one with your transparency platform account"
            ))),
        }
    }
}

/// Load configuration from `path`, or from `gridion.toml` when present,
/// or fall back to defaults. Environment variables `GRIDION_AUTH_TOKEN`
/// and `GRIDION_AUTH_TOKEN_TEST_SERVER` override the file values so
/// credentials can stay out of the file.
pub fn load_config_with_fallback(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                let text = std::fs::read_to_string(default)
                    .with_context(|| format!("Failed to read {DEFAULT_CONFIG_PATH}"))?;
                toml::from_str(&text)
                    .with_context(|| format!("Failed to parse {DEFAULT_CONFIG_PATH}"))?
            } else {
                info!("No config file found, using defaults");
                AppConfig::default()
            }
        }
    };

    if let Ok(token) = std::env::var("GRIDION_AUTH_TOKEN") {
        config.auth_token = Some(token);
    }
    if let Ok(token) = std::env::var("GRIDION_AUTH_TOKEN_TEST_SERVER") {
        config.auth_token_test_server = Some(token);
    }
    if config.auth_token.is_none() && !config.use_test_server {
        warn!("No auth token configured; imports will abort before fetching");
    }
    Ok(config)
}
