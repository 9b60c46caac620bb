use crate::smartapi::session::Credentials;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub api_key: String,
    pub client_id: String,
    pub pin: String,
    pub totp_secret: String,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            mode: std::env::var("GREEKS_MODE").unwrap_or_else(|_| "server".to_string()),
            port: Self::get_port(),
            db_path: std::env::var("GREEKS_DB_PATH")
                .unwrap_or_else(|_| "./greeks.db".to_string())
                .into(),
            api_key: std::env::var("SMARTAPI_API_KEY").unwrap_or_default(),
            client_id: std::env::var("SMARTAPI_CLIENT_ID").unwrap_or_default(),
            pin: std::env::var("SMARTAPI_PIN").unwrap_or_default(),
            totp_secret: std::env::var("SMARTAPI_TOTP_SECRET").unwrap_or_default(),
        }
    }

    /// Get port from environment or default
    fn get_port() -> u16 {
        std::env::var("GREEKS_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .unwrap_or(3001)
    }

    /// Validate configuration: every credential must be present before a
    /// run can be triggered.
    pub fn validate(&self) -> Result<()> {
        for (value, var) in [
            (&self.api_key, "SMARTAPI_API_KEY"),
            (&self.client_id, "SMARTAPI_CLIENT_ID"),
            (&self.pin, "SMARTAPI_PIN"),
            (&self.totp_secret, "SMARTAPI_TOTP_SECRET"),
        ] {
            if value.trim().is_empty() {
                bail!("{} is not set", var);
            }
        }
        Ok(())
    }

    /// Credentials for one pipeline run's session.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            client_id: self.client_id.clone(),
            pin: self.pin.clone(),
            totp_secret: self.totp_secret.clone(),
        }
    }
}
