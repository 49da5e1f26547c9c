//! Session client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TOKEN_KEY: &str = "authToken";
pub const DEFAULT_HOME_PATH: &str = "/";
pub const DEFAULT_ME_PATH: &str = "/api/v1/auth/me";
pub const DEFAULT_LOGIN_PATH: &str = "/api/v1/auth/login";
pub const DEFAULT_REGISTER_PATH: &str = "/api/v1/auth/register";
pub const DEFAULT_LOGIN_MODAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_SESSION_CHANGED_DELAY_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const TOKEN_FILE_DIR: &str = "chic-session";
const TOKEN_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Identity confirmation (`GET`, bearer).
    pub me: String,
    /// Credential exchange (`POST`, form-encoded).
    pub login: String,
    /// Account creation (`POST`, JSON).
    pub register: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            me: DEFAULT_ME_PATH.to_owned(),
            login: DEFAULT_LOGIN_PATH.to_owned(),
            register: DEFAULT_REGISTER_PATH.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Delays applied to UI effects that follow a successful action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiDelays {
    /// Wait between the registration success notice and opening the login modal.
    pub login_modal: Duration,
    /// Wait between the login success notice and the `SessionChanged` event.
    pub session_changed: Duration,
}

impl Default for UiDelays {
    fn default() -> Self {
        Self {
            login_modal: Duration::from_millis(DEFAULT_LOGIN_MODAL_DELAY_MS),
            session_changed: Duration::from_millis(DEFAULT_SESSION_CHANGED_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub base_url: String,
    pub token_key: String,
    /// File backing the token when running outside a browser.
    pub token_path: Option<PathBuf>,
    pub home_path: String,
    pub endpoints: Endpoints,
    pub delays: UiDelays,
    pub timeouts: Timeouts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            token_key: DEFAULT_TOKEN_KEY.to_owned(),
            token_path: None,
            home_path: DEFAULT_HOME_PATH.to_owned(),
            endpoints: Endpoints::default(),
            delays: UiDelays::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl SessionConfig {
    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `CHIC_BASE_URL`: server origin, trailing `/` trimmed
    /// - `CHIC_TOKEN_KEY`: storage key for the bearer token (default `authToken`)
    /// - `CHIC_TOKEN_PATH`: token file (default under the user config dir)
    /// - `CHIC_HOME_PATH`: redirect destination after logout (default `/`)
    /// - `CHIC_ME_PATH`, `CHIC_LOGIN_PATH`, `CHIC_REGISTER_PATH`
    /// - `CHIC_LOGIN_MODAL_DELAY_MS`: default 1000
    /// - `CHIC_SESSION_CHANGED_DELAY_MS`: default 500
    /// - `CHIC_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CHIC_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable does not parse.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CHIC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let token_key = lookup("CHIC_TOKEN_KEY").unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_owned());
        let token_path = lookup("CHIC_TOKEN_PATH").map(PathBuf::from).or_else(default_token_path);
        let home_path = lookup("CHIC_HOME_PATH").unwrap_or_else(|| DEFAULT_HOME_PATH.to_owned());

        let endpoints = Endpoints {
            me: lookup("CHIC_ME_PATH").unwrap_or_else(|| DEFAULT_ME_PATH.to_owned()),
            login: lookup("CHIC_LOGIN_PATH").unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_owned()),
            register: lookup("CHIC_REGISTER_PATH").unwrap_or_else(|| DEFAULT_REGISTER_PATH.to_owned()),
        };
        let delays = UiDelays {
            login_modal: Duration::from_millis(parse_u64(
                &lookup,
                "CHIC_LOGIN_MODAL_DELAY_MS",
                DEFAULT_LOGIN_MODAL_DELAY_MS,
            )?),
            session_changed: Duration::from_millis(parse_u64(
                &lookup,
                "CHIC_SESSION_CHANGED_DELAY_MS",
                DEFAULT_SESSION_CHANGED_DELAY_MS,
            )?),
        };
        let timeouts = Timeouts {
            request_secs: parse_u64(&lookup, "CHIC_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_u64(&lookup, "CHIC_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { base_url, token_key, token_path, home_path, endpoints, delays, timeouts })
    }

    /// Token file location, failing when neither the env nor the platform provides one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoStorageLocation`] when no path is configured.
    pub fn require_token_path(&self) -> Result<&PathBuf, ConfigError> {
        self.token_path.as_ref().ok_or(ConfigError::NoStorageLocation)
    }
}

fn default_token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(TOKEN_FILE_DIR).join(TOKEN_FILE_NAME))
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue { var: key.to_owned(), value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
