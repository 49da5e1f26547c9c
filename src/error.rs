//! Error types for the session core.
//!
//! DESIGN
//! ======
//! `ApiError` is the closed set of outcomes a request can fail with. The
//! gateway produces all four kinds; `Unauthorized` is only ever returned after
//! the session teardown already ran, so callers treat it as "stop", never as
//! "clean up".

/// Failure of a single API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server or no response arrived.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status other than 401.
    #[error("request failed with status {status}")]
    Http { status: u16, detail: Option<String> },

    /// The server answered 401. Session teardown has already happened.
    #[error("Unauthorized")]
    Unauthorized { detail: Option<String> },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Server-provided `detail` message, if the failure carried one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } | Self::Unauthorized { detail } => detail.as_deref(),
            Self::Network(_) | Self::MalformedResponse(_) => None,
        }
    }

    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Http { .. } => "E_HTTP",
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::MalformedResponse(_) => "E_MALFORMED_RESPONSE",
        }
    }
}

/// Failure of a user-initiated action (login, register).
///
/// By the time a caller sees one of these, it has already been surfaced as an
/// error notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected locally before any request was sent.
    #[error("{0}")]
    Invalid(String),

    /// Credentials were accepted but the follow-up identity check did not
    /// confirm the session.
    #[error("session could not be verified")]
    Unverified,
}

/// Failure of the durable token storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend exists on this platform but refused access.
    #[error("storage unavailable")]
    Unavailable,
}

/// A configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("no storage location available; set CHIC_TOKEN_PATH")]
    NoStorageLocation,
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
