//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! `UserSummary` keeps unknown server fields in `extra` so page scripts can
//! read profile data this crate does not model without a schema change here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as returned by the identity endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Remaining server fields (`created_at`, `is_active`, `profile_text`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful login body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Registration payload, sent as JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

impl RegisterRequest {
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "username": self.username,
            "password": self.password,
        })
    }

    /// Apply the server's field rules locally so obviously bad input never
    /// leaves the client.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation as a user-facing message.
    pub fn validate(&self) -> Result<(), String> {
        if !is_plausible_email(&self.email) {
            return Err("Please enter a valid email address".to_owned());
        }
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(format!("Username must be at least {MIN_USERNAME_LEN} characters long"));
        }
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err("Username can only contain letters, numbers, hyphens and underscores".to_owned());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!("Password must be at least {MIN_PASSWORD_LEN} characters long"));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Error body shape: `{ "detail": ... }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Extract a human-readable `detail` from an error body.
///
/// `detail` is either a string or a list of validation items carrying `msg`;
/// for a list the first message wins.
#[must_use]
pub fn parse_error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_owned),
        _ => None,
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
