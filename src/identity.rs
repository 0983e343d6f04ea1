//! Anonymous account keys.
//!
//! Callers identify themselves with an opaque fingerprint string. It is
//! trusted as presented: there is no authentication behind it and two
//! callers presenting the same string share an account.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;

pub const FINGERPRINT_HEADER: &str = "x-user-fingerprint";

const MAX_KEY_LEN: usize = 120;

/// Logical owner key used to scope configs and decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey(String);

impl AccountKey {
    /// Map a raw fingerprint to an account bucket.
    pub fn resolve(fingerprint: &str) -> Result<Self, AppError> {
        let key = fingerprint.trim();
        if key.is_empty() {
            return Err(AppError::InvalidInput("empty user fingerprint".into()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(AppError::InvalidInput(format!(
                "user fingerprint longer than {MAX_KEY_LEN} bytes"
            )));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AccountKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(FINGERPRINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        AccountKey::resolve(raw)
    }
}
