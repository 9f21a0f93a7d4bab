//! Canonical user identity.
//!
//! The authentication layer in front of the API forwards the user id in more
//! than one shape (plain UUID text in several spellings, JSON strings, raw byte
//! arrays, or the `{"type":"Buffer","data":[..]}` object produced by some
//! drivers). Everything is folded into [`UserId`] once, at the boundary, so
//! the game logic only ever compares canonical values.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Canonical identity of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Reasons a raw identity payload cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing user identity")]
    Missing,
    #[error("malformed user identity")]
    Malformed,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentity {
    Text(String),
    Bytes(Vec<u8>),
    Buffer {
        data: Vec<u8>,
    },
    ExtendedUuid {
        #[serde(rename = "$uuid")]
        uuid: String,
    },
}

impl UserId {
    /// Wrap an already validated UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Allocate a random identity, mostly useful in tests.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Normalize any supported raw payload into a canonical identity.
    pub fn from_raw(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Missing);
        }

        // `{..}` is also the braced UUID spelling, so plain text wins first.
        if let Ok(id) = parse_text(trimmed) {
            return Ok(id);
        }
        if !trimmed.starts_with(['{', '[', '"']) {
            return Err(IdentityError::Malformed);
        }

        let payload: RawIdentity =
            serde_json::from_str(trimmed).map_err(|_| IdentityError::Malformed)?;
        payload.try_into()
    }
}

impl TryFrom<RawIdentity> for UserId {
    type Error = IdentityError;

    fn try_from(value: RawIdentity) -> Result<Self, Self::Error> {
        match value {
            RawIdentity::Text(text) | RawIdentity::ExtendedUuid { uuid: text } => {
                parse_text(text.trim())
            }
            RawIdentity::Bytes(bytes) | RawIdentity::Buffer { data: bytes } => {
                Uuid::from_slice(&bytes)
                    .map(UserId)
                    .map_err(|_| IdentityError::Malformed)
            }
        }
    }
}

fn parse_text(text: &str) -> Result<UserId, IdentityError> {
    if text.is_empty() {
        return Err(IdentityError::Missing);
    }
    Uuid::parse_str(text)
        .map(UserId)
        .map_err(|_| IdentityError::Malformed)
}

impl FromStr for UserId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_raw(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
