// src/id.rs

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque record identifier: 24 lowercase hex characters.
///
/// Layout is a 4-byte unix-seconds prefix followed by 8 random bytes, so ids
/// sort roughly by creation time. Assigned by the application on insert and
/// stored as TEXT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Id(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identifier must be 24 hex characters")
    }
}

impl std::error::Error for ParseIdError {}

impl Id {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        let secs = chrono::Utc::now().timestamp() as u32;
        let mut tail = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut tail);
        Id(format!("{:08x}{:016x}", secs, u64::from_be_bytes(tail)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = ParseIdError;

    /// Accepts exactly 24 hex characters (either case), normalized to lower.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Id(s.to_ascii_lowercase()))
        } else {
            Err(ParseIdError)
        }
    }
}
