//! Credential values
//!
//! Data source and admin passwords arrive as plain strings and must reach the
//! host unchanged, so serialization passes them through as-is. Everything
//! meant for humans (`Debug`, `Display`, log lines) sees a placeholder, and
//! the buffer is wiped when the value is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

pub const REDACTED: &str = "[REDACTED]";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plain-text value
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Placeholder for display, empty secrets stay visibly empty
    pub fn masked(&self) -> &'static str {
        if self.is_empty() {
            ""
        } else {
            REDACTED
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.masked())
    }
}
