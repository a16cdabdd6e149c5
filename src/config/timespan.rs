//! Interval strings such as `1m` or `30s`
//!
//! The host expresses intervals as a count followed by a unit suffix. The
//! original text is kept so a loaded document renders back unchanged.

use crate::error::{DashconfError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const TIMESPAN_PATTERN: &str = r"^([0-9]+)(ms|s|m|h|d|w|M|y)$";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timespan {
    raw: String,
    duration: Duration,
}

impl Timespan {
    pub fn parse(value: &str) -> Result<Self> {
        let re = Regex::new(TIMESPAN_PATTERN)
            .map_err(|e| DashconfError::invalid_argument(e.to_string()))?;

        let trimmed = value.trim();
        let captures = re.captures(trimmed).ok_or_else(|| {
            DashconfError::invalid_argument(format!(
                "'{}' is not an interval like 30s, 1m or 2h",
                value
            ))
        })?;

        let count: u64 = captures[1].parse().map_err(|_| {
            DashconfError::invalid_argument(format!("interval count in '{}' is too large", value))
        })?;
        if count == 0 {
            return Err(DashconfError::invalid_argument(format!(
                "interval '{}' must be greater than zero",
                value
            )));
        }

        let unit_millis: u64 = match &captures[2] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            "w" => 604_800_000,
            "M" => 2_592_000_000,
            "y" => 31_536_000_000,
            other => {
                return Err(DashconfError::invalid_argument(format!(
                    "unknown interval unit '{}'",
                    other
                )))
            }
        };

        let millis = count.checked_mul(unit_millis).ok_or_else(|| {
            DashconfError::invalid_argument(format!("interval '{}' is too large", value))
        })?;

        Ok(Self {
            raw: trimmed.to_string(),
            duration: Duration::from_millis(millis),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for Timespan {
    fn default() -> Self {
        Self {
            raw: "1m".to_string(),
            duration: Duration::from_secs(60),
        }
    }
}

impl FromStr for Timespan {
    type Err = DashconfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timespan {
    type Error = DashconfError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Timespan> for String {
    fn from(value: Timespan) -> Self {
        value.raw
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
