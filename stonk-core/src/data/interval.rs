//! Bar interval accepted by the chart endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::FetchError;

/// Granularity of one row in a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
    #[serde(rename = "1m")]
    Minute,
}

impl Interval {
    pub const ALL: [Interval; 4] = [
        Interval::Daily,
        Interval::Weekly,
        Interval::Monthly,
        Interval::Minute,
    ];

    /// Wire value sent as the `interval` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
            Interval::Minute => "1m",
        }
    }

    /// Intraday rows keep their full timestamp and carry no adjusted close.
    pub fn is_intraday(self) -> bool {
        matches!(self, Interval::Minute)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the four wire values.
impl FromStr for Interval {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| FetchError::InvalidInterval {
                interval: s.to_string(),
            })
    }
}
