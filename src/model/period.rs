//! Collection periods.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::model::fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted};
use crate::model::ModelError;

/// How often a schedule's metrics are collected.
///
/// Named periods cover the common cases; any other non-negative number of
/// seconds is kept as [`CollectionPeriod::Custom`]. A numeric string equal to
/// a named period resolves to that named period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub enum CollectionPeriod {
    Sec1,
    Sec5,
    Sec10,
    Sec30,
    Min1,
    Min5,
    Min10,
    Min30,
    Hr1,
    Hr2,
    Hr4,
    Hr12,
    Day1,
    Day7,
    Custom(u32),
}

const NAMED_PERIODS: [(CollectionPeriod, &str, u32); 14] = [
    (CollectionPeriod::Sec1, "SEC_1", 1),
    (CollectionPeriod::Sec5, "SEC_5", 5),
    (CollectionPeriod::Sec10, "SEC_10", 10),
    (CollectionPeriod::Sec30, "SEC_30", 30),
    (CollectionPeriod::Min1, "MIN_1", 60),
    (CollectionPeriod::Min5, "MIN_5", 300),
    (CollectionPeriod::Min10, "MIN_10", 600),
    (CollectionPeriod::Min30, "MIN_30", 1800),
    (CollectionPeriod::Hr1, "HR_1", 3600),
    (CollectionPeriod::Hr2, "HR_2", 7200),
    (CollectionPeriod::Hr4, "HR_4", 14400),
    (CollectionPeriod::Hr12, "HR_12", 43200),
    (CollectionPeriod::Day1, "DAY_1", 86400),
    (CollectionPeriod::Day7, "DAY_7", 604800),
];

impl CollectionPeriod {
    /// Period for a number of seconds, preferring the named form.
    pub fn from_seconds(seconds: u32) -> Self {
        NAMED_PERIODS
            .iter()
            .find(|(_, _, secs)| *secs == seconds)
            .map(|(period, _, _)| *period)
            .unwrap_or(CollectionPeriod::Custom(seconds))
    }

    /// Resolved length of the period in seconds.
    pub fn seconds(&self) -> u32 {
        match self {
            CollectionPeriod::Custom(seconds) => *seconds,
            named => NAMED_PERIODS
                .iter()
                .find(|(period, _, _)| period == named)
                .map(|(_, _, secs)| *secs)
                .unwrap_or_default(),
        }
    }

    fn name(&self) -> Option<&'static str> {
        NAMED_PERIODS
            .iter()
            .find(|(period, _, _)| period == self)
            .map(|(_, name, _)| *name)
    }

    fn parse_seconds(value: i64) -> Result<Self, ModelError> {
        if value < 0 {
            return Err(ModelError::NegativePeriod(value));
        }
        if value > i64::from(i32::MAX) {
            return Err(ModelError::PeriodOutOfRange(value));
        }
        Ok(Self::from_seconds(value as u32))
    }
}

impl FromStr for CollectionPeriod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((period, _, _)) = NAMED_PERIODS.iter().find(|(_, name, _)| *name == s) {
            return Ok(*period);
        }

        let value: i64 = s
            .parse()
            .map_err(|_| ModelError::InvalidPeriod(s.to_string()))?;
        Self::parse_seconds(value)
    }
}

impl fmt::Display for CollectionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.seconds()),
        }
    }
}

impl Fingerprinted for CollectionPeriod {
    fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher::new();
        hasher.label("period").u64(u64::from(self.seconds()));
        hasher.finish()
    }
}

/// Period as written in the schedule file: a name, a numeric string or a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPeriod {
    Number(i64),
    Text(String),
}

impl TryFrom<RawPeriod> for CollectionPeriod {
    type Error = ModelError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        match raw {
            RawPeriod::Number(value) => Self::parse_seconds(value),
            RawPeriod::Text(text) => text.parse(),
        }
    }
}
