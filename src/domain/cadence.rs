//! Investment cadences and their trading-day step counts.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::DcaError;

/// Trading days between simulated paychecks, independent of the cadence.
pub const CONTRIBUTION_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Monthly,
    Quarterly,
    Biannually,
}

impl Cadence {
    pub const ALL: [Cadence; 4] = [
        Cadence::Weekly,
        Cadence::Monthly,
        Cadence::Quarterly,
        Cadence::Biannually,
    ];

    /// Trading days between investment events.
    pub fn step(self) -> usize {
        match self {
            Cadence::Weekly => 5,
            Cadence::Monthly => 20,
            Cadence::Quarterly => 60,
            Cadence::Biannually => 120,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
            Cadence::Biannually => "biannually",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cadence {
    type Err = DcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

/// Resolve a cadence name, case-insensitively.
pub fn resolve(name: &str) -> Result<Cadence, DcaError> {
    match name.trim().to_lowercase().as_str() {
        "weekly" => Ok(Cadence::Weekly),
        "monthly" => Ok(Cadence::Monthly),
        "quarterly" => Ok(Cadence::Quarterly),
        "biannually" => Ok(Cadence::Biannually),
        _ => Err(DcaError::InvalidCadence {
            name: name.to_string(),
        }),
    }
}

/// Split a comma-separated list of cadence names and resolve each one.
pub fn parse_cadence_list(list: &str) -> Result<Vec<Cadence>, DcaError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(resolve)
        .collect()
}
