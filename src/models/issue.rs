//! Detected funding issues

use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Not enough money in the envelope by its due date
    TimingShortfall,
    /// Balance has dropped below the buffer floor
    Overspend,
    /// The rule itself under-funds the envelope (e.g. a recurring transfer)
    StructuralUnderfund,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimingShortfall => write!(f, "timing_shortfall"),
            Self::Overspend => write!(f, "overspend"),
            Self::StructuralUnderfund => write!(f, "structural_underfund"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    pub envelope_name: String,

    pub severity: Severity,

    /// Always >= 0
    #[serde(rename = "shortfallDollars")]
    pub shortfall: Money,

    pub reason: String,
}
