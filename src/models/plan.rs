//! Fix plans: three ranked remediation options per issue
//!
//! Plans are serialized verbatim when proposed and replayed later when the
//! user picks an option, so the JSON shape here is a persistence format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::issue::DetectedIssue;
use super::money::Money;
use super::rule::RuleChanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionId {
    A,
    B,
    C,
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

impl FromStr for OptionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => Err(format!("Unknown option '{}' (expected A, B, or C)", other)),
        }
    }
}

/// Decision vocabulary shared with the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vocabulary {
    Restore,
    Routing,
    Structural,
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restore => write!(f, "RESTORE"),
            Self::Routing => write!(f, "ROUTING"),
            Self::Structural => write!(f, "STRUCTURAL"),
        }
    }
}

/// One concrete action inside a plan option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStep {
    /// Move money between envelopes now (performed manually by the user)
    #[serde(rename_all = "camelCase")]
    Transfer {
        from_envelope: String,
        to_envelope: String,
        #[serde(rename = "amountDollars")]
        amount: Money,
    },
    /// Shift deposit routing for the next N deposits
    #[serde(rename_all = "camelCase")]
    RoutingOverride {
        envelope: String,
        delta_bps: i64,
        remaining_deposits: u32,
    },
    /// Permanently change the envelope's rule
    RuleChange {
        envelope: String,
        changes: RuleChanges,
    },
}

impl PlanStep {
    /// Envelope this step acts on (the recipient for transfers)
    pub fn envelope(&self) -> &str {
        match self {
            Self::Transfer { to_envelope, .. } => to_envelope,
            Self::RoutingOverride { envelope, .. } => envelope,
            Self::RuleChange { envelope, .. } => envelope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPlanOption {
    pub option_id: OptionId,
    pub label: String,
    pub vocabulary: Vocabulary,
    pub summary: String,
    pub steps: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPlan {
    pub issue: DetectedIssue,
    /// Always exactly three options, A, B, C in that order
    pub options: Vec<FixPlanOption>,
    pub recommended_option_id: OptionId,
}

impl FixPlan {
    pub fn option(&self, id: OptionId) -> Option<&FixPlanOption> {
        self.options.iter().find(|o| o.option_id == id)
    }

    pub fn recommended(&self) -> Option<&FixPlanOption> {
        self.option(self.recommended_option_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_id_parse() {
        assert_eq!("a".parse::<OptionId>().unwrap(), OptionId::A);
        assert_eq!(" C ".parse::<OptionId>().unwrap(), OptionId::C);
        assert!("D".parse::<OptionId>().is_err());
    }

    #[test]
    fn test_step_is_tagged_by_kind() {
        let step = PlanStep::RoutingOverride {
            envelope: "Rent".into(),
            delta_bps: 300,
            remaining_deposits: 2,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["kind"], "routing_override");
        assert_eq!(json["deltaBps"], 300);
        assert_eq!(json["remainingDeposits"], 2);

        let transfer = PlanStep::Transfer {
            from_envelope: "Fun".into(),
            to_envelope: "Rent".into(),
            amount: Money::from_cents(3000),
        };
        let json = serde_json::to_value(&transfer).unwrap();
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["fromEnvelope"], "Fun");
        assert_eq!(json["amountDollars"], 30.0);
    }
}
