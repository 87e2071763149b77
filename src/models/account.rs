//! Live account balances
//!
//! Balances are fetched from the bank side and handed to the engine as-is.
//! Only `Pod` accounts back envelopes; a `None` balance means the provider
//! could not report one.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Kind of account reported by the balance provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountKind {
    /// A regular bank account (not an envelope)
    Account,
    /// A pod; pods are envelopes
    #[default]
    Pod,
    /// An income source feeding deposits
    #[serde(rename = "Income Source")]
    IncomeSource,
}

impl AccountKind {
    /// Parse account kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], " ").trim() {
            "account" => Some(Self::Account),
            "pod" => Some(Self::Pod),
            "income source" | "income" => Some(Self::IncomeSource),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "Account"),
            Self::Pod => write!(f, "Pod"),
            Self::IncomeSource => write!(f, "Income Source"),
        }
    }
}

/// One account and its live balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: AccountKind,

    #[serde(rename = "balanceDollars")]
    pub balance: Option<Money>,
}

impl AccountBalance {
    /// Create a pod balance
    pub fn pod(name: impl Into<String>, balance: Option<Money>) -> Self {
        Self {
            name: name.into(),
            kind: AccountKind::Pod,
            balance,
        }
    }

    pub fn is_pod(&self) -> bool {
        self.kind == AccountKind::Pod
    }
}
