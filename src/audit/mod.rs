//! Audit logging system for envelope-fixit
//!
//! Records every create, update and delete of rules, routing baselines,
//! overrides, deposit events and decisions with before/after values in an
//! append-only JSONL log.
//!
//! # Example
//!
//! ```rust,ignore
//! use envelope_fixit::audit::{Action, AuditEntry, AuditLog, EntityType};
//!
//! let log = AuditLog::new(paths.audit_log());
//! log.append(
//!     &AuditEntry::new(Action::Updated, EntityType::EnvelopeRule, rule.id.to_string(), Some(rule.name.clone()))
//!         .with_states(Some(&before), Some(&rule)),
//! )?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{Action, AuditEntry, EntityType};
pub use logger::AuditLog;
