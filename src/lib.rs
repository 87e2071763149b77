//! envelope-fixit - envelope funding health and deposit routing
//!
//! This library watches a set of budget envelopes against their funding
//! rules, explains which envelopes are short and why, proposes three ranked
//! ways to fix each problem, and splits incoming deposits across envelopes.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (rules, balances, plans, routing)
//! - `engine`: Pure computation of states, issues, plans and deposit splits
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer tying the engine to storage
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use envelope_fixit::config::{paths::FixitPaths, settings::Settings};
//!
//! let paths = FixitPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{FixitError, FixitResult};
