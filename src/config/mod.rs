//! Configuration module for envelope-fixit
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Routing and planning defaults persisted as JSON

pub mod paths;
pub mod settings;

pub use paths::FixitPaths;
pub use settings::Settings;
