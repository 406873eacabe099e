//! Configuration module for branchbook
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::BranchbookPaths;
pub use settings::Settings;
