//! Configuration module for vpn-backup
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::VpnPaths;
pub use settings::Settings;
