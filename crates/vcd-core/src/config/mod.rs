//! Configuration and profile management for VCD clients
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Profiles name a VCD endpoint, the organization to log into and how to
//! authenticate, plus the task-wait and busy-retry defaults used by the
//! CRUD engine.
//!
//! # Features
//!
//! - Multiple named profiles
//! - API token or username/password authentication
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;
pub mod wait;

// Re-export main types for convenience
pub use config::{
    Config, ENV_ORG, ENV_PASSWORD, ENV_TOKEN, ENV_URL, ENV_USER, Profile, ProfileAuth, ResolvedAuth,
    ResolvedProfile,
};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use wait::{BusyRetryConfig, TaskWaitConfig};
