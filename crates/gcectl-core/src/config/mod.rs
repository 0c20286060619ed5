//! Configuration and profile management
//!
// Allow nested config module - this is intentional for the config subsystem
#![allow(clippy::module_inception)]
//!
//! - Multiple named profiles, each bound to a project and default zone
//! - Access tokens as literals, `${VAR}` references, or keyring entries
//! - Per-profile retry and wait settings
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;
pub mod resilience;

pub use config::{ACCESS_TOKEN_ENV, Config, DEFAULT_ZONE, Profile};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
pub use resilience::{ResilienceConfig, RetryConfig, WaitConfig};
