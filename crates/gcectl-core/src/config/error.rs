//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profiles configured. {suggestion}")]
    NoProfiles { suggestion: String },

    /// A profile exists but lacks a value needed to talk to the API
    #[error("Profile '{profile}' has no {field}")]
    MissingSetting { profile: String, field: String },

    #[error("Credential lookup failed: {0}")]
    Credential(String),

    #[cfg(feature = "secure-storage")]
    #[error("Keyring: {0}")]
    Keyring(String),

    #[error("No home directory to place config.toml in")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
