//! Configuration management for gcectl
//!
//! Configuration is stored in TOML format with support for multiple named
//! profiles, each bound to one project and default zone.
//!
//! ```toml
//! default_profile = "lab"
//!
//! [profiles.lab]
//! project = "my-project"
//! zone = "us-west1-b"
//! access_token = "${GCECTL_ACCESS_TOKEN}"
//!
//! [profiles.lab.resilience.wait]
//! poll_interval_secs = 2
//! timeout_secs = 900
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::resilience::ResilienceConfig;

/// Environment variable that overrides any profile's access token
pub const ACCESS_TOKEN_ENV: &str = "GCECTL_ACCESS_TOKEN";

pub const DEFAULT_ZONE: &str = "us-west1-b";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// Project every call is scoped to
    pub project: String,
    /// Zone used when a command does not pass `--zone`
    #[serde(default = "default_zone")]
    pub zone: String,
    /// Bearer token, `${VAR}` reference, or `keyring:` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Retry and wait settings for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilience: Option<ResilienceConfig>,
}

impl Profile {
    pub fn new(project: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
            access_token: None,
            api_url: default_api_url(),
            resilience: None,
        }
    }

    /// Resolve the access token (env override, keyring, or literal)
    pub fn resolve_access_token(&self, profile_name: &str) -> Result<String> {
        let store = CredentialStore::new();
        let raw = self.access_token.as_deref().unwrap_or_default();
        let token = store.resolve(raw, Some(ACCESS_TOKEN_ENV))?;

        // An unexpanded ${VAR} means the variable was not set
        if token.is_empty() || token.starts_with("${") {
            return Err(ConfigError::MissingSetting {
                profile: profile_name.to_string(),
                field: "access_token".to_string(),
            });
        }
        Ok(token)
    }

    pub fn resilience(&self) -> ResilienceConfig {
        self.resilience.clone().unwrap_or_default()
    }
}

impl Config {
    /// Resolve which profile to use
    ///
    /// Resolution order: explicit name, `default_profile`, then the first
    /// profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            if !self.profiles.contains_key(name) {
                return Err(ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
            }
            return Ok(name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'gcectl profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a resolved profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file is an empty config
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Read {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;
        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::Write {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Platform config location
    ///
    /// Linux: ~/.config/gcectl/config.toml
    /// macOS: ~/Library/Application Support/dev.gcectl.gcectl/config.toml
    /// Windows: %APPDATA%\gcectl\gcectl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("dev", "gcectl", "gcectl").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables are left as-is so that profiles that are not in use
    /// do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

fn default_api_url() -> String {
    crate::compute::DEFAULT_API_URL.to_string()
}

fn default_zone() -> String {
    DEFAULT_ZONE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn lab_profile() -> Profile {
        Profile {
            access_token: Some("literal-token".to_string()),
            ..Profile::new("lab-project", "us-west1-b")
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile("lab".to_string(), lab_profile());
        config.default_profile = Some("lab".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("lab"));
        assert_eq!(deserialized.profiles["lab"], lab_profile());
    }

    #[test]
    fn test_profile_defaults() {
        let config: Config = toml::from_str(
            r#"
[profiles.min]
project = "p"
"#,
        )
        .unwrap();
        let profile = &config.profiles["min"];
        assert_eq!(profile.zone, DEFAULT_ZONE);
        assert_eq!(profile.api_url, crate::compute::DEFAULT_API_URL);
        assert!(profile.access_token.is_none());
        assert!(profile.resilience.is_none());
    }

    #[test]
    fn test_profile_resolution_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), lab_profile());
        config.set_profile("alpha".to_string(), lab_profile());

        // First alphabetically
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        // Default wins over alphabetical
        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        // Explicit wins over default
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");
    }

    #[test]
    fn test_unknown_explicit_profile() {
        let config = Config::default();
        let err = config.resolve_profile(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_no_profiles() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("gcectl profile set"));
    }

    #[test]
    fn test_remove_default_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("lab".to_string(), lab_profile());
        config.default_profile = Some("lab".to_string());
        assert!(config.remove_profile("lab").is_some());
        assert!(config.default_profile.is_none());
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("GCECTL_TEST_PROJECT", "expanded-project");
        }
        let content = r#"
[profiles.lab]
project = "${GCECTL_TEST_PROJECT}"
zone = "${GCECTL_TEST_ZONE:-europe-west1-b}"
"#;
        let expanded = Config::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded).unwrap();
        assert_eq!(config.profiles["lab"].project, "expanded-project");
        assert_eq!(config.profiles["lab"].zone, "europe-west1-b");
        unsafe {
            std::env::remove_var("GCECTL_TEST_PROJECT");
        }
    }

    #[test]
    #[serial]
    fn test_access_token_resolution() {
        unsafe {
            std::env::remove_var(ACCESS_TOKEN_ENV);
        }
        assert_eq!(
            lab_profile().resolve_access_token("lab").unwrap(),
            "literal-token"
        );

        let missing = Profile::new("p", "z");
        let err = missing.resolve_access_token("bare").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting { .. }));

        let unexpanded = Profile {
            access_token: Some("${NOT_SET_ANYWHERE}".to_string()),
            ..Profile::new("p", "z")
        };
        assert!(unexpanded.resolve_access_token("x").is_err());
    }

    #[test]
    #[serial]
    fn test_access_token_env_override() {
        unsafe {
            std::env::set_var(ACCESS_TOKEN_ENV, "from-env");
        }
        assert_eq!(lab_profile().resolve_access_token("lab").unwrap(), "from-env");
        unsafe {
            std::env::remove_var(ACCESS_TOKEN_ENV);
        }
    }
}
