//! Secret values referenced from profiles
//!
//! `access_token` in a profile is either a literal bearer token or a
//! `keyring:<entry>` reference. `GCECTL_ACCESS_TOKEN` overrides both.

use super::error::{ConfigError, Result};

pub const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const KEYRING_SERVICE: &str = "gcectl";

#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    pub fn new() -> Self {
        Self
    }

    /// Turn a stored value into the secret it stands for
    ///
    /// A non-empty `override_var` wins; otherwise keyring references are
    /// looked up and literals are returned as-is.
    pub fn resolve(&self, value: &str, override_var: Option<&str>) -> Result<String> {
        let from_env = override_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|v| !v.is_empty());
        if let Some(secret) = from_env {
            return Ok(secret);
        }

        match value.strip_prefix(KEYRING_PREFIX) {
            Some(entry) => self.lookup(entry),
            None => Ok(value.to_string()),
        }
    }

    #[cfg(feature = "secure-storage")]
    fn entry(name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, name).map_err(|e| ConfigError::Keyring(e.to_string()))
    }

    #[cfg(feature = "secure-storage")]
    fn lookup(&self, entry: &str) -> Result<String> {
        Self::entry(entry)?
            .get_password()
            .map_err(|e| ConfigError::Keyring(format!("entry '{}': {}", entry, e)))
    }

    #[cfg(not(feature = "secure-storage"))]
    fn lookup(&self, entry: &str) -> Result<String> {
        Err(ConfigError::Credential(format!(
            "'{}{}' needs a build with the secure-storage feature",
            KEYRING_PREFIX, entry
        )))
    }

    /// Save `secret` under `entry` and return the reference to write into the profile
    #[cfg(feature = "secure-storage")]
    pub fn store(&self, entry: &str, secret: &str) -> Result<String> {
        Self::entry(entry)?
            .set_password(secret)
            .map_err(|e| ConfigError::Keyring(format!("entry '{}': {}", entry, e)))?;
        Ok(format!("{}{}", KEYRING_PREFIX, entry))
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}
