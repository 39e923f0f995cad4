//! Credential resolution with optional keyring support
//!
//! Secrets in a profile (API token, password) can be stored as:
//! - a plaintext value
//! - a `keyring:<key>` reference into the OS keyring (feature `secure-storage`)
//!
//! An environment variable, when given and set, always wins.

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "vcdctl";

/// Storage backend for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    /// Store in OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Store as plaintext in the config file
    Plaintext,
}

/// Credential store abstraction
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Keyring when the feature is on and a keyring answers, plaintext otherwise
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            let keyring_works = keyring::Entry::new(SERVICE_NAME, "__probe__").is_ok();
            if keyring_works {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self::plaintext()
    }

    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    pub fn storage(&self) -> CredentialStorage {
        self.storage
    }

    /// Store a secret, returning the value to write into the config file
    pub fn store(&self, key: &str, secret: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                keyring::Entry::new(SERVICE_NAME, key)
                    .and_then(|entry| entry.set_password(secret))
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                Ok(format!("{KEYRING_PREFIX}{key}"))
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(secret.to_string())
            }
        }
    }

    /// Resolve a stored value to the actual secret
    ///
    /// Resolution order:
    /// 1. `env_var`, if provided and set
    /// 2. keyring lookup for `keyring:` references
    /// 3. the value itself
    pub fn resolve(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(from_env) = env::var(var)
        {
            return Ok(from_env);
        }

        let Some(key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            keyring::Entry::new(SERVICE_NAME, key)
                .and_then(|entry| entry.get_password())
                .map_err(|e| {
                    ConfigError::KeyringError(format!("credential '{key}' unavailable: {e}"))
                })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "'{key}' references the keyring but secure-storage is not enabled"
            )))
        }
    }

    /// Remove a secret from the keyring; plaintext has nothing to remove
    pub fn forget(&self, key: &str) -> Result<()> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(e) => Err(ConfigError::KeyringError(e.to_string())),
                }
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(())
            }
        }
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_round_trip() {
        let store = CredentialStore::plaintext();
        let stored = store.store("prod-token", "s3cret").unwrap();
        assert_eq!(stored, "s3cret");
        assert_eq!(store.resolve(&stored, None).unwrap(), "s3cret");
        assert!(store.forget("prod-token").is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_override() {
        unsafe {
            env::set_var("VCD_TEST_CREDENTIAL", "from-env");
        }

        let store = CredentialStore::plaintext();
        let resolved = store
            .resolve("from-file", Some("VCD_TEST_CREDENTIAL"))
            .unwrap();
        assert_eq!(resolved, "from-env");

        unsafe {
            env::remove_var("VCD_TEST_CREDENTIAL");
        }
    }

    #[test]
    fn test_keyring_reference_detection() {
        assert!(CredentialStore::is_keyring_reference("keyring:vcd-token"));
        assert!(!CredentialStore::is_keyring_reference("vcd-token"));
        assert!(!CredentialStore::is_keyring_reference(""));
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn test_keyring_reference_without_feature_fails() {
        let err = CredentialStore::plaintext()
            .resolve("keyring:vcd-token", None)
            .unwrap_err();
        assert!(err.to_string().contains("secure-storage"));
    }
}
