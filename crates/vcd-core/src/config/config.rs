//! Configuration management for VCD clients
//!
//! Profiles are stored in a TOML file with support for multiple named
//! profiles, `${VAR}` expansion and environment-variable overrides for the
//! connection settings.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::wait::{BusyRetryConfig, TaskWaitConfig};
use crate::version::ApiVersion;

/// Environment variables that override profile values
pub const ENV_URL: &str = "VCD_URL";
pub const ENV_ORG: &str = "VCD_ORG";
pub const ENV_TOKEN: &str = "VCD_TOKEN";
pub const ENV_USER: &str = "VCD_USER";
pub const ENV_PASSWORD: &str = "VCD_PASSWORD";

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

/// A single VCD endpoint and how to log into it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// Base URL of the VCD instance, e.g. `https://vcd.example.com`
    pub url: String,
    /// Organization to log into; `System` means provider login
    pub org: String,
    /// Authentication settings (flattened into the profile)
    #[serde(flatten)]
    pub auth: ProfileAuth,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Never negotiate an API version above this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_api_version: Option<ApiVersion>,
    #[serde(default)]
    pub task: TaskWaitConfig,
    #[serde(default)]
    pub busy_retry: BusyRetryConfig,
}

/// How a profile authenticates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ProfileAuth {
    /// Pre-issued API (bearer) token
    Token { token: String },
    /// Username and password session login
    Password {
        username: String,
        /// Optional for interactive prompting
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

/// Authentication with secrets resolved from keyring and environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAuth {
    Token(String),
    Password {
        username: String,
        password: Option<String>,
    },
}

/// Connection settings ready to hand to a client builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub url: String,
    pub org: String,
    pub auth: ResolvedAuth,
}

impl Profile {
    /// Build a token-authenticated profile with default wait and retry settings
    pub fn with_token(url: impl Into<String>, org: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(url, org, ProfileAuth::Token { token: token.into() })
    }

    /// Build a password-authenticated profile with default wait and retry settings
    pub fn with_password(
        url: impl Into<String>,
        org: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self::new(
            url,
            org,
            ProfileAuth::Password {
                username: username.into(),
                password,
            },
        )
    }

    fn new(url: impl Into<String>, org: impl Into<String>, auth: ProfileAuth) -> Self {
        Self {
            url: url.into(),
            org: org.into(),
            auth,
            insecure: false,
            max_api_version: None,
            task: TaskWaitConfig::default(),
            busy_retry: BusyRetryConfig::default(),
        }
    }

    /// True when logging in as provider (System org)
    pub fn is_provider(&self) -> bool {
        self.org.eq_ignore_ascii_case("system")
    }

    /// Check if this profile has a stored secret
    pub fn has_secret(&self) -> bool {
        matches!(
            self.auth,
            ProfileAuth::Token { .. }
                | ProfileAuth::Password {
                    password: Some(_),
                    ..
                }
        )
    }

    /// Resolve connection settings, applying keyring lookups and `VCD_*`
    /// environment overrides
    pub fn resolve(&self) -> Result<ResolvedProfile> {
        let store = CredentialStore::new();
        let resolve = |value: &str, env: &str, what: &str| {
            store.resolve(value, Some(env)).map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve {what}: {e}"))
            })
        };

        let url = resolve(&self.url, ENV_URL, "URL")?;
        let org = resolve(&self.org, ENV_ORG, "organization")?;
        if url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                profile: org,
                field: "url".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        // A token in the environment wins over whatever the profile holds
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            return Ok(ResolvedProfile {
                url,
                org,
                auth: ResolvedAuth::Token(token),
            });
        }

        let auth = match &self.auth {
            ProfileAuth::Token { token } => ResolvedAuth::Token(resolve(token, ENV_TOKEN, "token")?),
            ProfileAuth::Password { username, password } => ResolvedAuth::Password {
                username: resolve(username, ENV_USER, "username")?,
                password: password
                    .as_deref()
                    .map(|p| resolve(p, ENV_PASSWORD, "password"))
                    .transpose()?
                    .or_else(|| std::env::var(ENV_PASSWORD).ok()),
            },
        };

        Ok(ResolvedProfile { url, org, auth })
    }
}

impl Config {
    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve which profile to use
    ///
    /// Resolution order:
    /// 1. `explicit_profile`, which must exist
    /// 2. `default_profile`
    /// 3. the first profile in alphabetical order
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            self.profile(name)?;
            return Ok(name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'vcdctl profile set' to create a profile.".to_string(),
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

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
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
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
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

    /// Get the path to the configuration file
    ///
    /// On macOS `~/.config/vcdctl/config.toml` is used when it (or its
    /// directory) exists, otherwise the platform default:
    ///
    /// - Linux: `~/.config/vcdctl/config.toml`
    /// - macOS: `~/Library/Application Support/com.vmware.vcdctl/config.toml`
    /// - Windows: `%APPDATA%\vmware\vcdctl\config\config.toml`
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("vcdctl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "vmware", "vcdctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables are left as-is so profiles that are not in use do
    /// not fail to load.
    ///
    /// ```toml
    /// token = "${VCD_PROD_TOKEN}"
    /// url = "${VCD_PROD_URL:-https://vcd.example.com}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [ENV_URL, ENV_ORG, ENV_TOKEN, ENV_USER, ENV_PASSWORD] {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        let mut profile = Profile::with_token("https://vcd.example.com", "acme", "t0ken");
        profile.max_api_version = Some(ApiVersion::new(37, 2));
        config.set_profile("prod".to_string(), profile.clone());
        config.default_profile = Some("prod".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("prod"));
        assert_eq!(deserialized.profiles.get("prod"), Some(&profile));
    }

    #[test]
    fn test_parse_both_auth_styles() {
        let toml_text = r#"
            [profiles.tenant]
            url = "https://vcd.example.com"
            org = "acme"
            token = "abc"

            [profiles.provider]
            url = "https://vcd.example.com"
            org = "System"
            username = "administrator"
            password = "secret"
            insecure = true
            max_api_version = "38.0"

            [profiles.provider.task]
            timeout_secs = 60
        "#;

        let config: Config = toml::from_str(toml_text).unwrap();

        let tenant = config.profile("tenant").unwrap();
        assert_eq!(tenant.auth, ProfileAuth::Token { token: "abc".to_string() });
        assert!(!tenant.is_provider());
        assert_eq!(tenant.task, TaskWaitConfig::default());

        let provider = config.profile("provider").unwrap();
        assert!(provider.is_provider());
        assert!(provider.insecure);
        assert!(provider.has_secret());
        assert_eq!(provider.max_api_version, Some(ApiVersion::new(38, 0)));
        assert_eq!(provider.task.timeout_secs, 60);
        assert_eq!(provider.task.interval_ms, 500);
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        assert!(matches!(
            config.resolve_profile(None),
            Err(ConfigError::NoProfiles { .. })
        ));

        config.set_profile("zeta".to_string(), Profile::with_token("u", "o", "t"));
        config.set_profile("alpha".to_string(), Profile::with_token("u", "o", "t"));
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");

        assert!(matches!(
            config.resolve_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), Profile::with_token("u", "o", "t"));
        config.default_profile = Some("prod".to_string());

        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("VCD_CONFIG_TEST_TOKEN", "expanded-token");
        }

        let content = r#"
            [profiles.prod]
            url = "${VCD_CONFIG_TEST_URL:-https://fallback.example.com}"
            org = "acme"
            token = "${VCD_CONFIG_TEST_TOKEN}"
        "#;
        let config: Config = toml::from_str(&Config::expand_env_vars(content)).unwrap();
        let profile = config.profile("prod").unwrap();
        assert_eq!(profile.url, "https://fallback.example.com");
        assert_eq!(
            profile.auth,
            ProfileAuth::Token {
                token: "expanded-token".to_string()
            }
        );

        unsafe {
            std::env::remove_var("VCD_CONFIG_TEST_TOKEN");
        }
    }

    #[test]
    #[serial]
    fn test_resolve_applies_env_overrides() {
        clear_env();
        let profile = Profile::with_password("https://vcd.example.com", "acme", "admin", None);

        let resolved = profile.resolve().unwrap();
        assert_eq!(
            resolved.auth,
            ResolvedAuth::Password {
                username: "admin".to_string(),
                password: None
            }
        );

        unsafe {
            std::env::set_var(ENV_PASSWORD, "from-env");
            std::env::set_var(ENV_URL, "https://other.example.com");
        }
        let resolved = profile.resolve().unwrap();
        assert_eq!(resolved.url, "https://other.example.com");
        assert_eq!(
            resolved.auth,
            ResolvedAuth::Password {
                username: "admin".to_string(),
                password: Some("from-env".to_string())
            }
        );

        unsafe {
            std::env::set_var(ENV_TOKEN, "env-token");
        }
        let resolved = profile.resolve().unwrap();
        assert_eq!(resolved.auth, ResolvedAuth::Token("env-token".to_string()));

        clear_env();
    }
}
