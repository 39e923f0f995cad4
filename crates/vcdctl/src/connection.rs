//! Connection management for VCD clients

use crate::error::{Result as CliResult, VcdCtlError};
use std::path::PathBuf;
use tracing::{debug, info};
use vcd_core::config::{ENV_PASSWORD, ENV_TOKEN, ProfileAuth};
use vcd_core::{Config, Profile, VcdClient};

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        match &self.config_path {
            Some(path) => self.config.save_to_path(path)?,
            None => self.config.save()?,
        }
        Ok(())
    }

    /// Path of the config file in use
    pub fn config_file(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Resolve the profile to use and return it with its name
    pub fn profile(&self, profile_name: Option<&str>) -> CliResult<(String, &Profile)> {
        let name = self.config.resolve_profile(profile_name)?;
        let profile = self.config.profile(&name)?;
        Ok((name, profile))
    }

    /// Log in with the resolved profile
    ///
    /// A password profile without a stored password prompts for one unless
    /// `VCD_PASSWORD` or `VCD_TOKEN` provides the secret.
    pub async fn create_client(&self, profile_name: Option<&str>) -> CliResult<VcdClient> {
        let (name, profile) = self.profile(profile_name)?;
        info!("Using VCD profile: {}", name);

        let mut profile = profile.clone();
        if let ProfileAuth::Password { username, password } = &mut profile.auth
            && password.is_none()
            && std::env::var(ENV_PASSWORD).is_err()
            && std::env::var(ENV_TOKEN).is_err()
        {
            debug!("Prompting for the password of {}", username);
            let prompt = format!("Password for {}@{}: ", username, profile.org);
            let entered = rpassword::prompt_password(prompt)
                .map_err(|_| VcdCtlError::MissingCredentials { name: name.clone() })?;
            *password = Some(entered);
        }

        let client = VcdClient::from_profile(&profile).await?;
        debug!(
            "Connected to {} (API {:?})",
            client.host_url(),
            client.versions().highest()
        );
        Ok(client)
    }
}
