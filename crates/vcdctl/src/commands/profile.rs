//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, VcdCtlError};
use crate::output::print_output;
use colored::Colorize;
use serde_json::{Value, json};
use tracing::{debug, info};
use vcd_core::config::{CredentialStore, ProfileAuth};
use vcd_core::{ApiVersion, Profile};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &mut ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            url,
            org,
            token,
            username,
            password,
            insecure,
            max_api_version,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            #[cfg(feature = "secure-storage")]
            let store = if *use_keyring {
                CredentialStore::new()
            } else {
                CredentialStore::plaintext()
            };
            #[cfg(not(feature = "secure-storage"))]
            let store = CredentialStore::plaintext();

            let request = SetProfile {
                name,
                url,
                org,
                token: token.as_deref(),
                username: username.as_deref(),
                password: password.as_deref(),
                insecure: *insecure,
                max_api_version: max_api_version.as_deref(),
            };
            handle_set(conn_mgr, request, &store)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

/// Arguments of `profile set`
struct SetProfile<'a> {
    name: &'a str,
    url: &'a str,
    org: &'a str,
    token: Option<&'a str>,
    username: Option<&'a str>,
    password: Option<&'a str>,
    insecure: bool,
    max_api_version: Option<&'a str>,
}

fn profile_summary(name: &str, profile: &Profile, is_default: bool) -> Value {
    let (auth, user) = match &profile.auth {
        ProfileAuth::Token { .. } => ("token", None),
        ProfileAuth::Password { username, .. } => ("password", Some(username.clone())),
    };
    json!({
        "name": name,
        "url": profile.url,
        "org": profile.org,
        "auth": auth,
        "username": user,
        "provider": profile.is_provider(),
        "default": is_default,
    })
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let profiles = conn_mgr.config.list_profiles();
    debug!("Found {} profiles", profiles.len());

    if profiles.is_empty() && !output_format.is_structured() {
        println!("No profiles configured.");
        println!("Create one with: vcdctl profile set <name> --url <url> --org <org> --token <token>");
        return Ok(());
    }

    let default = conn_mgr.config.default_profile.as_deref();
    let rows: Vec<Value> = profiles
        .iter()
        .map(|(name, profile)| profile_summary(name, profile, default == Some(name.as_str())))
        .collect();

    print(Value::Array(rows), output_format.or(OutputFormat::Table))
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = conn_mgr.config_file()?;
    if output_format.is_structured() {
        print(json!({ "path": path.display().to_string() }), output_format)
    } else {
        println!("{}", path.display());
        Ok(())
    }
}

fn handle_show(conn_mgr: &ConnectionManager, name: &str, output_format: OutputFormat) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    let mut details = profile_summary(name, profile, is_default);
    details["insecure"] = json!(profile.insecure);
    details["max_api_version"] = json!(profile.max_api_version.map(|v| v.to_string()));
    details["secret"] = json!(if profile.has_secret() { "(stored)" } else { "(not set)" });
    details["task_timeout_secs"] = json!(profile.task.timeout_secs);
    details["task_interval_ms"] = json!(profile.task.interval_ms);
    details["busy_retry"] = json!(profile.busy_retry.enabled);

    print(details, output_format.or(OutputFormat::Table))
}

fn handle_set(conn_mgr: &mut ConnectionManager, request: SetProfile<'_>, store: &CredentialStore) -> CliResult<()> {
    let max_api_version = request
        .max_api_version
        .map(|raw| {
            raw.parse::<ApiVersion>().map_err(|e| VcdCtlError::InvalidInput {
                message: format!("--max-api-version: {e}"),
            })
        })
        .transpose()?;

    let mut profile = match (request.token, request.username) {
        (Some(token), _) => {
            let stored = store.store(&format!("{}-token", request.name), token)?;
            Profile::with_token(request.url, request.org, stored)
        }
        (None, Some(username)) => {
            let stored = request
                .password
                .map(|pw| store.store(&format!("{}-password", request.name), pw))
                .transpose()?;
            Profile::with_password(request.url, request.org, username, stored)
        }
        (None, None) => {
            return Err(VcdCtlError::InvalidInput {
                message: "either --token or --username is required".to_string(),
            });
        }
    };
    profile.insecure = request.insecure;
    profile.max_api_version = max_api_version;

    // keep tuned wait and retry settings of an existing profile
    if let Some(existing) = conn_mgr.config.profiles.get(request.name) {
        profile.task = existing.task.clone();
        profile.busy_retry = existing.busy_retry.clone();
    }

    let first = conn_mgr.config.profiles.is_empty();
    conn_mgr.config.set_profile(request.name.to_string(), profile);
    if first {
        conn_mgr.config.default_profile = Some(request.name.to_string());
    }
    conn_mgr.save_config()?;

    info!("Saved profile {}", request.name);
    println!("{} Profile '{}' saved", "✓".green(), request.name);
    if first {
        println!("  Set as default profile");
    }
    Ok(())
}

fn handle_remove(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    let removed = conn_mgr.config.remove_profile(name).ok_or_else(|| VcdCtlError::ProfileNotFound {
        name: name.to_string(),
    })?;

    let store = CredentialStore::new();
    let secrets = match &removed.auth {
        ProfileAuth::Token { token } => vec![token.as_str()],
        ProfileAuth::Password { password, .. } => password.iter().map(String::as_str).collect(),
    };
    for secret in secrets {
        if let Some(key) = secret.strip_prefix("keyring:") {
            store.forget(key)?;
        }
    }

    conn_mgr.save_config()?;
    println!("{} Profile '{}' removed", "✓".green(), name);
    Ok(())
}

fn handle_default(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    conn_mgr.config.profile(name)?;
    conn_mgr.config.default_profile = Some(name.to_string());
    conn_mgr.save_config()?;
    println!("{} Default profile set to '{}'", "✓".green(), name);
    Ok(())
}

fn print(data: Value, format: OutputFormat) -> CliResult<()> {
    print_output(data, format, None).map_err(|e| VcdCtlError::OutputError {
        message: format!("{e:#}"),
    })
}
