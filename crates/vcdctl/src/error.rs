//! Error types for vcdctl
//!
//! User-facing errors with suggestions, printed cargo-style on failure.

use colored::Colorize;
use thiserror::Error;
use vcd_core::{ConfigError, VcdError};

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'lab' not found
///
///   tip: List available profiles: vcdctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Render without colors, for logs and tests
    pub fn render_plain(&self) -> String {
        let mut out = format!("error: {}", self.message);
        for tip in &self.tips {
            out.push_str(&format!("\n\n  tip: {tip}"));
        }
        out
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the vcdctl application
#[derive(Error, Debug)]
pub enum VcdCtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'vcdctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}'")]
    MissingCredentials { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Not supported by this server: {message}")]
    Unsupported { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for vcdctl operations
pub type Result<T> = std::result::Result<T, VcdCtlError>;

impl VcdCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            VcdCtlError::ProfileNotFound { name } => vec![
                "List available profiles: vcdctl profile list".to_string(),
                format!("Create profile '{name}': vcdctl profile set {name} --url <url> --org <org> --token <token>"),
            ],
            VcdCtlError::NoProfileConfigured => vec![
                "Create a tenant profile: vcdctl profile set lab --url https://vcd.example.com --org acme --token <token>".to_string(),
                "Create a provider profile: vcdctl profile set admin --url https://vcd.example.com --org System --username administrator".to_string(),
            ],
            VcdCtlError::MissingCredentials { name } => vec![
                format!("Update profile credentials: vcdctl profile set {name}"),
                "Or export VCD_TOKEN / VCD_PASSWORD".to_string(),
            ],
            VcdCtlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: vcdctl profile show <profile>".to_string(),
                "Provider logins use the 'System' organization".to_string(),
            ],
            VcdCtlError::ConnectionError { message }
                if message.contains("certificate") || message.contains("SSL") =>
            {
                vec![
                    "For self-signed certificates set 'insecure = true' in the profile".to_string(),
                    "Check that the server URL is correct and reachable".to_string(),
                ]
            }
            VcdCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the server URL is correct: vcdctl profile show <profile>".to_string(),
            ],
            VcdCtlError::NotFound { .. } => vec![
                "Verify the name or URN is correct".to_string(),
                "Tenant users only see entities of their own organization".to_string(),
            ],
            VcdCtlError::Unsupported { .. } => vec![
                "Check the server's API versions: vcdctl api get /api/versions".to_string(),
                "Remove or raise max_api_version in the profile".to_string(),
            ],
            VcdCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: vcdctl <command> --help".to_string(),
            ],
            VcdCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {path}"),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    pub fn diagnostic(&self) -> CliDiagnostic {
        self.suggestions()
            .iter()
            .fold(CliDiagnostic::error(&self.to_string()), |diag, tip| {
                diag.tip(tip)
            })
    }

    /// Message plus suggestions, uncolored
    pub fn display_with_suggestions(&self) -> String {
        self.diagnostic().render_plain()
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        self.diagnostic().print();
    }
}

impl From<VcdError> for VcdCtlError {
    fn from(err: VcdError) -> Self {
        let message = err.to_string();
        match err {
            VcdError::EntityNotFound { .. } => VcdCtlError::NotFound { message },
            VcdError::UnsupportedEndpoint { .. } => VcdCtlError::Unsupported { message },
            VcdError::InvalidParameters { .. } | VcdError::AmbiguousResult { .. } => {
                VcdCtlError::InvalidInput { message }
            }
            VcdError::TaskTimeout { .. } => VcdCtlError::Timeout { message },
            VcdError::Config(inner) => inner.into(),
            VcdError::RequestFailed { status: 401, .. } => {
                VcdCtlError::AuthenticationFailed { message }
            }
            VcdError::Transport { .. } => VcdCtlError::ConnectionError { message },
            _ => VcdCtlError::ApiError { message },
        }
    }
}

impl From<ConfigError> for VcdCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => VcdCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => VcdCtlError::NoProfileConfigured,
            other => VcdCtlError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for VcdCtlError {
    fn from(err: serde_json::Error) -> Self {
        VcdCtlError::InvalidInput {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_not_found_suggests_listing() {
        let err = VcdCtlError::ProfileNotFound {
            name: "lab".to_string(),
        };
        let text = err.display_with_suggestions();
        assert!(text.starts_with("error: Profile 'lab' not found"));
        assert!(text.contains("tip: List available profiles: vcdctl profile list"));
    }

    #[test]
    fn test_config_errors_map_to_cli_variants() {
        let err: VcdCtlError = ConfigError::NoProfiles {
            suggestion: String::new(),
        }
        .into();
        assert!(matches!(err, VcdCtlError::NoProfileConfigured));

        let err: VcdCtlError = ConfigError::ProfileNotFound {
            name: "x".to_string(),
        }
        .into();
        assert!(matches!(err, VcdCtlError::ProfileNotFound { name } if name == "x"));
    }

    #[test]
    fn test_errors_without_suggestions_render_message_only() {
        let err = VcdCtlError::OutputError {
            message: "broken pipe".to_string(),
        };
        assert_eq!(
            err.display_with_suggestions(),
            "error: Output formatting error: broken pipe"
        );
    }
}
