//! Error types for gcectl
//!
//! Core and config errors are folded into [`GceCtlError`] so every command
//! reports failures the same way: one `error:` line, then tips.

use colored::Colorize;
use gcectl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'lab' not found
///
///   tip: List available profiles: gcectl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the gcectl application
#[derive(Error, Debug)]
pub enum GceCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'gcectl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}'")]
    MissingCredentials { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for gcectl operations
pub type Result<T> = std::result::Result<T, GceCtlError>;

impl GceCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GceCtlError::ProfileNotFound { name } => vec![
                "List available profiles: gcectl profile list".to_string(),
                format!(
                    "Create profile '{}': gcectl profile set {} --project <project>",
                    name, name
                ),
            ],
            GceCtlError::NoProfileConfigured => vec![
                "Create a profile: gcectl profile set lab --project <project> --access-token '${GCECTL_ACCESS_TOKEN}'".to_string(),
                "Or export GCECTL_ACCESS_TOKEN and GOOGLE_CLOUD_PROJECT".to_string(),
            ],
            GceCtlError::MissingCredentials { name } => vec![
                format!("Check profile details: gcectl profile show {}", name),
                "Export a token: export GCECTL_ACCESS_TOKEN=$(gcloud auth print-access-token)"
                    .to_string(),
            ],
            GceCtlError::AuthenticationFailed { .. } => vec![
                "Access tokens expire after an hour; fetch a fresh one".to_string(),
                "Check that the token's account has Compute Engine permissions on the project"
                    .to_string(),
            ],
            GceCtlError::NotFound { .. } => vec![
                "Check the resource name and the zone: --zone <zone>".to_string(),
                "List instances in the zone: gcectl instance list".to_string(),
            ],
            GceCtlError::Timeout { .. } => vec![
                "The operation may still finish; check it with: gcectl operation wait <id>"
                    .to_string(),
                "Raise the limit with --wait-timeout <seconds>".to_string(),
            ],
            GceCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL: gcectl profile show <profile>".to_string(),
            ],
            GceCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: gcectl <command> --help".to_string(),
            ],
            GceCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GceCtlError::Cancelled { .. } => 130,
            _ => 1,
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let GceCtlError::MissingCredentials { .. } = self {
            diag = diag.detail("access_token is empty or references an unset variable");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for GceCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(message) => GceCtlError::NotFound { message },
            CoreError::Conflict(message) => GceCtlError::ApiError {
                message: format!("Already exists: {}", message),
            },
            CoreError::OperationFailed { .. } => GceCtlError::OperationFailed {
                message: err.to_string(),
            },
            CoreError::OperationTimedOut { .. } => GceCtlError::Timeout {
                message: err.to_string(),
            },
            CoreError::Cancelled(message) => GceCtlError::Cancelled { message },
            CoreError::Transient(message) => GceCtlError::ConnectionError { message },
            CoreError::Api { status, message } if status == 401 || status == 403 => {
                GceCtlError::AuthenticationFailed { message }
            }
            CoreError::Api { status, message } => GceCtlError::ApiError {
                message: format!("HTTP {}: {}", status, message),
            },
            CoreError::InvalidResponse(message) => GceCtlError::ApiError { message },
            CoreError::Configuration(message) => GceCtlError::InvalidInput { message },
            CoreError::Io(e) => GceCtlError::OutputError {
                message: format!("IO error: {}", e),
            },
        }
    }
}

impl From<ConfigError> for GceCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => GceCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => GceCtlError::NoProfileConfigured,
            ConfigError::MissingSetting { profile, .. } => {
                GceCtlError::MissingCredentials { name: profile }
            }
            other => GceCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GceCtlError {
    fn from(err: serde_json::Error) -> Self {
        GceCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for GceCtlError {
    fn from(err: std::io::Error) -> Self {
        GceCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for GceCtlError {
    fn from(err: anyhow::Error) -> Self {
        GceCtlError::Configuration(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcectl_core::OperationErrorDetail;
    use std::time::Duration;

    #[test]
    fn test_permission_denied_is_authentication_failure() {
        let err = GceCtlError::from(CoreError::Api {
            status: 403,
            message: "Required 'compute.instances.list' permission".to_string(),
        });
        assert!(matches!(err, GceCtlError::AuthenticationFailed { .. }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_operation_failure_keeps_provider_detail() {
        let err = GceCtlError::from(CoreError::OperationFailed {
            operation: "operation-1".to_string(),
            detail: OperationErrorDetail::single("QUOTA_EXCEEDED", "Quota 'CPUS' exceeded"),
        });
        assert!(err.to_string().contains("QUOTA_EXCEEDED: Quota 'CPUS' exceeded"));
    }

    #[test]
    fn test_timeout_suggests_resuming_the_wait() {
        let err = GceCtlError::from(CoreError::OperationTimedOut {
            operation: "operation-1".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(err, GceCtlError::Timeout { .. }));
        assert!(err.suggestions().iter().any(|s| s.contains("operation wait")));
    }

    #[test]
    fn test_cancelled_exit_code() {
        let err = GceCtlError::from(CoreError::Cancelled("operation-1".to_string()));
        assert_eq!(err.exit_code(), 130);
        assert_eq!(GceCtlError::NoProfileConfigured.exit_code(), 1);
    }

    #[test]
    fn test_missing_setting_maps_to_missing_credentials() {
        let err = GceCtlError::from(ConfigError::MissingSetting {
            profile: "lab".to_string(),
            field: "access_token".to_string(),
        });
        match err {
            GceCtlError::MissingCredentials { name } => assert_eq!(name, "lab"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_profile_not_found_suggestions_name_the_profile() {
        let err = GceCtlError::from(ConfigError::ProfileNotFound {
            name: "prod".to_string(),
        });
        assert!(
            err.suggestions()
                .iter()
                .any(|s| s.contains("gcectl profile set prod"))
        );
    }
}
