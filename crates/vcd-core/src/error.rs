//! Unified error handling for vcd-core
//!
//! Every operation either returns a materialized value or one of the kinds
//! below. Callers are expected to branch on [`VcdError::is_not_found`] and
//! [`VcdError::is_ambiguous`]; everything else is usually surfaced as-is.
//!
//! # Example
//!
//! ```rust
//! use vcd_core::{Operation, VcdError};
//!
//! let err = VcdError::EntityNotFound {
//!     operation: Operation::Get,
//!     entity: "Catalog".to_string(),
//!     detail: "urn:vcloud:catalog:1234".to_string(),
//! };
//! assert!(err.is_not_found());
//! assert!(err.to_string().contains("Catalog"));
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Minor error code VCD returns when an entity is locked by another task.
pub const BUSY_ENTITY_CODE: &str = "BUSY_ENTITY";

/// The kind of call an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    List,
    Update,
    Delete,
    WaitTask,
    Cancel,
    Upload,
    Login,
    Discover,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::WaitTask => "wait for task",
            Operation::Cancel => "cancel",
            Operation::Upload => "upload",
            Operation::Login => "login",
            Operation::Discover => "discover versions",
        };
        f.write_str(name)
    }
}

/// Error payload returned by the VCD API on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_error_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse a raw response body, returning `None` when it is not a VCD error document
    pub fn parse(raw: &str) -> Option<Self> {
        let body: ApiErrorBody = serde_json::from_str(raw).ok()?;
        if body.minor_error_code.is_none() && body.message.is_none() {
            return None;
        }
        Some(body)
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.minor_error_code, &self.message) {
            (Some(code), Some(msg)) => write!(f, "[{code}] {msg}"),
            (Some(code), None) => write!(f, "[{code}]"),
            (None, Some(msg)) => f.write_str(msg),
            (None, None) => f.write_str("no error details"),
        }
    }
}

/// Core error type for all SDK operations
#[derive(Error, Debug)]
pub enum VcdError {
    /// Local precondition failure, detected before any network call
    #[error("invalid parameters for {operation} {entity}: {message}")]
    InvalidParameters {
        operation: Operation,
        entity: String,
        message: String,
    },

    /// No API version satisfies both the endpoint and the server
    #[error(
        "{operation} {entity}: endpoint '{endpoint}' requires API version >= {required} but the server supports {available}"
    )]
    UnsupportedEndpoint {
        operation: Operation,
        entity: String,
        endpoint: String,
        required: String,
        available: String,
    },

    /// Non-2xx response that is not a "not found"
    #[error("{operation} {entity} failed with HTTP {status}: {detail}")]
    RequestFailed {
        operation: Operation,
        entity: String,
        status: u16,
        detail: String,
        api_error: Option<ApiErrorBody>,
    },

    /// The server reports that the resource does not exist
    #[error("{operation} {entity}: entity not found ({detail})")]
    EntityNotFound {
        operation: Operation,
        entity: String,
        detail: String,
    },

    /// A by-name lookup matched more than one resource
    #[error("{operation} {entity}: {count} entities match name '{name}'")]
    AmbiguousResult {
        operation: Operation,
        entity: String,
        name: String,
        count: usize,
    },

    /// Response body did not match the expected schema
    #[error("{operation} {entity}: failed to decode response: {source}")]
    DecodeFailed {
        operation: Operation,
        entity: String,
        #[source]
        source: serde_json::Error,
    },

    /// Task reached a terminal error or aborted state
    #[error("{operation} {entity}: task '{task}' {status}: {message}")]
    TaskFailed {
        operation: Operation,
        entity: String,
        task: String,
        status: String,
        message: String,
    },

    /// Task did not finish in time
    #[error("{operation} {entity}: task '{task}' timed out after {timeout:?}")]
    TaskTimeout {
        operation: Operation,
        entity: String,
        task: String,
        timeout: Duration,
    },

    /// The caller's cancellation token fired
    #[error("{operation} {entity} was cancelled")]
    Cancelled { operation: Operation, entity: String },

    /// Network-level failure from the HTTP transport
    #[error("{operation} {entity}: transport error: {source}")]
    Transport {
        operation: Operation,
        entity: String,
        #[source]
        source: reqwest::Error,
    },

    /// URL could not be built or parsed
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, VcdError>;

impl VcdError {
    pub(crate) fn invalid(
        operation: Operation,
        entity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        VcdError::InvalidParameters {
            operation,
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn cancelled(operation: Operation, entity: impl Into<String>) -> Self {
        VcdError::Cancelled {
            operation,
            entity: entity.into(),
        }
    }

    /// Re-label a task error with the call that was waiting on the task
    ///
    /// Other errors already carry their own context and pass through.
    pub(crate) fn waited_by(self, operation: Operation, entity: &str) -> Self {
        match self {
            VcdError::TaskFailed {
                task,
                status,
                message,
                ..
            } => VcdError::TaskFailed {
                operation,
                entity: entity.to_string(),
                task,
                status,
                message,
            },
            VcdError::TaskTimeout { task, timeout, .. } => VcdError::TaskTimeout {
                operation,
                entity: entity.to_string(),
                task,
                timeout,
            },
            other => other,
        }
    }

    /// Classify a non-2xx response
    ///
    /// 404 is always "not found". VCD also answers 400/403 with a
    /// `NOT_FOUND` or `ACCESS_TO_RESOURCE_IS_FORBIDDEN` minor code for
    /// entities the caller cannot see, which is treated the same way.
    pub fn from_response(operation: Operation, entity: &str, status: u16, body: &str) -> Self {
        let api_error = ApiErrorBody::parse(body);
        let detail = api_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| body.trim().to_string());

        let not_found_code = api_error
            .as_ref()
            .and_then(|e| e.minor_error_code.as_deref())
            .is_some_and(|code| code == "NOT_FOUND" || code == "ACCESS_TO_RESOURCE_IS_FORBIDDEN");

        if status == 404 || ((status == 400 || status == 403) && not_found_code) {
            return VcdError::EntityNotFound {
                operation,
                entity: entity.to_string(),
                detail,
            };
        }

        VcdError::RequestFailed {
            operation,
            entity: entity.to_string(),
            status,
            detail,
            api_error,
        }
    }

    /// Returns true if the resource does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, VcdError::EntityNotFound { .. })
    }

    /// Returns true if a by-name lookup matched more than one resource
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, VcdError::AmbiguousResult { .. })
    }

    #[must_use]
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(self, VcdError::InvalidParameters { .. })
    }

    #[must_use]
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(self, VcdError::UnsupportedEndpoint { .. })
    }

    #[must_use]
    pub fn is_task_failed(&self) -> bool {
        matches!(self, VcdError::TaskFailed { .. })
    }

    /// Returns true for task timeouts and transport-level timeouts
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            VcdError::TaskTimeout { .. } => true,
            VcdError::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VcdError::Cancelled { .. })
    }

    /// HTTP status of a failed request, if any
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VcdError::RequestFailed { status, .. } => Some(*status),
            VcdError::EntityNotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// The structured VCD error payload of a failed request, if it had one
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        match self {
            VcdError::RequestFailed { api_error, .. } => api_error.as_ref(),
            _ => None,
        }
    }
}
