//! Error types and error codes for NsGuard
//!
//! This module defines:
//! - `GuardError`: Deletion workflow error enum
//! - `ErrorCode`: Structured error codes for operator-facing output

use serde::{Deserialize, Serialize};

/// Errors raised by the deletion workflow
///
/// The first five variants are policy rejections produced by the guard
/// pipeline. The rest are failures of the surrounding machinery.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("namespace '{0}' is private and cannot be deleted")]
    NotPublic(String),

    #[error("operator is not an app master, ask one of [{}]", .0.join(", "))]
    NoPermission(Vec<String>),

    #[error("namespace '{0}' still has instances on its main branch")]
    MasterInstanceBlocking(String),

    #[error("namespace '{0}' still has instances on its gray branch")]
    BranchInstanceBlocking(String),

    #[error("public namespace is associated by other apps: [{}]", .0.join(", "))]
    PublicNamespaceAssociated(Vec<String>),

    #[error("{message}")]
    DeletionRequestFailed {
        message: String,
        detail: Option<String>,
    },

    #[error("a delete of namespace '{0}' is already in flight")]
    DeleteInFlight(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GuardError {
    /// Stable code for this error
    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            GuardError::NotPublic(_) => NAMESPACE_NOT_PUBLIC,
            GuardError::NoPermission(_) => ACCESS_DENIED,
            GuardError::MasterInstanceBlocking(_) => MASTER_INSTANCE_BLOCKING,
            GuardError::BranchInstanceBlocking(_) => BRANCH_INSTANCE_BLOCKING,
            GuardError::PublicNamespaceAssociated(_) => PUBLIC_NAMESPACE_ASSOCIATED,
            GuardError::DeletionRequestFailed { .. } => DELETION_REQUEST_FAILED,
            GuardError::DeleteInFlight(_) => DELETE_IN_FLIGHT,
            GuardError::Provider(_) => PROVIDER_ERROR,
            GuardError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
            GuardError::ConfigError(_) => CONFIG_ERROR,
        }
    }

    /// Whether this error is a policy rejection rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GuardError::NotPublic(_)
                | GuardError::NoPermission(_)
                | GuardError::MasterInstanceBlocking(_)
                | GuardError::BranchInstanceBlocking(_)
                | GuardError::PublicNamespaceAssociated(_)
        )
    }
}

impl From<anyhow::Error> for GuardError {
    fn from(value: anyhow::Error) -> Self {
        GuardError::Provider(value.to_string())
    }
}

/// Error code structure for operator-facing output
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

// Deletion guard rejections
pub const NAMESPACE_NOT_PUBLIC: ErrorCode<'static> = ErrorCode {
    code: 22010,
    message: "private namespace cannot be deleted",
};

pub const MASTER_INSTANCE_BLOCKING: ErrorCode<'static> = ErrorCode {
    code: 22011,
    message: "namespace main branch has instances",
};

pub const BRANCH_INSTANCE_BLOCKING: ErrorCode<'static> = ErrorCode {
    code: 22012,
    message: "namespace gray branch has instances",
};

pub const PUBLIC_NAMESPACE_ASSOCIATED: ErrorCode<'static> = ErrorCode {
    code: 22013,
    message: "public namespace is associated by other apps",
};

// Deletion execution
pub const DELETION_REQUEST_FAILED: ErrorCode<'static> = ErrorCode {
    code: 22020,
    message: "namespace deletion failed",
};

pub const DELETE_IN_FLIGHT: ErrorCode<'static> = ErrorCode {
    code: 22021,
    message: "namespace deletion already in flight",
};

pub const PROVIDER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "provider error",
};

pub const CONFIG_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30002,
    message: "configuration error",
};
