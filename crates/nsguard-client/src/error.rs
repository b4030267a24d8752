// Error types for the portal client

use nsguard_common::GuardError;

/// Errors that can occur while talking to the portal
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    #[error("All servers failed")]
    AllServersFailed,

    #[error("Invalid portal url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Portal address cannot carry a path: {0}")]
    CannotBeABase(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PortalError {
    /// Convert into the failure of a delete call, keeping the portal's message
    pub fn into_deletion_failure(self) -> GuardError {
        match self {
            PortalError::RequestFailed {
                message, detail, ..
            } => GuardError::DeletionRequestFailed { message, detail },
            other => GuardError::DeletionRequestFailed {
                message: other.to_string(),
                detail: None,
            },
        }
    }
}

impl From<PortalError> for GuardError {
    fn from(value: PortalError) -> Self {
        GuardError::Provider(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortalError::RequestFailed {
            status: 403,
            message: "forbidden".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "Request failed with status 403: forbidden");
        assert_eq!(PortalError::AllServersFailed.to_string(), "All servers failed");
    }

    #[test]
    fn test_into_guard_error() {
        let err: GuardError = PortalError::AllServersFailed.into();
        assert_eq!(err, GuardError::Provider("All servers failed".to_string()));
    }

    #[test]
    fn test_into_deletion_failure() {
        let err = PortalError::RequestFailed {
            status: 400,
            message: "namespace has items".to_string(),
            detail: Some("IllegalStateException".to_string()),
        }
        .into_deletion_failure();
        assert_eq!(
            err,
            GuardError::DeletionRequestFailed {
                message: "namespace has items".to_string(),
                detail: Some("IllegalStateException".to_string()),
            }
        );
    }
}
