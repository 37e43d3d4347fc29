// Error types for ConsulClient

/// Errors that can occur during Consul client operations
#[derive(Debug, thiserror::Error)]
pub enum ConsulError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response, status code {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid key path '{0}': key must not begin with a '/'")]
    InvalidKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("All servers failed")]
    AllServersFailed,

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Lock is already held")]
    LockHeld,

    #[error("Lock not held")]
    LockNotHeld,

    #[error("Existing key does not match lock use")]
    LockConflict,

    #[error("Lock in use")]
    LockInUse,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ConsulError {
    /// Status code carried by an unexpected response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsulError::UnexpectedResponse { status, .. } => Some(*status),
            ConsulError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ConsulError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConsulError::UnexpectedResponse {
            status: 500,
            body: "rpc error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected response, status code 500: rpc error"
        );

        let err = ConsulError::InvalidKey("/foo".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid key path '/foo': key must not begin with a '/'"
        );

        assert_eq!(ConsulError::LockHeld.to_string(), "Lock is already held");
    }

    #[test]
    fn test_status_helpers() {
        let err = ConsulError::UnexpectedResponse {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(!ConsulError::LockNotHeld.is_not_found());
    }
}
