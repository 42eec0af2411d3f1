/// Identity provider error types
///
/// Errors raised by an [`IdentityProvider`](super::IdentityProvider) call.
/// A 2xx response with missing entity fields is NOT an error at this layer;
/// the envelope types carry `Option`s and the caller decides.

/// Identity provider error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Provider answered with a non-2xx status
    ///
    /// `message` is the raw response body as returned by the provider.
    #[error("Identity provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code from the provider
        status: u16,

        /// Response body
        message: String,
    },

    /// Request never completed (connect, timeout, TLS)
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Invalid identity provider response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed from the given configuration
    #[error("Invalid identity provider configuration: {0}")]
    InvalidConfig(String),
}

/// Provider result type alias
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Returns the provider status code, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = ProviderError::Status {
            status: 400,
            message: "email already exists".to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "Identity provider returned HTTP 400: email already exists"
        );

        let err = ProviderError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);
    }
}
