/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// # Response Format
///
/// Every error renders the same envelope:
///
/// ```json
/// {
///   "error": {
///     "code": "upstream_error",
///     "message": "email already exists",
///     "details": [ { "field": "organization", "message": "..." } ]
///   }
/// }
/// ```
///
/// `details` is only present for validation errors.
///
/// # Example
///
/// ```
/// use saasbp_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("No such page".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use saasbp_shared::provisioning::{FieldError, ProvisioningError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Identity provider rejected a call; its status and body are passed on
    Upstream {
        status: StatusCode,
        message: String,
    },

    /// Bad gateway (502) - identity provider misbehaved or was unreachable
    BadGateway(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (e.g., "validation_error", "upstream_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                let noun = if errors.len() == 1 { "error" } else { "errors" };
                write!(f, "Validation failed: {} {}", errors.len(), noun)
            }
            ApiError::Upstream { status, message } => {
                write!(f, "Identity provider error ({}): {}", status.as_u16(), message)
            }
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Upstream { status, message } => (status, "upstream_error", message, None),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        ValidationErrorDetail {
            field: err.field,
            message: err.message,
        }
    }
}

/// Convert provisioning errors to API errors
///
/// Every step maps through here, so a failure in tenant creation looks
/// the same to the client as a failure in user registration.
impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::Validation(errors) => {
                ApiError::ValidationError(errors.into_iter().map(Into::into).collect())
            }
            ProvisioningError::Provider {
                step,
                status,
                message,
            } => match StatusCode::from_u16(status) {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    ApiError::Upstream { status, message }
                }
                _ => {
                    tracing::warn!(%step, status, "Identity provider returned a non-error status as failure");
                    ApiError::BadGateway(message)
                }
            },
            ProvisioningError::EmptyResponse { .. } => ApiError::BadGateway(err.to_string()),
            ProvisioningError::Unavailable { step, message } => {
                tracing::error!(%step, error = %message, "Identity provider unavailable");
                ApiError::BadGateway(format!(
                    "Identity provider unavailable during {}",
                    step
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saasbp_shared::provisioning::ProvisioningStep;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Page not found".to_string());
        assert_eq!(err.to_string(), "Not found: Page not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "organization".to_string(),
                message: "Organization is required".to_string(),
            },
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Email is required".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");

        let err = ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "email".to_string(),
            message: "Email is required".to_string(),
        }]);
        assert_eq!(err.to_string(), "Validation failed: 1 error");
    }

    #[test]
    fn test_provider_status_passed_through() {
        let err: ApiError = ProvisioningError::Provider {
            step: ProvisioningStep::RegisterUser,
            status: 400,
            message: "email already exists".to_string(),
        }
        .into();

        match err {
            ApiError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "email already exists");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_nonsense_provider_status_is_bad_gateway() {
        let err: ApiError = ProvisioningError::Provider {
            step: ProvisioningStep::CreateTenant,
            status: 302,
            message: "moved".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::BadGateway(_)));
    }

    #[test]
    fn test_empty_response_is_bad_gateway() {
        let err: ApiError = ProvisioningError::EmptyResponse {
            step: ProvisioningStep::CreateTenant,
            field: "tenant id",
        }
        .into();

        match err {
            ApiError::BadGateway(message) => assert!(message.contains("tenant id")),
            other => panic!("expected bad gateway, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_hides_transport_detail() {
        let err: ApiError = ProvisioningError::Unavailable {
            step: ProvisioningStep::IssueApiKey,
            message: "error sending request for url (http://10.0.0.5/api/api-key)".to_string(),
        }
        .into();

        match err {
            ApiError::BadGateway(message) => {
                assert!(!message.contains("10.0.0.5"));
                assert!(message.contains("issue_api_key"));
            }
            other => panic!("expected bad gateway, got {:?}", other),
        }
    }
}
