/// Provisioning error types
///
/// Every step of the workflow reports failure through [`ProvisioningError`];
/// there is no step whose failure escapes as anything else.

use crate::identity::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow step that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    CreateTenant,
    IssueApiKey,
    CreateApplication,
    RegisterUser,
}

impl ProvisioningStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::CreateTenant => "create_tenant",
            ProvisioningStep::IssueApiKey => "issue_api_key",
            ProvisioningStep::CreateApplication => "create_application",
            ProvisioningStep::RegisterUser => "register_user",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Submitted field name
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Provisioning error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// Submission rejected before any provider call
    #[error("Validation failed: {} {}", .0.len(), plural_errors(.0.len()))]
    Validation(Vec<FieldError>),

    /// Provider answered 2xx without the identifier the next step needs
    #[error("Identity provider returned no {field} during {step}")]
    EmptyResponse {
        step: ProvisioningStep,
        field: &'static str,
    },

    /// Provider answered with an error status
    #[error("{step} failed with HTTP {status}: {message}")]
    Provider {
        step: ProvisioningStep,
        status: u16,
        message: String,
    },

    /// Provider could not be reached or answered garbage
    #[error("{step} failed: {message}")]
    Unavailable {
        step: ProvisioningStep,
        message: String,
    },
}

/// Provisioning result type alias
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

impl ProvisioningError {
    /// Wraps a provider error raised during `step`
    pub fn from_provider(step: ProvisioningStep, err: ProviderError) -> Self {
        match err {
            ProviderError::Status { status, message } => ProvisioningError::Provider {
                step,
                status,
                message,
            },
            other => ProvisioningError::Unavailable {
                step,
                message: other.to_string(),
            },
        }
    }

    /// Step that failed; `None` for validation errors
    pub fn step(&self) -> Option<ProvisioningStep> {
        match self {
            ProvisioningError::Validation(_) => None,
            ProvisioningError::EmptyResponse { step, .. }
            | ProvisioningError::Provider { step, .. }
            | ProvisioningError::Unavailable { step, .. } => Some(*step),
        }
    }
}

impl From<validator::ValidationErrors> for ProvisioningError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ProvisioningError::Validation(details)
    }
}

fn plural_errors(count: usize) -> &'static str {
    if count == 1 {
        "error"
    } else {
        "errors"
    }
}
