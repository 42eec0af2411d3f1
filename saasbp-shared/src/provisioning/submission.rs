/// Sign-up form submission
///
/// Wraps the raw submitted form map. Validation happens here, before the
/// workflow touches the identity provider.
///
/// # Required Fields
///
/// - `organization`: must sanitize to 1-63 characters
/// - `email`: non-empty (format is left to the provider)
/// - `password`: non-empty (policy is left to the provider)
///
/// Any other field is kept and passed verbatim into the registration
/// payload.

use super::error::{FieldError, ProvisioningError, ProvisioningResult};
use super::slug::{sanitize, OrganizationSlug};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

pub const ORGANIZATION_FIELD: &str = "organization";
pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

#[derive(Validate)]
struct RequiredFields<'a> {
    #[validate(length(
        min = 1,
        max = 63,
        message = "Organization must be 1-63 letters, digits or hyphens"
    ))]
    organization: String,

    #[validate(length(min = 1, message = "Email is required"))]
    email: &'a str,

    #[validate(length(min = 1, message = "Password is required"))]
    password: &'a str,
}

/// A validated sign-up submission
#[derive(Clone)]
pub struct SignupSubmission {
    slug: OrganizationSlug,
    email: String,
    fields: BTreeMap<String, String>,
}

impl SignupSubmission {
    /// Validates a submitted form map
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] listing every missing or
    /// invalid required field.
    pub fn from_fields(fields: BTreeMap<String, String>) -> ProvisioningResult<Self> {
        let field = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or_default();

        let required = RequiredFields {
            organization: sanitize(field(ORGANIZATION_FIELD)),
            email: field(EMAIL_FIELD),
            password: fields.get(PASSWORD_FIELD).map(String::as_str).unwrap_or_default(),
        };
        required.validate()?;

        let slug = OrganizationSlug::parse(&required.organization).ok_or_else(|| {
            ProvisioningError::Validation(vec![FieldError::new(
                ORGANIZATION_FIELD,
                "Organization is required",
            )])
        })?;
        let email = required.email.to_string();

        Ok(SignupSubmission {
            slug,
            email,
            fields,
        })
    }

    /// Sanitized organization name
    pub fn slug(&self) -> &OrganizationSlug {
        &self.slug
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Submitted fields as the provider's user object, values verbatim
    pub fn user_payload(&self) -> Map<String, JsonValue> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect()
    }
}

impl fmt::Debug for SignupSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupSubmission")
            .field("slug", &self.slug)
            .field("email", &self.email)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
