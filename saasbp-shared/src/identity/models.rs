/// Identity provider request payloads and response envelopes
///
/// Field names follow the provider's camelCase JSON contract. Every entity
/// and identifier in a response envelope is optional: a misconfigured
/// provider can answer 2xx with an empty body, and that has to be visible
/// to the caller rather than papered over by a decode error.
///
/// # Example
///
/// ```
/// use saasbp_shared::identity::models::{TenantRequest, TenantResponse};
///
/// let request = TenantRequest::new("source-tenant", "acme-corp", "saasbp.io");
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["sourceTenantId"], "source-tenant");
/// assert_eq!(json["tenant"]["name"], "acme-corp");
///
/// let empty: TenantResponse = serde_json::from_str("{}").unwrap();
/// assert!(empty.tenant_id().is_none());
/// ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Create tenant request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRequest {
    /// Tenant whose configuration is copied into the new tenant
    pub source_tenant_id: String,

    /// New tenant descriptor
    pub tenant: TenantDescriptor,
}

/// New tenant descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDescriptor {
    /// Tenant display name
    pub name: String,

    /// Token issuer domain
    pub issuer: String,
}

impl TenantRequest {
    /// Creates a tenant request copying `source_tenant_id`
    pub fn new(
        source_tenant_id: impl Into<String>,
        name: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        TenantRequest {
            source_tenant_id: source_tenant_id.into(),
            tenant: TenantDescriptor {
                name: name.into(),
                issuer: issuer.into(),
            },
        }
    }
}

/// Create tenant response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResponse {
    pub tenant: Option<Tenant>,
}

/// Tenant as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl TenantResponse {
    /// Returns the created tenant ID, ignoring blank values
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(|t| non_blank(t.id.as_deref()))
    }
}

/// Create API key request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRequest {
    pub api_key: ApiKeyDescriptor,
}

/// New API key descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyDescriptor {
    /// Key metadata
    pub meta_data: ApiKeyMetaData,

    /// Tenant the key is restricted to
    pub tenant_id: String,
}

/// API key metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyMetaData {
    pub attributes: ApiKeyAttributes,
}

/// API key metadata attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyAttributes {
    /// Human-readable description
    pub description: String,
}

impl ApiKeyRequest {
    /// Creates a key request restricted to `tenant_id`
    pub fn for_tenant(tenant_id: impl Into<String>, description: impl Into<String>) -> Self {
        ApiKeyRequest {
            api_key: ApiKeyDescriptor {
                meta_data: ApiKeyMetaData {
                    attributes: ApiKeyAttributes {
                        description: description.into(),
                    },
                },
                tenant_id: tenant_id.into(),
            },
        }
    }

    /// Tenant the requested key is restricted to
    pub fn tenant_id(&self) -> &str {
        &self.api_key.tenant_id
    }
}

/// Create API key response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub api_key: Option<ApiKey>,
}

/// API key as returned by the provider
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: Option<String>,
    pub key: Option<String>,
    pub tenant_id: Option<String>,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl ApiKeyResponse {
    /// Returns the key ID, ignoring blank values
    pub fn key_id(&self) -> Option<&str> {
        self.api_key.as_ref().and_then(|k| non_blank(k.id.as_deref()))
    }

    /// Returns the key secret, ignoring blank values
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_ref().and_then(|k| non_blank(k.key.as_deref()))
    }
}

/// Create application request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub application: ApplicationDescriptor,
}

/// New application descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescriptor {
    /// Application name
    pub name: String,

    /// Roles defined on the application
    pub roles: Vec<ApplicationRole>,
}

/// Application role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRole {
    /// Role name
    pub name: String,

    /// Whether new registrations receive this role automatically
    pub is_default: bool,
}

impl ApplicationRole {
    pub fn new(name: impl Into<String>, is_default: bool) -> Self {
        ApplicationRole {
            name: name.into(),
            is_default,
        }
    }
}

/// Create application response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub application: Option<Application>,
}

/// Application as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ApplicationResponse {
    /// Returns the created application ID, ignoring blank values
    pub fn application_id(&self) -> Option<&str> {
        self.application
            .as_ref()
            .and_then(|a| non_blank(a.id.as_deref()))
    }
}

/// Register user request
///
/// `user` carries the submitted form fields verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// User object (passed through as submitted)
    pub user: Map<String, JsonValue>,

    /// Registration against an application
    pub registration: RegistrationDescriptor,
}

/// Registration descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDescriptor {
    pub application_id: String,
}

impl RegistrationRequest {
    /// Creates a registration of `user` against `application_id`
    pub fn new(user: Map<String, JsonValue>, application_id: impl Into<String>) -> Self {
        RegistrationRequest {
            user,
            registration: RegistrationDescriptor {
                application_id: application_id.into(),
            },
        }
    }
}

/// Register user response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub user: Option<RegisteredUser>,
    pub registration: Option<Registration>,
}

/// Registered user as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// Registration as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Option<String>,
    pub application_id: Option<String>,
}

impl RegistrationResponse {
    /// Returns the registered user's ID, ignoring blank values
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| non_blank(u.id.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_request_shape() {
        let request = ApiKeyRequest::for_tenant("t1", "API key for acme-corp");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({
                "apiKey": {
                    "metaData": { "attributes": { "description": "API key for acme-corp" } },
                    "tenantId": "t1"
                }
            })
        );
    }

    #[test]
    fn test_application_role_serializes_is_default() {
        let role = ApplicationRole::new("member", true);
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json, json!({ "name": "member", "isDefault": true }));
    }

    #[test]
    fn test_blank_ids_are_treated_as_missing() {
        let response: TenantResponse =
            serde_json::from_value(json!({ "tenant": { "id": "  " } })).unwrap();
        assert_eq!(response.tenant_id(), None);

        let response: ApiKeyResponse =
            serde_json::from_value(json!({ "apiKey": { "id": "k1" } })).unwrap();
        assert_eq!(response.key_id(), Some("k1"));
        assert_eq!(response.key(), None);
    }

    #[test]
    fn test_api_key_debug_redacts_secret() {
        let key = ApiKey {
            id: Some("k1".to_string()),
            key: Some("super-secret".to_string()),
            tenant_id: None,
        };
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_registration_response_parses_provider_envelope() {
        let response: RegistrationResponse = serde_json::from_value(json!({
            "user": { "id": "u1", "email": "ada@acme.io", "active": true },
            "registration": { "id": "r1", "applicationId": "a1", "roles": ["member"] }
        }))
        .unwrap();

        assert_eq!(response.user_id(), Some("u1"));
        assert_eq!(
            response.registration.unwrap().application_id.as_deref(),
            Some("a1")
        );
    }
}
