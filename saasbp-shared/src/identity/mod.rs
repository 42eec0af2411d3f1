/// Identity provider capability
///
/// This module defines the contract the provisioning workflow uses to talk
/// to the identity provider, and the factory that hands out handles scoped
/// to a particular credential.
///
/// # Scopes
///
/// - **Default**: tenant-unscoped, authenticated with the admin key
/// - **Tenant**: admin key, restricted to one tenant via the tenant header
/// - **ApiKey**: authenticated with a tenant-scoped key and nothing else
///
/// Every call to [`ClientFactory::client_for`] builds a fresh handle; no
/// handle is shared across scopes.
///
/// # Implementations
///
/// - [`HttpIdentityProvider`]: reqwest client against the provider REST API
/// - [`mock::RecordingProvider`]: scripted fake that records every call
///
/// # Example
///
/// ```no_run
/// use saasbp_shared::identity::{ClientFactory, ClientScope, HttpClientFactory, ProviderConfig};
/// use saasbp_shared::identity::models::TenantRequest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = HttpClientFactory::new(ProviderConfig::new(
///     "https://auth.saasbp.io",
///     "admin-api-key",
/// ));
///
/// let client = factory.client_for(ClientScope::Default)?;
/// let response = client
///     .create_tenant(&TenantRequest::new("default-tenant", "acme-corp", "saasbp.io"))
///     .await?;
/// println!("tenant: {:?}", response.tenant_id());
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod error;
pub mod mock;
pub mod models;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub use client::{HttpClientFactory, HttpIdentityProvider, ProviderConfig};
pub use error::{ProviderError, ProviderResult};

use models::{
    ApiKeyRequest, ApiKeyResponse, ApplicationRequest, ApplicationResponse, RegistrationRequest,
    RegistrationResponse, TenantRequest, TenantResponse,
};

/// Operations the provisioning workflow needs from the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a tenant copied from a source tenant
    async fn create_tenant(&self, request: &TenantRequest) -> ProviderResult<TenantResponse>;

    /// Issues an API key
    async fn create_api_key(&self, request: &ApiKeyRequest) -> ProviderResult<ApiKeyResponse>;

    /// Creates an application in the handle's tenant
    async fn create_application(
        &self,
        request: &ApplicationRequest,
    ) -> ProviderResult<ApplicationResponse>;

    /// Creates a user and registers it against an application
    async fn register(&self, request: &RegistrationRequest)
        -> ProviderResult<RegistrationResponse>;

    /// Deletes a tenant and everything in it
    async fn delete_tenant(&self, tenant_id: &str) -> ProviderResult<()>;

    /// Revokes an API key
    async fn delete_api_key(&self, key_id: &str) -> ProviderResult<()>;
}

/// Credential scope of a provider handle
#[derive(Clone, PartialEq, Eq)]
pub enum ClientScope {
    /// Admin key, no tenant restriction
    Default,

    /// Admin key restricted to one tenant
    Tenant(String),

    /// Tenant-scoped API key
    ApiKey(String),
}

impl ClientScope {
    /// Short label for logs (never includes the key)
    pub fn label(&self) -> &'static str {
        match self {
            ClientScope::Default => "default",
            ClientScope::Tenant(_) => "tenant",
            ClientScope::ApiKey(_) => "api_key",
        }
    }
}

impl fmt::Debug for ClientScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientScope::Default => write!(f, "Default"),
            ClientScope::Tenant(id) => f.debug_tuple("Tenant").field(id).finish(),
            ClientScope::ApiKey(_) => write!(f, "ApiKey([REDACTED])"),
        }
    }
}

/// Builds provider handles for a given scope
pub trait ClientFactory: Send + Sync {
    /// Returns a new handle authenticated for `scope`
    fn client_for(&self, scope: ClientScope) -> ProviderResult<Arc<dyn IdentityProvider>>;
}
