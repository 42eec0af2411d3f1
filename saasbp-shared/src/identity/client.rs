/// HTTP identity provider client
///
/// reqwest implementation of [`IdentityProvider`] against the provider's
/// REST API.
///
/// # Endpoints
///
/// ```text
/// POST   /api/tenant             create_tenant
/// POST   /api/api-key            create_api_key
/// POST   /api/application        create_application
/// POST   /api/user/registration  register
/// DELETE /api/tenant/{id}        delete_tenant
/// DELETE /api/api-key/{id}       delete_api_key
/// ```
///
/// # Authentication
///
/// The API key goes in the `Authorization` header as-is (no scheme).
/// Tenant-scoped handles add `X-FusionAuth-TenantId`.
///
/// # Response Handling
///
/// - non-2xx: [`ProviderError::Status`] with the raw body as message
/// - 2xx with empty body: the envelope's `Default` (all fields `None`)
/// - 2xx with JSON body: decoded envelope

use super::{ClientFactory, ClientScope, IdentityProvider, ProviderError, ProviderResult};
use crate::identity::models::{
    ApiKeyRequest, ApiKeyResponse, ApplicationRequest, ApplicationResponse, RegistrationRequest,
    RegistrationResponse, TenantRequest, TenantResponse,
};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Header restricting an admin-key request to one tenant
pub const TENANT_HEADER: &str = "X-FusionAuth-TenantId";

/// Connection settings for the identity provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// Provider base URL (e.g. `https://auth.saasbp.io`)
    pub base_url: String,

    /// Admin API key used by default and tenant-scoped handles
    pub api_key: String,

    /// Per-request timeout; reqwest's default when `None`
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    /// Creates a config with no explicit timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        ProviderConfig {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    /// Sets the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Identity provider handle bound to one credential scope
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    tenant_id: Option<String>,
}

impl fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("base_url", &self.base_url)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl HttpIdentityProvider {
    /// Builds a handle for `scope`
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidConfig`] if the base URL is empty or
    /// the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig, scope: ClientScope) -> ProviderResult<Self> {
        if config.base_url.is_empty() {
            return Err(ProviderError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ProviderError::InvalidConfig(format!("Failed to create HTTP client: {e}"))
        })?;

        let (api_key, tenant_id) = match scope {
            ClientScope::Default => (config.api_key.clone(), None),
            ClientScope::Tenant(tenant_id) => (config.api_key.clone(), Some(tenant_id)),
            ClientScope::ApiKey(key) => (key, None),
        };

        Ok(HttpIdentityProvider {
            client,
            base_url: config.base_url.clone(),
            api_key,
            tenant_id,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, self.api_key.as_str());

        if let Some(tenant_id) = &self.tenant_id {
            request = request.header(TENANT_HEADER, tenant_id.as_str());
        }

        request
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Default,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(response).await
    }

    async fn delete(&self, path: &str) -> ProviderResult<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

async fn decode<R>(response: Response) -> ProviderResult<R>
where
    R: DeserializeOwned + Default,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "Identity provider returned error status");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message: body,
        });
    }

    if body.trim().is_empty() {
        tracing::warn!(
            status = status.as_u16(),
            "Identity provider returned success with an empty body"
        );
        return Ok(R::default());
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_tenant(&self, request: &TenantRequest) -> ProviderResult<TenantResponse> {
        self.post("/api/tenant", request).await
    }

    async fn create_api_key(&self, request: &ApiKeyRequest) -> ProviderResult<ApiKeyResponse> {
        self.post("/api/api-key", request).await
    }

    async fn create_application(
        &self,
        request: &ApplicationRequest,
    ) -> ProviderResult<ApplicationResponse> {
        self.post("/api/application", request).await
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> ProviderResult<RegistrationResponse> {
        self.post("/api/user/registration", request).await
    }

    async fn delete_tenant(&self, tenant_id: &str) -> ProviderResult<()> {
        self.delete(&format!("/api/tenant/{}", tenant_id)).await
    }

    async fn delete_api_key(&self, key_id: &str) -> ProviderResult<()> {
        self.delete(&format!("/api/api-key/{}", key_id)).await
    }
}

/// Factory building [`HttpIdentityProvider`] handles from one config
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: ProviderConfig,
}

impl HttpClientFactory {
    pub fn new(config: ProviderConfig) -> Self {
        HttpClientFactory { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn client_for(&self, scope: ClientScope) -> ProviderResult<Arc<dyn IdentityProvider>> {
        tracing::trace!(scope = scope.label(), "Building identity provider client");
        Ok(Arc::new(HttpIdentityProvider::new(&self.config, scope)?))
    }
}
