/// Recording identity provider for tests and demos
///
/// A scripted fake that answers every operation with a preconfigured result
/// and records each call together with the scope of the handle it was made
/// on. Lets the provisioning workflow and the HTTP handlers be exercised
/// without a network boundary.
///
/// # Default Script
///
/// [`MockScript::succeeding`] answers:
/// 1. **create_tenant**: `{tenant: {id: "tenant-1"}}`
/// 2. **create_api_key**: `{apiKey: {id: "key-1", key: "scoped-key-1"}}`
/// 3. **create_application**: `{application: {id: "app-1"}}`
/// 4. **register**: `{user: {id: "user-1"}}`
/// 5. **delete_tenant / delete_api_key**: `Ok(())`
///
/// # Example
///
/// ```
/// use saasbp_shared::identity::mock::{MockScript, RecordingClientFactory};
/// use saasbp_shared::identity::{ClientFactory, ClientScope};
/// use saasbp_shared::identity::models::TenantRequest;
///
/// # async fn example() {
/// let factory = RecordingClientFactory::new(MockScript::succeeding());
/// let client = factory.client_for(ClientScope::Default).unwrap();
///
/// let response = client
///     .create_tenant(&TenantRequest::new("source", "acme-corp", "saasbp.io"))
///     .await
///     .unwrap();
///
/// assert_eq!(response.tenant_id(), Some("tenant-1"));
/// assert_eq!(factory.operations(), vec!["create_tenant"]);
/// # }
/// ```

use super::{ClientFactory, ClientScope, IdentityProvider, ProviderError, ProviderResult};
use crate::identity::models::{
    ApiKey, ApiKeyRequest, ApiKeyResponse, Application, ApplicationRequest, ApplicationResponse,
    RegisteredUser, Registration, RegistrationRequest, RegistrationResponse, Tenant,
    TenantRequest, TenantResponse,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// A recorded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    CreateTenant {
        scope: ClientScope,
        request: TenantRequest,
    },
    CreateApiKey {
        scope: ClientScope,
        request: ApiKeyRequest,
    },
    CreateApplication {
        scope: ClientScope,
        request: ApplicationRequest,
    },
    Register {
        scope: ClientScope,
        request: RegistrationRequest,
    },
    DeleteTenant {
        scope: ClientScope,
        tenant_id: String,
    },
    DeleteApiKey {
        scope: ClientScope,
        key_id: String,
    },
}

impl ProviderCall {
    /// Operation name
    pub fn operation(&self) -> &'static str {
        match self {
            ProviderCall::CreateTenant { .. } => "create_tenant",
            ProviderCall::CreateApiKey { .. } => "create_api_key",
            ProviderCall::CreateApplication { .. } => "create_application",
            ProviderCall::Register { .. } => "register",
            ProviderCall::DeleteTenant { .. } => "delete_tenant",
            ProviderCall::DeleteApiKey { .. } => "delete_api_key",
        }
    }

    /// Scope of the handle the call was made on
    pub fn scope(&self) -> &ClientScope {
        match self {
            ProviderCall::CreateTenant { scope, .. }
            | ProviderCall::CreateApiKey { scope, .. }
            | ProviderCall::CreateApplication { scope, .. }
            | ProviderCall::Register { scope, .. }
            | ProviderCall::DeleteTenant { scope, .. }
            | ProviderCall::DeleteApiKey { scope, .. } => scope,
        }
    }
}

/// Scripted responses, one per operation
#[derive(Debug, Clone)]
pub struct MockScript {
    pub create_tenant: ProviderResult<TenantResponse>,
    pub create_api_key: ProviderResult<ApiKeyResponse>,
    pub create_application: ProviderResult<ApplicationResponse>,
    pub register: ProviderResult<RegistrationResponse>,
    pub delete_tenant: ProviderResult<()>,
    pub delete_api_key: ProviderResult<()>,
}

impl MockScript {
    /// Script where every operation succeeds
    pub fn succeeding() -> Self {
        MockScript {
            create_tenant: Ok(TenantResponse {
                tenant: Some(Tenant {
                    id: Some("tenant-1".to_string()),
                    name: None,
                }),
            }),
            create_api_key: Ok(ApiKeyResponse {
                api_key: Some(ApiKey {
                    id: Some("key-1".to_string()),
                    key: Some("scoped-key-1".to_string()),
                    tenant_id: Some("tenant-1".to_string()),
                }),
            }),
            create_application: Ok(ApplicationResponse {
                application: Some(Application {
                    id: Some("app-1".to_string()),
                    name: None,
                }),
            }),
            register: Ok(RegistrationResponse {
                user: Some(RegisteredUser {
                    id: Some("user-1".to_string()),
                    email: None,
                }),
                registration: Some(Registration {
                    id: Some("registration-1".to_string()),
                    application_id: Some("app-1".to_string()),
                }),
            }),
            delete_tenant: Ok(()),
            delete_api_key: Ok(()),
        }
    }

    /// Answers create_tenant with the given tenant ID
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.create_tenant = Ok(TenantResponse {
            tenant: Some(Tenant {
                id: Some(tenant_id.into()),
                name: None,
            }),
        });
        self
    }

    /// Answers create_tenant with a 2xx and no tenant
    pub fn with_empty_tenant(mut self) -> Self {
        self.create_tenant = Ok(TenantResponse::default());
        self
    }

    /// Answers create_api_key with a 2xx and no key
    pub fn with_empty_api_key(mut self) -> Self {
        self.create_api_key = Ok(ApiKeyResponse::default());
        self
    }

    /// Answers create_application with a 2xx and no application
    pub fn with_empty_application(mut self) -> Self {
        self.create_application = Ok(ApplicationResponse::default());
        self
    }

    /// Fails create_tenant with a provider status
    pub fn fail_create_tenant(mut self, status: u16, message: impl Into<String>) -> Self {
        self.create_tenant = Err(status_error(status, message));
        self
    }

    /// Fails create_api_key with a provider status
    pub fn fail_create_api_key(mut self, status: u16, message: impl Into<String>) -> Self {
        self.create_api_key = Err(status_error(status, message));
        self
    }

    /// Fails create_application with a provider status
    pub fn fail_create_application(mut self, status: u16, message: impl Into<String>) -> Self {
        self.create_application = Err(status_error(status, message));
        self
    }

    /// Fails register with a provider status
    pub fn fail_register(mut self, status: u16, message: impl Into<String>) -> Self {
        self.register = Err(status_error(status, message));
        self
    }

    /// Fails delete_tenant with a provider status
    pub fn fail_delete_tenant(mut self, status: u16, message: impl Into<String>) -> Self {
        self.delete_tenant = Err(status_error(status, message));
        self
    }
}

impl Default for MockScript {
    fn default() -> Self {
        Self::succeeding()
    }
}

fn status_error(status: u16, message: impl Into<String>) -> ProviderError {
    ProviderError::Status {
        status,
        message: message.into(),
    }
}

/// Factory handing out [`RecordingProvider`] handles that share one call log
#[derive(Debug, Clone)]
pub struct RecordingClientFactory {
    script: Arc<MockScript>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    scopes: Arc<Mutex<Vec<ClientScope>>>,
}

impl RecordingClientFactory {
    /// Creates a factory answering with `script`
    pub fn new(script: MockScript) -> Self {
        RecordingClientFactory {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
            scopes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Factory where every operation succeeds
    pub fn succeeding() -> Self {
        Self::new(MockScript::succeeding())
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.calls).clone()
    }

    /// Number of provider calls made (handle construction is not a call)
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Names of the recorded operations, in order
    pub fn operations(&self) -> Vec<&'static str> {
        lock(&self.calls).iter().map(ProviderCall::operation).collect()
    }

    /// Scopes requested from the factory, in order
    pub fn scopes_requested(&self) -> Vec<ClientScope> {
        lock(&self.scopes).clone()
    }
}

impl ClientFactory for RecordingClientFactory {
    fn client_for(&self, scope: ClientScope) -> ProviderResult<Arc<dyn IdentityProvider>> {
        lock(&self.scopes).push(scope.clone());
        Ok(Arc::new(RecordingProvider {
            scope,
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Provider handle that records calls and answers from a script
pub struct RecordingProvider {
    scope: ClientScope,
    script: Arc<MockScript>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl RecordingProvider {
    fn record(&self, call: ProviderCall) {
        tracing::debug!(
            operation = call.operation(),
            scope = self.scope.label(),
            "Mock identity provider call"
        );
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl IdentityProvider for RecordingProvider {
    async fn create_tenant(&self, request: &TenantRequest) -> ProviderResult<TenantResponse> {
        self.record(ProviderCall::CreateTenant {
            scope: self.scope.clone(),
            request: request.clone(),
        });
        self.script.create_tenant.clone()
    }

    async fn create_api_key(&self, request: &ApiKeyRequest) -> ProviderResult<ApiKeyResponse> {
        self.record(ProviderCall::CreateApiKey {
            scope: self.scope.clone(),
            request: request.clone(),
        });
        self.script.create_api_key.clone()
    }

    async fn create_application(
        &self,
        request: &ApplicationRequest,
    ) -> ProviderResult<ApplicationResponse> {
        self.record(ProviderCall::CreateApplication {
            scope: self.scope.clone(),
            request: request.clone(),
        });
        self.script.create_application.clone()
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> ProviderResult<RegistrationResponse> {
        self.record(ProviderCall::Register {
            scope: self.scope.clone(),
            request: request.clone(),
        });
        self.script.register.clone()
    }

    async fn delete_tenant(&self, tenant_id: &str) -> ProviderResult<()> {
        self.record(ProviderCall::DeleteTenant {
            scope: self.scope.clone(),
            tenant_id: tenant_id.to_string(),
        });
        self.script.delete_tenant.clone()
    }

    async fn delete_api_key(&self, key_id: &str) -> ProviderResult<()> {
        self.record(ProviderCall::DeleteApiKey {
            scope: self.scope.clone(),
            key_id: key_id.to_string(),
        });
        self.script.delete_api_key.clone()
    }
}

// Poisoning only happens if a test panicked mid-push; the log is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
