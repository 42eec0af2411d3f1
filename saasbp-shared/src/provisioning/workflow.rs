/// Organization provisioning workflow
///
/// Runs the four identity-provider calls that turn a sign-up submission
/// into a tenant, a scoped API key, an application and a registered user.
///
/// # Step Sequence
///
/// ```text
/// validate submission                (no network)
///   └─> create_tenant       [Default]      → tenant id
///         └─> create_api_key [Default]     → scoped key (tenantId = tenant id)
///               └─> create_application [ApiKey(scoped key)] → application id
///                     └─> register [Tenant(tenant id)]      → signin target
/// ```
///
/// Steps run strictly in order and the first failure aborts the rest. The
/// scoped key is only ever handed to the application step's client and is
/// dropped when the run ends.
///
/// # Failure Handling
///
/// IDs created along the way are recorded in a [`ProvisioningLedger`]. With
/// `rollback_on_failure` off (the default) nothing is undone and the
/// orphaned IDs are logged. With it on, the key is revoked and the tenant
/// deleted, best effort, through the default client.
///
/// # Example
///
/// ```
/// use saasbp_shared::identity::mock::RecordingClientFactory;
/// use saasbp_shared::provisioning::{ProvisioningConfig, ProvisioningWorkflow};
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let factory = Arc::new(RecordingClientFactory::succeeding());
/// let workflow = ProvisioningWorkflow::new(factory, ProvisioningConfig::new("default-tenant"));
///
/// let mut form = BTreeMap::new();
/// form.insert("organization".to_string(), "acme-corp".to_string());
/// form.insert("email".to_string(), "ada@acme.io".to_string());
/// form.insert("password".to_string(), "correct horse".to_string());
///
/// let org = workflow.provision(form).await.unwrap();
/// assert_eq!(org.signin_target, "acme-corp.saasbp.io/signin");
/// # }
/// ```

use super::error::{ProvisioningError, ProvisioningResult, ProvisioningStep};
use super::slug::OrganizationSlug;
use super::submission::SignupSubmission;
use crate::identity::models::{
    ApiKeyRequest, ApplicationDescriptor, ApplicationRequest, ApplicationRole,
    RegistrationRequest, TenantRequest,
};
use crate::identity::{ClientFactory, ClientScope, IdentityProvider};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Role granted explicitly to organization administrators
pub const ADMIN_ROLE: &str = "admin";

/// Role every new registration receives
pub const MEMBER_ROLE: &str = "member";

/// Default issuer and base domain
pub const DEFAULT_DOMAIN: &str = "saasbp.io";

/// Fixed role set of every organization application
pub fn application_roles() -> Vec<ApplicationRole> {
    vec![
        ApplicationRole::new(ADMIN_ROLE, false),
        ApplicationRole::new(MEMBER_ROLE, true),
    ]
}

/// Workflow configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    /// Template tenant copied into every new tenant
    pub source_tenant_id: String,

    /// Issuer set on new tenants
    pub issuer: String,

    /// Domain organization subdomains live under
    pub base_domain: String,

    /// Undo created resources when a later step fails
    pub rollback_on_failure: bool,
}

impl ProvisioningConfig {
    /// Config with the default domain and rollback disabled
    pub fn new(source_tenant_id: impl Into<String>) -> Self {
        ProvisioningConfig {
            source_tenant_id: source_tenant_id.into(),
            issuer: DEFAULT_DOMAIN.to_string(),
            base_domain: DEFAULT_DOMAIN.to_string(),
            rollback_on_failure: false,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_base_domain(mut self, base_domain: impl Into<String>) -> Self {
        self.base_domain = base_domain.into();
        self
    }

    pub fn with_rollback(mut self, rollback_on_failure: bool) -> Self {
        self.rollback_on_failure = rollback_on_failure;
        self
    }
}

/// IDs created during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningLedger {
    pub tenant_id: Option<String>,
    pub api_key_id: Option<String>,
    pub application_id: Option<String>,
}

impl ProvisioningLedger {
    /// True when nothing has been created yet
    pub fn is_empty(&self) -> bool {
        self.tenant_id.is_none() && self.api_key_id.is_none() && self.application_id.is_none()
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedOrganization {
    /// Sanitized organization name (tenant name and subdomain)
    pub slug: OrganizationSlug,

    pub tenant_id: String,

    pub application_id: String,

    /// Registered user, if the provider reported one
    pub user_id: Option<String>,

    /// `<slug>.<base_domain>/signin`, scheme left to the caller
    pub signin_target: String,
}

struct ScopedKey {
    id: Option<String>,
    key: String,
}

impl fmt::Debug for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedKey")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Organization provisioning workflow
#[derive(Clone)]
pub struct ProvisioningWorkflow {
    factory: Arc<dyn ClientFactory>,
    config: ProvisioningConfig,
}

impl fmt::Debug for ProvisioningWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningWorkflow")
            .field("config", &self.config)
            .finish()
    }
}

impl ProvisioningWorkflow {
    pub fn new(factory: Arc<dyn ClientFactory>, config: ProvisioningConfig) -> Self {
        ProvisioningWorkflow { factory, config }
    }

    /// Provisions an organization from a submitted form map
    ///
    /// # Errors
    ///
    /// - [`ProvisioningError::Validation`]: rejected before any provider call
    /// - [`ProvisioningError::EmptyResponse`]: a 2xx without the needed ID or key
    /// - [`ProvisioningError::Provider`]: the provider answered with an error status
    /// - [`ProvisioningError::Unavailable`]: the provider could not be reached
    pub async fn provision(
        &self,
        fields: BTreeMap<String, String>,
    ) -> ProvisioningResult<ProvisionedOrganization> {
        let submission = SignupSubmission::from_fields(fields).map_err(|err| {
            tracing::info!(error = %err, "Sign-up submission rejected");
            err
        })?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "provision",
            %run_id,
            organization = %submission.slug(),
        );

        async move {
            let mut ledger = ProvisioningLedger::default();

            match self.run_steps(&submission, &mut ledger).await {
                Ok(organization) => {
                    tracing::info!(
                        tenant_id = %organization.tenant_id,
                        application_id = %organization.application_id,
                        "Organization provisioned"
                    );
                    Ok(organization)
                }
                Err(err) => {
                    tracing::warn!(error = %err, step = ?err.step(), "Provisioning failed");
                    self.handle_failure(&ledger).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_steps(
        &self,
        submission: &SignupSubmission,
        ledger: &mut ProvisioningLedger,
    ) -> ProvisioningResult<ProvisionedOrganization> {
        let slug = submission.slug();

        let tenant_id = self.create_tenant(slug).await?;
        ledger.tenant_id = Some(tenant_id.clone());

        let scoped_key = self.issue_api_key(slug, &tenant_id).await?;
        ledger.api_key_id = scoped_key.id.clone();

        let application_id = self.create_application(slug, scoped_key).await?;
        ledger.application_id = Some(application_id.clone());

        let user_id = self
            .register_user(&tenant_id, submission, &application_id)
            .await?;

        Ok(ProvisionedOrganization {
            slug: slug.clone(),
            tenant_id,
            application_id,
            user_id,
            signin_target: slug.signin_target(&self.config.base_domain),
        })
    }

    fn client(
        &self,
        scope: ClientScope,
        step: ProvisioningStep,
    ) -> ProvisioningResult<Arc<dyn IdentityProvider>> {
        self.factory
            .client_for(scope)
            .map_err(|e| ProvisioningError::from_provider(step, e))
    }

    async fn create_tenant(&self, slug: &OrganizationSlug) -> ProvisioningResult<String> {
        let step = ProvisioningStep::CreateTenant;
        let client = self.client(ClientScope::Default, step)?;

        let request = TenantRequest::new(
            self.config.source_tenant_id.as_str(),
            slug.as_str(),
            self.config.issuer.as_str(),
        );
        let response = client
            .create_tenant(&request)
            .await
            .map_err(|e| ProvisioningError::from_provider(step, e))?;

        let tenant_id = response
            .tenant_id()
            .ok_or(ProvisioningError::EmptyResponse {
                step,
                field: "tenant id",
            })?
            .to_string();

        tracing::info!(tenant_id = %tenant_id, "Tenant created");
        Ok(tenant_id)
    }

    async fn issue_api_key(
        &self,
        slug: &OrganizationSlug,
        tenant_id: &str,
    ) -> ProvisioningResult<ScopedKey> {
        let step = ProvisioningStep::IssueApiKey;
        let client = self.client(ClientScope::Default, step)?;

        let request =
            ApiKeyRequest::for_tenant(tenant_id, format!("Tenant-scoped API key for {}", slug));
        let response = client
            .create_api_key(&request)
            .await
            .map_err(|e| ProvisioningError::from_provider(step, e))?;

        let key = response
            .key()
            .ok_or(ProvisioningError::EmptyResponse {
                step,
                field: "API key",
            })?
            .to_string();
        let id = response.key_id().map(str::to_string);

        if id.is_none() {
            tracing::warn!("Scoped API key issued without an id; it cannot be revoked automatically");
        }
        tracing::info!(api_key_id = ?id, "Scoped API key issued");

        Ok(ScopedKey { id, key })
    }

    // Runs on a client authenticated only with the new tenant's key.
    async fn create_application(
        &self,
        slug: &OrganizationSlug,
        scoped_key: ScopedKey,
    ) -> ProvisioningResult<String> {
        let step = ProvisioningStep::CreateApplication;
        let client = self.client(ClientScope::ApiKey(scoped_key.key), step)?;

        let request = ApplicationRequest {
            application: ApplicationDescriptor {
                name: format!("{} App", slug),
                roles: application_roles(),
            },
        };
        let response = client
            .create_application(&request)
            .await
            .map_err(|e| ProvisioningError::from_provider(step, e))?;

        let application_id = response
            .application_id()
            .ok_or(ProvisioningError::EmptyResponse {
                step,
                field: "application id",
            })?
            .to_string();

        tracing::info!(application_id = %application_id, "Application created");
        Ok(application_id)
    }

    async fn register_user(
        &self,
        tenant_id: &str,
        submission: &SignupSubmission,
        application_id: &str,
    ) -> ProvisioningResult<Option<String>> {
        let step = ProvisioningStep::RegisterUser;
        let client = self.client(ClientScope::Tenant(tenant_id.to_string()), step)?;

        let request = RegistrationRequest::new(submission.user_payload(), application_id);
        let response = client
            .register(&request)
            .await
            .map_err(|e| ProvisioningError::from_provider(step, e))?;

        let user_id = response.user_id().map(str::to_string);
        tracing::debug!(email = %submission.email(), "Registration accepted");
        tracing::info!(user_id = ?user_id, "User registered");
        Ok(user_id)
    }

    async fn handle_failure(&self, ledger: &ProvisioningLedger) {
        if ledger.is_empty() {
            return;
        }

        if !self.config.rollback_on_failure {
            tracing::warn!(
                tenant_id = ?ledger.tenant_id,
                api_key_id = ?ledger.api_key_id,
                application_id = ?ledger.application_id,
                "Created resources left in place; manual cleanup required"
            );
            return;
        }

        self.compensate(ledger).await;
    }

    // Best effort: failures are logged, never returned.
    async fn compensate(&self, ledger: &ProvisioningLedger) {
        let client = match self.factory.client_for(ClientScope::Default) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(error = %err, ?ledger, "Rollback skipped: no provider client");
                return;
            }
        };

        if let Some(key_id) = &ledger.api_key_id {
            match client.delete_api_key(key_id).await {
                Ok(()) => tracing::info!(api_key_id = %key_id, "Rolled back scoped API key"),
                Err(err) => tracing::error!(
                    api_key_id = %key_id,
                    error = %err,
                    "Failed to revoke scoped API key during rollback"
                ),
            }
        }

        if let Some(tenant_id) = &ledger.tenant_id {
            match client.delete_tenant(tenant_id).await {
                Ok(()) => tracing::info!(tenant_id = %tenant_id, "Rolled back tenant"),
                Err(err) => tracing::error!(
                    tenant_id = %tenant_id,
                    error = %err,
                    "Failed to delete tenant during rollback"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::mock::{MockScript, ProviderCall, RecordingClientFactory};
    use crate::identity::models::{ApiKey, ApiKeyResponse};

    fn form(organization: Option<&str>) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let Some(org) = organization {
            fields.insert("organization".to_string(), org.to_string());
        }
        fields.insert("email".to_string(), "ada@acme.io".to_string());
        fields.insert("password".to_string(), "correct horse".to_string());
        fields
    }

    fn workflow(factory: &RecordingClientFactory, rollback: bool) -> ProvisioningWorkflow {
        ProvisioningWorkflow::new(
            Arc::new(factory.clone()),
            ProvisioningConfig::new("default-tenant").with_rollback(rollback),
        )
    }

    #[tokio::test]
    async fn test_missing_organization_makes_no_calls() {
        let factory = RecordingClientFactory::succeeding();

        let err = workflow(&factory, false)
            .provision(form(None))
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::Validation(_)));
        assert_eq!(factory.call_count(), 0);
        assert!(factory.scopes_requested().is_empty());
    }

    #[tokio::test]
    async fn test_api_key_bound_to_created_tenant() {
        let factory = RecordingClientFactory::new(MockScript::succeeding().with_tenant_id("t1"));

        workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap();

        let calls = factory.calls();
        match &calls[1] {
            ProviderCall::CreateApiKey { request, .. } => {
                assert_eq!(request.tenant_id(), "t1");
                assert!(request
                    .api_key
                    .meta_data
                    .attributes
                    .description
                    .contains("acme-corp"));
            }
            other => panic!("expected create_api_key, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_tenant_response_stops_before_api_key() {
        let factory = RecordingClientFactory::new(MockScript::succeeding().with_empty_tenant());

        let err = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProvisioningError::EmptyResponse {
                step: ProvisioningStep::CreateTenant,
                field: "tenant id",
            }
        );
        assert_eq!(factory.operations(), vec!["create_tenant"]);
    }

    #[tokio::test]
    async fn test_full_success_redirect_target() {
        let factory = RecordingClientFactory::succeeding();

        let org = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap();

        assert_eq!(org.signin_target, "acme-corp.saasbp.io/signin");
        assert_eq!(org.tenant_id, "tenant-1");
        assert_eq!(org.application_id, "app-1");
        assert_eq!(org.user_id.as_deref(), Some("user-1"));
        assert_eq!(
            factory.operations(),
            vec!["create_tenant", "create_api_key", "create_application", "register"]
        );
    }

    #[tokio::test]
    async fn test_unsanitized_name_is_sanitized_server_side() {
        let factory = RecordingClientFactory::succeeding();

        let org = workflow(&factory, false)
            .provision(form(Some("acme corp")))
            .await
            .unwrap();

        assert_eq!(org.signin_target, "acme-corp.saasbp.io/signin");
        match &factory.calls()[0] {
            ProviderCall::CreateTenant { request, .. } => {
                assert_eq!(request.tenant.name, "acme-corp");
                assert_eq!(request.tenant.issuer, "saasbp.io");
                assert_eq!(request.source_tenant_id, "default-tenant");
            }
            other => panic!("expected create_tenant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_each_step_uses_its_scope() {
        let factory = RecordingClientFactory::new(MockScript::succeeding().with_tenant_id("t1"));

        workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap();

        let scopes: Vec<ClientScope> = factory.calls().iter().map(|c| c.scope().clone()).collect();
        assert_eq!(
            scopes,
            vec![
                ClientScope::Default,
                ClientScope::Default,
                ClientScope::ApiKey("scoped-key-1".to_string()),
                ClientScope::Tenant("t1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_application_has_fixed_roles() {
        for name in ["acme-corp", "Globex", "initech 2"] {
            let factory = RecordingClientFactory::succeeding();
            workflow(&factory, false)
                .provision(form(Some(name)))
                .await
                .unwrap();

            let application = factory
                .calls()
                .into_iter()
                .find_map(|call| match call {
                    ProviderCall::CreateApplication { request, .. } => Some(request.application),
                    _ => None,
                })
                .unwrap();

            assert_eq!(
                application.roles,
                vec![
                    ApplicationRole::new("admin", false),
                    ApplicationRole::new("member", true),
                ]
            );
            assert!(application.name.ends_with(" App"));
        }
    }

    #[tokio::test]
    async fn test_register_payload_carries_form_fields() {
        let factory = RecordingClientFactory::succeeding();
        let mut fields = form(Some("acme-corp"));
        fields.insert("firstName".to_string(), "Ada".to_string());

        workflow(&factory, false).provision(fields).await.unwrap();

        match factory.calls().last().unwrap() {
            ProviderCall::Register { request, .. } => {
                assert_eq!(request.registration.application_id, "app-1");
                assert_eq!(request.user["email"], "ada@acme.io");
                assert_eq!(request.user["firstName"], "Ada");
                assert_eq!(request.user["organization"], "acme-corp");
            }
            other => panic!("expected register, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_failure_is_structured() {
        let factory = RecordingClientFactory::new(
            MockScript::succeeding().fail_register(400, "email already exists"),
        );

        let err = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProvisioningError::Provider {
                step: ProvisioningStep::RegisterUser,
                status: 400,
                message: "email already exists".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_early_step_failures_are_structured() {
        let factory = RecordingClientFactory::new(
            MockScript::succeeding().fail_create_tenant(409, "duplicate tenant name"),
        );
        let err = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(ProvisioningStep::CreateTenant));

        let factory = RecordingClientFactory::new(MockScript::succeeding().with_empty_api_key());
        let err = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::EmptyResponse {
                step: ProvisioningStep::IssueApiKey,
                field: "API key",
            }
        );
        assert_eq!(factory.operations(), vec!["create_tenant", "create_api_key"]);

        let factory =
            RecordingClientFactory::new(MockScript::succeeding().with_empty_application());
        let err = workflow(&factory, false)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(ProvisioningStep::CreateApplication));
        assert_eq!(factory.call_count(), 3);
    }

    #[tokio::test]
    async fn test_no_compensation_by_default() {
        for script in [
            MockScript::succeeding().fail_create_application(500, "boom"),
            MockScript::succeeding().fail_register(400, "email already exists"),
        ] {
            let factory = RecordingClientFactory::new(script);
            let _ = workflow(&factory, false)
                .provision(form(Some("acme-corp")))
                .await
                .unwrap_err();

            let ops = factory.operations();
            assert!(!ops.contains(&"delete_tenant"));
            assert!(!ops.contains(&"delete_api_key"));
        }
    }

    #[tokio::test]
    async fn test_rollback_revokes_key_then_deletes_tenant() {
        let factory = RecordingClientFactory::new(
            MockScript::succeeding().fail_register(400, "email already exists"),
        );

        let err = workflow(&factory, true)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(ProvisioningStep::RegisterUser));
        let calls = factory.calls();
        assert_eq!(
            factory.operations(),
            vec![
                "create_tenant",
                "create_api_key",
                "create_application",
                "register",
                "delete_api_key",
                "delete_tenant",
            ]
        );
        assert_eq!(
            calls[4],
            ProviderCall::DeleteApiKey {
                scope: ClientScope::Default,
                key_id: "key-1".to_string(),
            }
        );
        assert_eq!(
            calls[5],
            ProviderCall::DeleteTenant {
                scope: ClientScope::Default,
                tenant_id: "tenant-1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rollback_after_key_failure_deletes_only_tenant() {
        let factory = RecordingClientFactory::new(
            MockScript::succeeding().fail_create_api_key(500, "key store unavailable"),
        );

        let err = workflow(&factory, true)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProvisioningError::Provider {
                step: ProvisioningStep::IssueApiKey,
                status: 500,
                message: "key store unavailable".to_string(),
            }
        );
        assert_eq!(
            factory.operations(),
            vec!["create_tenant", "create_api_key", "delete_tenant"]
        );
        assert!(!factory.operations().contains(&"delete_api_key"));
    }

    #[tokio::test]
    async fn test_rollback_of_key_without_id_deletes_only_tenant() {
        let mut script = MockScript::succeeding().fail_create_application(500, "boom");
        script.create_api_key = Ok(ApiKeyResponse {
            api_key: Some(ApiKey {
                id: None,
                key: Some("scoped-key-1".to_string()),
                tenant_id: Some("tenant-1".to_string()),
            }),
        });
        let factory = RecordingClientFactory::new(script);

        let err = workflow(&factory, true)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(ProvisioningStep::CreateApplication));
        assert_eq!(
            factory.operations(),
            vec![
                "create_tenant",
                "create_api_key",
                "create_application",
                "delete_tenant"
            ]
        );
        assert_eq!(
            factory.calls()[3],
            ProviderCall::DeleteTenant {
                scope: ClientScope::Default,
                tenant_id: "tenant-1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rollback_skipped_when_nothing_created() {
        let factory = RecordingClientFactory::new(MockScript::succeeding().with_empty_tenant());

        workflow(&factory, true)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(factory.operations(), vec!["create_tenant"]);
    }

    #[tokio::test]
    async fn test_rollback_failure_keeps_original_error() {
        let factory = RecordingClientFactory::new(
            MockScript::succeeding()
                .fail_create_application(403, "forbidden")
                .fail_delete_tenant(500, "cannot delete"),
        );

        let err = workflow(&factory, true)
            .provision(form(Some("acme-corp")))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProvisioningError::Provider {
                step: ProvisioningStep::CreateApplication,
                status: 403,
                message: "forbidden".to_string(),
            }
        );
        assert_eq!(factory.operations().last(), Some(&"delete_tenant"));
    }
}
