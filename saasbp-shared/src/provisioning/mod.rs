/// Organization provisioning
///
/// Turns a sign-up form submission into a tenant, a tenant-scoped API key,
/// an application and a registered user on the identity provider.
///
/// # Modules
///
/// - [`slug`]: organization name sanitization
/// - [`submission`]: form validation
/// - [`workflow`]: the four-step provider sequence
/// - [`error`]: structured failures shared by every step

pub mod error;
pub mod slug;
pub mod submission;
pub mod workflow;

pub use error::{FieldError, ProvisioningError, ProvisioningResult, ProvisioningStep};
pub use slug::OrganizationSlug;
pub use submission::SignupSubmission;
pub use workflow::{
    application_roles, ProvisionedOrganization, ProvisioningConfig, ProvisioningLedger,
    ProvisioningWorkflow, ADMIN_ROLE, MEMBER_ROLE,
};
