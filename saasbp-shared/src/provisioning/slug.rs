/// Organization slug rules
///
/// The sign-up form sanitizes the organization name in the browser; the
/// same rules are applied again here so tenant names and redirect targets
/// never diverge from what the server actually used.
///
/// # Rules
///
/// - leading/trailing whitespace is dropped
/// - each run of inner whitespace becomes a single `-`
/// - any other character outside `[a-zA-Z0-9-]` is removed
/// - hyphens at either end are removed, so the slug is a valid host label
/// - case is preserved
///
/// # Example
///
/// ```
/// use saasbp_shared::provisioning::slug::{sanitize, OrganizationSlug};
///
/// assert_eq!(sanitize("acme corp"), "acme-corp");
/// assert_eq!(sanitize("Acme  Corp!"), "Acme-Corp");
///
/// let slug = OrganizationSlug::parse("acme corp").unwrap();
/// assert_eq!(slug.as_str(), "acme-corp");
/// assert!(OrganizationSlug::parse("!!!").is_none());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Applies the organization slug rules to `raw`
pub fn sanitize(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut in_whitespace = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
            continue;
        }

        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c);
        }
    }

    slug.trim_matches('-').to_string()
}

/// A sanitized, non-empty organization name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationSlug(String);

impl OrganizationSlug {
    /// Sanitizes `raw`; `None` when nothing survives sanitization
    pub fn parse(raw: &str) -> Option<Self> {
        let slug = sanitize(raw);
        if slug.is_empty() {
            None
        } else {
            Some(OrganizationSlug(slug))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sign-in location on the organization's subdomain, without scheme
    pub fn signin_target(&self, base_domain: &str) -> String {
        format!("{}.{}/signin", self.0, base_domain)
    }
}

impl fmt::Display for OrganizationSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrganizationSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
