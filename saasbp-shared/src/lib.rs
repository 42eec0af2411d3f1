//! # SaaSBP Shared Library
//!
//! Identity-provider plumbing and the organization provisioning workflow,
//! shared by the SaaSBP API server and its tests.
//!
//! ## Module Organization
//!
//! - `identity`: provider capability trait, HTTP client, client factory, test double
//! - `provisioning`: sign-up validation and the provisioning workflow

pub mod identity;
pub mod provisioning;

/// Current version of the SaaSBP shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
