//! This crate provides the core business logic for the IAM role reconciler:
//! - Declared role configuration and its validation
//! - Structural comparison and diffing of inline/managed policy sets
//! - Sequential reconciliation and role lifecycle (create, read, delete) over an IAM provider
//!

mod aws;
pub mod commands;
mod config;
mod error;
pub mod provider;
pub mod reconcile;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod types;

// Re-exports for a small, focused public API
pub use aws::iam_client::AwsIamClient;
pub use aws::{AwsError, AwsResult};
pub use commands::RoleService;
pub use config::{PolicyDeclaration, RoleConfig, ValidatedRoleConfig};
pub use error::{RoleReconcilerError, RoleReconcilerResult};
pub use provider::IamProvider;
pub use reconcile::{diff_policy_sets, policies_equal};
pub use types::{
    CurrentPolicySet, DesiredPolicy, DesiredPolicySet, InlinePolicy, ManagedPolicyReference,
    PolicyDiff, PolicyDocument, ReconcileReport, Role, RoleAttributes,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validating_sample_config() {
        let json = r#"{
            "rolename": "web-server",
            "assumeRolePolicyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[]}",
            "policies": [
                { "arn": "arn:aws:iam::aws:policy/ReadOnlyAccess" },
                { "policyName": "s3-read", "policyDocument": "{\"Version\":\"2012-10-17\"}" }
            ]
        }"#;
        let validated = RoleConfig::from_json_str(json)
            .and_then(|config| config.validate())
            .expect("should validate");
        assert_eq!(validated.role_name, "web-server");
        assert_eq!(validated.policies.inline().count(), 1);
        assert_eq!(validated.policies.managed().count(), 1);
    }
}
