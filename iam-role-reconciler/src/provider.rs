//! Interface to the remote identity-and-access management authority.
//!
//! Reconciliation is not transactional. Callers read current state, diff it and
//! then write, awaiting each call before issuing the next; nothing isolates that
//! sequence from another writer mutating the same role in between. Exclusive
//! ownership of the role during a run is assumed. No call is retried and no
//! deadline is imposed here.

use async_trait::async_trait;

use crate::aws::AwsResult;
use crate::types::{ManagedPolicyReference, PolicyDocument, Role, RoleAttributes};

#[async_trait]
pub trait IamProvider: Send + Sync {
    async fn create_role(
        &self,
        name: &str,
        trust_document: &PolicyDocument,
        attributes: &RoleAttributes,
    ) -> AwsResult<Role>;

    /// `Ok(None)` when the role does not exist.
    async fn get_role(&self, name: &str) -> AwsResult<Option<Role>>;

    async fn destroy_role(&self, name: &str) -> AwsResult<()>;

    async fn create_instance_profile(&self, name: &str) -> AwsResult<()>;

    async fn delete_instance_profile(&self, name: &str) -> AwsResult<()>;

    async fn add_role_to_instance_profile(&self, role_name: &str, profile_name: &str)
        -> AwsResult<()>;

    async fn remove_role_from_instance_profile(
        &self,
        role_name: &str,
        profile_name: &str,
    ) -> AwsResult<()>;

    async fn list_instance_profiles_for_role(&self, role_name: &str) -> AwsResult<Vec<String>>;

    async fn list_role_policy_names(&self, role_name: &str) -> AwsResult<Vec<String>>;

    /// Fetch an inline policy document, already parsed.
    async fn get_role_policy_document(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> AwsResult<PolicyDocument>;

    /// Create or overwrite an inline policy.
    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> AwsResult<()>;

    async fn delete_role_policy(&self, role_name: &str, policy_name: &str) -> AwsResult<()>;

    async fn attach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()>;

    async fn list_attached_managed_policies(
        &self,
        role_name: &str,
    ) -> AwsResult<Vec<ManagedPolicyReference>>;

    async fn detach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()>;
}
