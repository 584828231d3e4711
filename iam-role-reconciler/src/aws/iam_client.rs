//! AWS IAM client wrapper implementing [`IamProvider`]

use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;

use crate::aws::{AwsError, AwsResult};
use crate::provider::IamProvider;
use crate::types::{ManagedPolicyReference, PolicyDocument, Role, RoleAttributes};

pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }
}

/// Decode and parse a policy document as returned by IAM (URL-encoded JSON)
fn decode_policy_document(encoded: &str) -> AwsResult<PolicyDocument> {
    let decoded = percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|e| AwsError::PolicyError(format!("Failed to URL decode policy document: {e}")))?;

    PolicyDocument::parse(&decoded)
        .map_err(|e| AwsError::PolicyError(format!("Failed to parse policy document JSON: {e}")))
}

fn convert_role(role: &aws_sdk_iam::types::Role) -> AwsResult<Role> {
    let assume_role_policy_document = role
        .assume_role_policy_document()
        .map(decode_policy_document)
        .transpose()?;
    Ok(Role {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
        path: role.path().to_string(),
        assume_role_policy_document,
    })
}

#[async_trait]
impl IamProvider for AwsIamClient {
    async fn create_role(
        &self,
        name: &str,
        trust_document: &PolicyDocument,
        attributes: &RoleAttributes,
    ) -> AwsResult<Role> {
        let response = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_document.to_json_string())
            .set_path(attributes.path.clone())
            .set_description(attributes.description.clone())
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to create role '{name}': {e}")))?;

        let role = response
            .role()
            .ok_or_else(|| AwsError::IamError(format!("CreateRole returned no role for '{name}'")))?;
        convert_role(role)
    }

    async fn get_role(&self, name: &str) -> AwsResult<Option<Role>> {
        match self.client.get_role().role_name(name).send().await {
            Ok(response) => response.role().map(convert_role).transpose(),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|service| service.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(AwsError::IamError(format!(
                "Failed to get role '{name}': {e}"
            ))),
        }
    }

    async fn destroy_role(&self, name: &str) -> AwsResult<()> {
        self.client
            .delete_role()
            .role_name(name)
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to delete role '{name}': {e}")))?;
        Ok(())
    }

    async fn create_instance_profile(&self, name: &str) -> AwsResult<()> {
        self.client
            .create_instance_profile()
            .instance_profile_name(name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!("Failed to create instance profile '{name}': {e}"))
            })?;
        Ok(())
    }

    async fn delete_instance_profile(&self, name: &str) -> AwsResult<()> {
        self.client
            .delete_instance_profile()
            .instance_profile_name(name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!("Failed to delete instance profile '{name}': {e}"))
            })?;
        Ok(())
    }

    async fn add_role_to_instance_profile(
        &self,
        role_name: &str,
        profile_name: &str,
    ) -> AwsResult<()> {
        self.client
            .add_role_to_instance_profile()
            .role_name(role_name)
            .instance_profile_name(profile_name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to add role '{role_name}' to instance profile '{profile_name}': {e}"
                ))
            })?;
        Ok(())
    }

    async fn remove_role_from_instance_profile(
        &self,
        role_name: &str,
        profile_name: &str,
    ) -> AwsResult<()> {
        self.client
            .remove_role_from_instance_profile()
            .role_name(role_name)
            .instance_profile_name(profile_name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to remove role '{role_name}' from instance profile '{profile_name}': {e}"
                ))
            })?;
        Ok(())
    }

    async fn list_instance_profiles_for_role(&self, role_name: &str) -> AwsResult<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let response = self
                .client
                .list_instance_profiles_for_role()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!("Failed to list instance profiles: {e}"))
                })?;
            names.extend(
                response
                    .instance_profiles()
                    .iter()
                    .map(|profile| profile.instance_profile_name().to_string()),
            );
            match response.marker() {
                Some(next) if response.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn list_role_policy_names(&self, role_name: &str) -> AwsResult<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let response = self
                .client
                .list_role_policies()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| AwsError::IamError(format!("Failed to list role policies: {e}")))?;
            names.extend(response.policy_names().iter().cloned());
            match response.marker() {
                Some(next) if response.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn get_role_policy_document(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> AwsResult<PolicyDocument> {
        let response = self
            .client
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| AwsError::IamError(format!("Failed to get role policy: {e}")))?;

        decode_policy_document(response.policy_document())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> AwsResult<()> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(document.to_json_string())
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to put role policy '{policy_name}' on role '{role_name}': {e:?}"
                ))
            })?;
        Ok(())
    }

    async fn delete_role_policy(&self, role_name: &str, policy_name: &str) -> AwsResult<()> {
        self.client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to delete role policy '{policy_name}' on role '{role_name}': {e}"
                ))
            })?;
        Ok(())
    }

    async fn attach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(reference.arn())
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to attach policy '{reference}' to role '{role_name}': {e}"
                ))
            })?;
        Ok(())
    }

    async fn list_attached_managed_policies(
        &self,
        role_name: &str,
    ) -> AwsResult<Vec<ManagedPolicyReference>> {
        let mut references = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let response = self
                .client
                .list_attached_role_policies()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!("Failed to list attached role policies: {e}"))
                })?;
            references.extend(
                response
                    .attached_policies()
                    .iter()
                    .filter_map(|policy| policy.policy_arn())
                    .map(ManagedPolicyReference::new),
            );
            match response.marker() {
                Some(next) if response.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(references)
    }

    async fn detach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(reference.arn())
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to detach policy '{reference}' from role '{role_name}': {e}"
                ))
            })?;
        Ok(())
    }
}
