//! Role lifecycle: create, read and delete

use log::{debug, info, warn};

use crate::config::RoleConfig;
use crate::error::{RoleReconcilerError, RoleReconcilerResult};
use crate::provider::IamProvider;
use crate::types::{ReconcileReport, Role};

impl<P: IamProvider> super::service::RoleService<P> {
    /// Ensure the role and its same-named instance profile exist, then reconcile its policies.
    ///
    /// Configuration is validated before any provider call. An existing role is
    /// never recreated; only its policies are converged.
    pub async fn create(&self, config: &RoleConfig) -> RoleReconcilerResult<ReconcileReport> {
        let validated = config.validate()?;
        let role_name = validated.role_name.as_str();

        let role_created = if self.read(role_name).await?.is_none() {
            info!("Creating new IAM role for {role_name}");
            let role = self
                .provider
                .create_role(role_name, &validated.trust_document, &validated.attributes)
                .await
                .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
            debug!("Created role {role:?}");

            self.provider
                .create_instance_profile(role_name)
                .await
                .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
            self.provider
                .add_role_to_instance_profile(role_name, role_name)
                .await
                .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
            true
        } else {
            false
        };

        let mut report = self.reconcile(role_name, &validated.policies).await?;
        report.role_created = role_created;
        Ok(report)
    }

    /// Current role state, or `None` when the role does not exist.
    pub async fn read(&self, role_name: &str) -> RoleReconcilerResult<Option<Role>> {
        self.provider
            .get_role(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))
    }

    /// Tear down the role: instance profiles, inline policies, managed attachments, then the role.
    ///
    /// Returns `false` without touching anything when the role does not exist.
    pub async fn delete(&self, role_name: &str) -> RoleReconcilerResult<bool> {
        if self.read(role_name).await?.is_none() {
            warn!("IAM role {role_name} does not exist, nothing to delete");
            return Ok(false);
        }

        info!("Deleting IAM role for {role_name}");

        let profiles = self
            .provider
            .list_instance_profiles_for_role(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
        for profile in &profiles {
            info!("For role {role_name} removing instance profile {profile}");
            self.provider
                .remove_role_from_instance_profile(role_name, profile)
                .await
                .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
            self.provider
                .delete_instance_profile(profile)
                .await
                .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
        }

        let policy_names = self
            .provider
            .list_role_policy_names(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
        for policy_name in &policy_names {
            info!("For role {role_name} removing policy {policy_name}");
            self.provider
                .delete_role_policy(role_name, policy_name)
                .await
                .map_err(|e| RoleReconcilerError::policy_provider(role_name, policy_name, e))?;
        }

        // IAM refuses to delete a role that still has managed policies attached.
        let attached = self
            .provider
            .list_attached_managed_policies(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
        for reference in &attached {
            info!("For role {role_name} detaching policy {reference}");
            self.provider
                .detach_managed_policy(role_name, reference)
                .await
                .map_err(|e| {
                    RoleReconcilerError::policy_provider(role_name, reference.arn(), e)
                })?;
        }

        self.provider
            .destroy_role(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))?;
        Ok(true)
    }
}
