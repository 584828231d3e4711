//! Dry-run planning for IAM Role Reconciler

use crate::config::RoleConfig;
use crate::error::RoleReconcilerResult;
use crate::provider::IamProvider;
use crate::reconcile::diff_policy_sets;
use crate::types::{CurrentPolicySet, PolicyDiff};

impl<P: IamProvider> super::service::RoleService<P> {
    /// Compute the actions `create` would take for this configuration, without writing.
    ///
    /// A role that does not exist yet is planned against an empty policy set.
    pub async fn plan(&self, config: &RoleConfig) -> RoleReconcilerResult<PolicyDiff> {
        let validated = config.validate()?;
        let current = if self.read(&validated.role_name).await?.is_some() {
            self.read_current_policies(&validated.role_name).await?
        } else {
            CurrentPolicySet::default()
        };
        Ok(diff_policy_sets(&validated.policies, &current))
    }
}
