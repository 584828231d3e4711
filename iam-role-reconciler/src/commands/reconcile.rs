//! Policy reconciliation for an existing role

use log::info;

use crate::error::{RoleReconcilerError, RoleReconcilerResult};
use crate::provider::IamProvider;
use crate::reconcile::diff_policy_sets;
use crate::types::{CurrentPolicySet, DesiredPolicySet, InlinePolicy, PolicyDiff, ReconcileReport};

impl<P: IamProvider> super::service::RoleService<P> {
    /// Converge the role's policies to `desired`.
    ///
    /// Reads the current inline policies, diffs them, then deletes, puts and attaches
    /// in that order, one call at a time. The first failing call aborts the run and
    /// earlier writes are kept; running again completes convergence.
    pub async fn reconcile(
        &self,
        role_name: &str,
        desired: &DesiredPolicySet,
    ) -> RoleReconcilerResult<ReconcileReport> {
        let current = self.read_current_policies(role_name).await?;
        let diff = diff_policy_sets(desired, &current);
        self.apply_diff(role_name, &diff).await?;
        Ok(ReconcileReport::from_diff(role_name, &diff))
    }

    pub(crate) async fn read_current_policies(
        &self,
        role_name: &str,
    ) -> RoleReconcilerResult<CurrentPolicySet> {
        let names = self
            .provider
            .list_role_policy_names(role_name)
            .await
            .map_err(|e| RoleReconcilerError::provider(role_name, e))?;

        let mut inline = Vec::with_capacity(names.len());
        for name in names {
            let document = self
                .provider
                .get_role_policy_document(role_name, &name)
                .await
                .map_err(|e| RoleReconcilerError::policy_provider(role_name, &name, e))?;
            inline.push(InlinePolicy::new(name, document));
        }
        Ok(CurrentPolicySet { inline })
    }

    async fn apply_diff(&self, role_name: &str, diff: &PolicyDiff) -> RoleReconcilerResult<()> {
        // Deleting before putting keeps a renamed policy from granting old and new at once.
        for policy in &diff.to_delete {
            info!("For role {role_name} removing policy {}", policy.name);
            self.provider
                .delete_role_policy(role_name, &policy.name)
                .await
                .map_err(|e| RoleReconcilerError::policy_provider(role_name, &policy.name, e))?;
        }

        for policy in &diff.to_put {
            info!("For role {role_name} adding/updating policy {}", policy.name);
            self.provider
                .put_role_policy(role_name, &policy.name, &policy.document)
                .await
                .map_err(|e| RoleReconcilerError::policy_provider(role_name, &policy.name, e))?;
        }

        for reference in &diff.to_attach {
            info!("For role {role_name} attaching policy {reference}");
            self.provider
                .attach_managed_policy(role_name, reference)
                .await
                .map_err(|e| {
                    RoleReconcilerError::policy_provider(role_name, reference.arn(), e)
                })?;
        }

        Ok(())
    }
}
