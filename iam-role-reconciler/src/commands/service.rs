//! Role reconciler service layer
//!
//! This module provides the main service interface that encapsulates all business logic
//! for role lifecycle and policy reconciliation. The service owns an [`IamProvider`] and
//! exposes high-level operations (create, read, delete, plan, reconcile) for adapters
//! such as the CLI.

use crate::aws::iam_client::AwsIamClient;
use crate::error::RoleReconcilerResult;
use crate::provider::IamProvider;
use aws_sdk_iam::Client as IamClient;

/// Main service struct that holds the IAM provider and provides business logic operations
pub struct RoleService<P: IamProvider> {
    pub(crate) provider: P,
}

impl RoleService<AwsIamClient> {
    /// Create a new service instance backed by the AWS IAM API
    ///
    /// The configuration is loaded using the default credential provider chain,
    /// with optional region and named profile overrides.
    pub async fn from_env(
        region: Option<String>,
        profile: Option<String>,
    ) -> RoleReconcilerResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        Ok(Self::with_provider(AwsIamClient::new(IamClient::new(&config))))
    }
}

impl<P: IamProvider> RoleService<P> {
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // create(), read() and delete() are in lifecycle.rs
    // reconcile() is in reconcile.rs, plan() in plan.rs
}
