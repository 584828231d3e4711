//! Error taxonomy for configuration and provider failures.

use crate::aws::AwsError;
use thiserror::Error;

/// Errors surfaced by role lifecycle and reconciliation operations.
#[derive(Debug, Error)]
pub enum RoleReconcilerError {
    /// Declared configuration is incomplete or malformed. Raised before any provider call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote IAM call failed. Remaining steps of the run are abandoned.
    #[error("IAM provider error on role '{role}'{}: {source}", describe_policy(.policy))]
    Provider {
        role: String,
        policy: Option<String>,
        #[source]
        source: AwsError,
    },
}

fn describe_policy(policy: &Option<String>) -> String {
    policy
        .as_ref()
        .map(|name| format!(" (policy '{name}')"))
        .unwrap_or_default()
}

impl RoleReconcilerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Provider failure not tied to a particular policy.
    pub fn provider(role: impl Into<String>, source: AwsError) -> Self {
        Self::Provider {
            role: role.into(),
            policy: None,
            source,
        }
    }

    pub fn policy_provider(
        role: impl Into<String>,
        policy: impl Into<String>,
        source: AwsError,
    ) -> Self {
        Self::Provider {
            role: role.into(),
            policy: Some(policy.into()),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type RoleReconcilerResult<T> = Result<T, RoleReconcilerError>;
