use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured permission document (trust or permission policy).
///
/// Equality is structural: object key order in the serialized form is irrelevant,
/// array order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(Value);

impl PolicyDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a serialized JSON document.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON form sent to the provider.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

/// Reference to an externally owned and versioned policy (ARN).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedPolicyReference(String);

impl ManagedPolicyReference {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn arn(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ManagedPolicyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Policy document stored directly under a role, keyed by name within that role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlinePolicy {
    pub name: String,
    pub document: PolicyDocument,
}

impl InlinePolicy {
    pub fn new(name: impl Into<String>, document: PolicyDocument) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

/// One entry of the declared policy list, with its document already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredPolicy {
    Managed(ManagedPolicyReference),
    Inline(InlinePolicy),
}

/// Declared policies for a role. Rebuilt on every run, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredPolicySet {
    pub entries: Vec<DesiredPolicy>,
}

impl DesiredPolicySet {
    pub fn new(entries: Vec<DesiredPolicy>) -> Self {
        Self { entries }
    }

    pub fn inline(&self) -> impl Iterator<Item = &InlinePolicy> {
        self.entries.iter().filter_map(|entry| match entry {
            DesiredPolicy::Inline(policy) => Some(policy),
            DesiredPolicy::Managed(_) => None,
        })
    }

    pub fn managed(&self) -> impl Iterator<Item = &ManagedPolicyReference> {
        self.entries.iter().filter_map(|entry| match entry {
            DesiredPolicy::Managed(reference) => Some(reference),
            DesiredPolicy::Inline(_) => None,
        })
    }
}

/// Snapshot of the inline policies on a role, read at the start of a run.
///
/// The snapshot is not isolated from other writers: it may already be stale
/// when the resulting writes are issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentPolicySet {
    pub inline: Vec<InlinePolicy>,
}

/// Actions needed to converge a role's policies, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDiff {
    pub to_delete: Vec<InlinePolicy>,
    pub to_put: Vec<InlinePolicy>,
    /// Always every declared managed reference; attachment state is not read back.
    pub to_attach: Vec<ManagedPolicyReference>,
}

impl PolicyDiff {
    /// True when no inline policy needs writing. Managed attachments are re-issued regardless.
    pub fn is_converged(&self) -> bool {
        self.to_delete.is_empty() && self.to_put.is_empty()
    }
}

/// Optional attributes forwarded to role creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAttributes {
    pub path: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub arn: String,
    pub path: String,
    pub assume_role_policy_document: Option<PolicyDocument>,
}

/// Outcome of a create/reconcile run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub role_name: String,
    pub role_created: bool,
    pub deleted: Vec<String>,
    pub put: Vec<String>,
    pub attached: Vec<String>,
}

impl ReconcileReport {
    pub fn from_diff(role_name: &str, diff: &PolicyDiff) -> Self {
        Self {
            role_name: role_name.to_string(),
            role_created: false,
            deleted: diff.to_delete.iter().map(|p| p.name.clone()).collect(),
            put: diff.to_put.iter().map(|p| p.name.clone()).collect(),
            attached: diff.to_attach.iter().map(|r| r.arn().to_string()).collect(),
        }
    }
}
