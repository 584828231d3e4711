//! Declared role configuration.
//!
//! The configuration is a JSON document:
//!
//! ```json
//! {
//!   "rolename": "web-server",
//!   "assumeRolePolicyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[...]}",
//!   "policies": [
//!     { "arn": "arn:aws:iam::aws:policy/ReadOnlyAccess" },
//!     { "policyName": "s3-read", "policyDocument": "{...}" }
//!   ]
//! }
//! ```
//!
//! Documents may be given either serialized (as a JSON string) or as a nested object.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RoleReconcilerError, RoleReconcilerResult};
use crate::types::{
    DesiredPolicy, DesiredPolicySet, InlinePolicy, ManagedPolicyReference, PolicyDocument,
    RoleAttributes,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    #[serde(default)]
    pub rolename: Option<String>,
    #[serde(default)]
    pub assume_role_policy_document: Option<Value>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub policies: Vec<PolicyDeclaration>,
}

/// One declared policy: a managed reference or a named inline document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyDeclaration {
    Managed {
        arn: String,
    },
    Inline {
        #[serde(rename = "policyName")]
        policy_name: String,
        #[serde(rename = "policyDocument")]
        policy_document: Value,
    },
}

/// Configuration that passed validation, with every document parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRoleConfig {
    pub role_name: String,
    pub trust_document: PolicyDocument,
    pub attributes: RoleAttributes,
    pub policies: DesiredPolicySet,
}

impl RoleConfig {
    pub fn from_json_str(json: &str) -> RoleReconcilerResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            RoleReconcilerError::configuration(format!("Invalid role configuration: {e}"))
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> RoleReconcilerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RoleReconcilerError::configuration(format!(
                "Failed to read configuration file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Check required fields and parse every document.
    ///
    /// Fails on a missing or whitespace-padded `rolename`, a missing
    /// `assumeRolePolicyDocument`, any document that is not a JSON object, and on
    /// inline policy names that are blank or declared more than once.
    pub fn validate(&self) -> RoleReconcilerResult<ValidatedRoleConfig> {
        let role_name = match self.rolename.as_deref() {
            None | Some("") => {
                return Err(RoleReconcilerError::configuration(
                    "Missing required option 'rolename'",
                ))
            }
            Some(name) if name.trim() != name => {
                return Err(RoleReconcilerError::configuration(format!(
                    "Option 'rolename' has surrounding whitespace: '{name}'"
                )))
            }
            Some(name) => name.to_string(),
        };

        let trust_source = self.assume_role_policy_document.as_ref().ok_or_else(|| {
            RoleReconcilerError::configuration(format!(
                "Missing required option 'assumeRolePolicyDocument' for role '{role_name}'"
            ))
        })?;
        let trust_document = parse_document(trust_source).map_err(|e| {
            RoleReconcilerError::configuration(format!(
                "Malformed assumeRolePolicyDocument for role '{role_name}': {e}"
            ))
        })?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.policies.len());
        for declaration in &self.policies {
            match declaration {
                PolicyDeclaration::Managed { arn } => {
                    if arn.trim().is_empty() {
                        return Err(RoleReconcilerError::configuration(format!(
                            "Empty managed policy arn for role '{role_name}'"
                        )));
                    }
                    entries.push(DesiredPolicy::Managed(ManagedPolicyReference::new(arn)));
                }
                PolicyDeclaration::Inline {
                    policy_name,
                    policy_document,
                } => {
                    if policy_name.trim().is_empty() {
                        return Err(RoleReconcilerError::configuration(format!(
                            "Empty inline policyName for role '{role_name}'"
                        )));
                    }
                    if !seen.insert(policy_name.as_str()) {
                        return Err(RoleReconcilerError::configuration(format!(
                            "Inline policy '{policy_name}' is declared more than once for role '{role_name}'"
                        )));
                    }
                    let document = parse_document(policy_document).map_err(|e| {
                        RoleReconcilerError::configuration(format!(
                            "Malformed policyDocument for policy '{policy_name}' on role '{role_name}': {e}"
                        ))
                    })?;
                    entries.push(DesiredPolicy::Inline(InlinePolicy::new(
                        policy_name.clone(),
                        document,
                    )));
                }
            }
        }

        Ok(ValidatedRoleConfig {
            role_name,
            trust_document,
            attributes: RoleAttributes {
                path: self.path.clone(),
                description: self.description.clone(),
            },
            policies: DesiredPolicySet::new(entries),
        })
    }
}

/// Serialized documents are parsed; nested objects are taken as-is.
/// Either way the document must be a JSON object.
fn parse_document(source: &Value) -> Result<PolicyDocument, String> {
    let document = match source {
        Value::String(serialized) => {
            PolicyDocument::parse(serialized).map_err(|e| e.to_string())?
        }
        other => PolicyDocument::new(other.clone()),
    };
    match document.as_value() {
        Value::Object(_) => Ok(document),
        other => Err(format!(
            "expected a JSON object or serialized document, got {other}"
        )),
    }
}
