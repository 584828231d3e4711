//! Desired vs. current policy set diffing

use log::debug;

use super::compare::policies_equal;
use crate::types::{CurrentPolicySet, DesiredPolicy, DesiredPolicySet, PolicyDiff};

/// Compute the actions that converge `current` to `desired`.
///
/// - Every managed reference is attached unconditionally; attachment state is never compared.
/// - A desired inline policy whose document matches the current one of the same name needs no write.
/// - A desired inline policy that is new or differs is put (an idempotent overwrite).
/// - A current inline policy whose name is not declared at all is deleted.
///
/// Inline names are assumed unique on both sides; declared duplicates are rejected
/// during configuration validation.
pub fn diff_policy_sets(desired: &DesiredPolicySet, current: &CurrentPolicySet) -> PolicyDiff {
    let mut to_put = Vec::new();
    let mut to_attach = Vec::new();
    for entry in &desired.entries {
        match entry {
            DesiredPolicy::Managed(reference) => {
                debug!("Managed policy {reference} will be attached");
                to_attach.push(reference.clone());
            }
            DesiredPolicy::Inline(policy) => to_put.push(policy.clone()),
        }
    }

    let mut remaining_current = current.inline.clone();
    for wanted in desired.inline() {
        let Some(index) = remaining_current.iter().position(|c| c.name == wanted.name) else {
            debug!("Inline policy {} is new", wanted.name);
            continue;
        };

        // The name is accounted for either way: unchanged or overwritten by the put.
        let existing = remaining_current.remove(index);
        if policies_equal(&wanted.document, &existing.document) {
            debug!("Inline policy {} is a match", wanted.name);
            to_put.retain(|p| p.name != wanted.name);
        } else {
            debug!("Inline policy {} is different", wanted.name);
            debug!("new policy is '{}'", wanted.document.to_json_string());
            debug!("current policy is '{}'", existing.document.to_json_string());
        }
    }

    for stale in &remaining_current {
        debug!("Inline policy {} is not declared", stale.name);
    }

    PolicyDiff {
        to_delete: remaining_current,
        to_put,
        to_attach,
    }
}
