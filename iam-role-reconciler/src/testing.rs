//! In-memory [`IamProvider`] for tests.
//!
//! Mimics the IAM rules that matter for lifecycle ordering (a role cannot be deleted
//! while it still has profiles or policies; a profile cannot be deleted while it
//! still holds a role) and records every call in issue order.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::aws::{AwsError, AwsResult};
use crate::provider::IamProvider;
use crate::types::{ManagedPolicyReference, PolicyDocument, Role, RoleAttributes};

const READ_OPERATIONS: &[&str] = &[
    "get_role",
    "list_instance_profiles_for_role",
    "list_role_policy_names",
    "get_role_policy_document",
    "list_attached_managed_policies",
];

#[derive(Debug, Default)]
struct RoleState {
    role: Option<Role>,
    inline: BTreeMap<String, PolicyDocument>,
    managed: Vec<ManagedPolicyReference>,
}

#[derive(Debug, Default)]
struct State {
    roles: BTreeMap<String, RoleState>,
    /// profile name -> role names
    profiles: BTreeMap<String, Vec<String>>,
    calls: Vec<String>,
    fail_on: Option<(String, String)>,
}

#[derive(Debug, Default)]
pub struct InMemoryIamProvider {
    state: Mutex<State>,
}

fn role_record(name: &str, trust: Option<PolicyDocument>, path: Option<&str>) -> Role {
    Role {
        name: name.to_string(),
        arn: format!("arn:aws:iam::123456789012:role/{name}"),
        path: path.unwrap_or("/").to_string(),
        assume_role_policy_document: trust,
    }
}

impl InMemoryIamProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_role(self, name: &str) -> Self {
        self.lock().roles.insert(
            name.to_string(),
            RoleState {
                role: Some(role_record(name, None, None)),
                ..RoleState::default()
            },
        );
        self
    }

    pub fn with_instance_profile(self, profile: &str, role: &str) -> Self {
        self.lock()
            .profiles
            .entry(profile.to_string())
            .or_default()
            .push(role.to_string());
        self
    }

    pub fn with_inline_policy(self, role: &str, name: &str, document: Value) -> Self {
        self.lock()
            .roles
            .entry(role.to_string())
            .or_default()
            .inline
            .insert(name.to_string(), PolicyDocument::new(document));
        self
    }

    pub fn with_managed_policy(self, role: &str, arn: &str) -> Self {
        self.lock()
            .roles
            .entry(role.to_string())
            .or_default()
            .managed
            .push(ManagedPolicyReference::new(arn));
        self
    }

    /// Make the next call of `operation` whose subject (policy, profile or role name) is `subject` fail.
    pub fn fail_on(self, operation: &str, subject: &str) -> Self {
        self.lock().fail_on = Some((operation.to_string(), subject.to_string()));
        self
    }

    /// Every call issued so far, formatted as `operation(arg, ...)`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Calls that mutate state, in issue order.
    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|call| {
                let operation = call.split('(').next().unwrap_or_default();
                !READ_OPERATIONS.contains(&operation)
            })
            .cloned()
            .collect()
    }

    pub fn inline_policy_names(&self, role: &str) -> Vec<String> {
        self.lock()
            .roles
            .get(role)
            .map(|state| state.inline.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn inline_policy(&self, role: &str, name: &str) -> Option<PolicyDocument> {
        self.lock()
            .roles
            .get(role)
            .and_then(|state| state.inline.get(name).cloned())
    }

    pub fn managed_policies(&self, role: &str) -> Vec<String> {
        self.lock()
            .roles
            .get(role)
            .map(|state| state.managed.iter().map(|r| r.arn().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn instance_profiles(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().profiles.clone()
    }

    /// Record the call and consume an injected failure if it targets this call.
    fn record(&self, operation: &str, args: &[&str]) -> AwsResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(format!("{operation}({})", args.join(", ")));
        let subject = args.last().copied().unwrap_or_default();
        if state
            .fail_on
            .as_ref()
            .is_some_and(|(op, target)| op == operation && target == subject)
        {
            state.fail_on = None;
            return Err(AwsError::IamError(format!(
                "injected failure for {operation}({subject})"
            )));
        }
        Ok(state)
    }
}

fn no_such_role(name: &str) -> AwsError {
    AwsError::IamError(format!("NoSuchEntity: role {name} not found"))
}

fn existing_role<'a>(state: &'a mut State, name: &str) -> AwsResult<&'a mut RoleState> {
    state
        .roles
        .get_mut(name)
        .filter(|role| role.role.is_some())
        .ok_or_else(|| no_such_role(name))
}

#[async_trait]
impl IamProvider for InMemoryIamProvider {
    async fn create_role(
        &self,
        name: &str,
        trust_document: &PolicyDocument,
        attributes: &RoleAttributes,
    ) -> AwsResult<Role> {
        let mut state = self.record("create_role", &[name])?;
        let entry = state.roles.entry(name.to_string()).or_default();
        if entry.role.is_some() {
            return Err(AwsError::IamError(format!(
                "EntityAlreadyExists: role {name}"
            )));
        }
        let role = role_record(
            name,
            Some(trust_document.clone()),
            attributes.path.as_deref(),
        );
        entry.role = Some(role.clone());
        Ok(role)
    }

    async fn get_role(&self, name: &str) -> AwsResult<Option<Role>> {
        let state = self.record("get_role", &[name])?;
        Ok(state.roles.get(name).and_then(|r| r.role.clone()))
    }

    async fn destroy_role(&self, name: &str) -> AwsResult<()> {
        let mut state = self.record("destroy_role", &[name])?;
        let in_profile = state
            .profiles
            .values()
            .any(|roles| roles.iter().any(|r| r == name));
        let role = existing_role(&mut state, name)?;
        if in_profile || !role.inline.is_empty() || !role.managed.is_empty() {
            return Err(AwsError::IamError(format!(
                "DeleteConflict: role {name} still has attachments"
            )));
        }
        state.roles.remove(name);
        Ok(())
    }

    async fn create_instance_profile(&self, name: &str) -> AwsResult<()> {
        let mut state = self.record("create_instance_profile", &[name])?;
        if state.profiles.contains_key(name) {
            return Err(AwsError::IamError(format!(
                "EntityAlreadyExists: instance profile {name}"
            )));
        }
        state.profiles.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn delete_instance_profile(&self, name: &str) -> AwsResult<()> {
        let mut state = self.record("delete_instance_profile", &[name])?;
        match state.profiles.get(name) {
            None => Err(AwsError::IamError(format!(
                "NoSuchEntity: instance profile {name}"
            ))),
            Some(roles) if !roles.is_empty() => Err(AwsError::IamError(format!(
                "DeleteConflict: instance profile {name} still holds a role"
            ))),
            Some(_) => {
                state.profiles.remove(name);
                Ok(())
            }
        }
    }

    async fn add_role_to_instance_profile(
        &self,
        role_name: &str,
        profile_name: &str,
    ) -> AwsResult<()> {
        let mut state = self.record("add_role_to_instance_profile", &[role_name, profile_name])?;
        existing_role(&mut state, role_name)?;
        let roles = state.profiles.get_mut(profile_name).ok_or_else(|| {
            AwsError::IamError(format!("NoSuchEntity: instance profile {profile_name}"))
        })?;
        roles.push(role_name.to_string());
        Ok(())
    }

    async fn remove_role_from_instance_profile(
        &self,
        role_name: &str,
        profile_name: &str,
    ) -> AwsResult<()> {
        let mut state =
            self.record("remove_role_from_instance_profile", &[role_name, profile_name])?;
        let roles = state.profiles.get_mut(profile_name).ok_or_else(|| {
            AwsError::IamError(format!("NoSuchEntity: instance profile {profile_name}"))
        })?;
        roles.retain(|r| r != role_name);
        Ok(())
    }

    async fn list_instance_profiles_for_role(&self, role_name: &str) -> AwsResult<Vec<String>> {
        let state = self.record("list_instance_profiles_for_role", &[role_name])?;
        Ok(state
            .profiles
            .iter()
            .filter(|(_, roles)| roles.iter().any(|r| r == role_name))
            .map(|(profile, _)| profile.clone())
            .collect())
    }

    async fn list_role_policy_names(&self, role_name: &str) -> AwsResult<Vec<String>> {
        let mut state = self.record("list_role_policy_names", &[role_name])?;
        Ok(existing_role(&mut state, role_name)?
            .inline
            .keys()
            .cloned()
            .collect())
    }

    async fn get_role_policy_document(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> AwsResult<PolicyDocument> {
        let mut state = self.record("get_role_policy_document", &[role_name, policy_name])?;
        existing_role(&mut state, role_name)?
            .inline
            .get(policy_name)
            .cloned()
            .ok_or_else(|| AwsError::IamError(format!("NoSuchEntity: policy {policy_name}")))
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> AwsResult<()> {
        let mut state = self.record("put_role_policy", &[role_name, policy_name])?;
        existing_role(&mut state, role_name)?
            .inline
            .insert(policy_name.to_string(), document.clone());
        Ok(())
    }

    async fn delete_role_policy(&self, role_name: &str, policy_name: &str) -> AwsResult<()> {
        let mut state = self.record("delete_role_policy", &[role_name, policy_name])?;
        existing_role(&mut state, role_name)?
            .inline
            .remove(policy_name)
            .map(|_| ())
            .ok_or_else(|| AwsError::IamError(format!("NoSuchEntity: policy {policy_name}")))
    }

    async fn attach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()> {
        let mut state = self.record("attach_managed_policy", &[role_name, reference.arn()])?;
        let role = existing_role(&mut state, role_name)?;
        if !role.managed.contains(reference) {
            role.managed.push(reference.clone());
        }
        Ok(())
    }

    async fn list_attached_managed_policies(
        &self,
        role_name: &str,
    ) -> AwsResult<Vec<ManagedPolicyReference>> {
        let mut state = self.record("list_attached_managed_policies", &[role_name])?;
        Ok(existing_role(&mut state, role_name)?.managed.clone())
    }

    async fn detach_managed_policy(
        &self,
        role_name: &str,
        reference: &ManagedPolicyReference,
    ) -> AwsResult<()> {
        let mut state = self.record("detach_managed_policy", &[role_name, reference.arn()])?;
        existing_role(&mut state, role_name)?
            .managed
            .retain(|r| r != reference);
        Ok(())
    }
}
