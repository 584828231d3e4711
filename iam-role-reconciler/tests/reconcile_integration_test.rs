//! End-to-end lifecycle runs against the in-memory provider.

use iam_role_reconciler::testing::InMemoryIamProvider;
use iam_role_reconciler::{RoleConfig, RoleReconcilerError, RoleService};
use serde_json::json;

const TRUST: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"ec2.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

fn role_config(policies: serde_json::Value) -> RoleConfig {
    RoleConfig::from_json_str(
        &json!({
            "rolename": "build-agent",
            "assumeRolePolicyDocument": TRUST,
            "path": "/ci/",
            "policies": policies,
        })
        .to_string(),
    )
    .expect("valid configuration")
}

#[tokio::test]
async fn create_is_idempotent_across_runs() {
    let service = RoleService::with_provider(InMemoryIamProvider::new());
    let config = role_config(json!([
        { "policyName": "artifacts", "policyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[{\"Effect\":\"Allow\",\"Action\":\"s3:GetObject\",\"Resource\":\"*\"}]}" },
        { "arn": "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore" }
    ]));

    let first = service.create(&config).await.unwrap();
    assert!(first.role_created);
    assert_eq!(first.put, vec!["artifacts"]);

    let second = service.create(&config).await.unwrap();
    assert!(!second.role_created);
    assert!(second.put.is_empty());
    assert!(second.deleted.is_empty());
    // Managed references are re-attached on every run.
    assert_eq!(
        second.attached,
        vec!["arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore"]
    );

    let role = service.read("build-agent").await.unwrap().unwrap();
    assert_eq!(role.path, "/ci/");
    assert_eq!(
        service.provider().managed_policies("build-agent"),
        vec!["arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore"]
    );
}

#[tokio::test]
async fn rename_replaces_policy() {
    let service = RoleService::with_provider(InMemoryIamProvider::new());
    service
        .create(&role_config(json!([{ "policyName": "old", "policyDocument": "{}" }])))
        .await
        .unwrap();

    let report = service
        .create(&role_config(json!([{ "policyName": "new", "policyDocument": "{}" }])))
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["old"]);
    assert_eq!(report.put, vec!["new"]);
    assert_eq!(
        service.provider().inline_policy_names("build-agent"),
        vec!["new"]
    );
}

#[tokio::test]
async fn updated_document_is_overwritten() {
    let service = RoleService::with_provider(InMemoryIamProvider::new());
    service
        .create(&role_config(json!([{ "policyName": "p", "policyDocument": "{\"V\":1}" }])))
        .await
        .unwrap();
    service
        .create(&role_config(json!([{ "policyName": "p", "policyDocument": "{\"V\":2}" }])))
        .await
        .unwrap();

    let document = service
        .provider()
        .inline_policy("build-agent", "p")
        .unwrap();
    assert_eq!(document.as_value(), &json!({"V": 2}));
}

#[tokio::test]
async fn interrupted_run_converges_on_retry() {
    let provider = InMemoryIamProvider::new()
        .with_role("build-agent")
        .with_inline_policy("build-agent", "legacy", json!({}))
        .fail_on("put_role_policy", "b");
    let service = RoleService::with_provider(provider);
    let config = role_config(json!([
        { "policyName": "a", "policyDocument": "{}" },
        { "policyName": "b", "policyDocument": "{}" }
    ]));

    let err = service.create(&config).await.unwrap_err();
    assert!(matches!(err, RoleReconcilerError::Provider { .. }));
    // Partially reconciled: legacy gone, a applied, b missing.
    assert_eq!(
        service.provider().inline_policy_names("build-agent"),
        vec!["a"]
    );

    let retry = service.create(&config).await.unwrap();
    assert_eq!(retry.put, vec!["b"]);
    assert!(retry.deleted.is_empty());
    assert_eq!(
        service.provider().inline_policy_names("build-agent"),
        vec!["a", "b"]
    );
}

#[tokio::test]
async fn create_then_delete_leaves_nothing_behind() {
    let service = RoleService::with_provider(InMemoryIamProvider::new());
    service
        .create(&role_config(json!([
            { "policyName": "p", "policyDocument": "{}" },
            { "arn": "arn:aws:iam::aws:policy/ReadOnlyAccess" }
        ])))
        .await
        .unwrap();
    assert_eq!(service.provider().instance_profiles().len(), 1);

    assert!(service.delete("build-agent").await.unwrap());
    assert!(service.read("build-agent").await.unwrap().is_none());
    assert!(service.provider().instance_profiles().is_empty());

    // Second delete is a no-op.
    assert!(!service.delete("build-agent").await.unwrap());
}
