//! Portal provider tests
//!
//! Runs the providers against a mock portal.

use nsguard_client::{PortalClientConfig, PortalProviders};
use nsguard_common::{Env, GuardError};
use nsguard_core::{NamespaceLoader, NamespaceProvider, PermissionProvider, UserProvider};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn providers(server: &MockServer) -> PortalProviders {
    PortalProviders::new(PortalClientConfig::new(&server.uri()).with_access_token("token-1"))
        .unwrap()
}

// ============== Lookups ==============

#[tokio::test]
async fn test_load_current_user_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "alice",
            "name": "Alice",
            "email": "alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = providers(&server).load_current_user().await.unwrap();

    assert_eq!(user.user_id, "alice");
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_app_role_users_keeps_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apps/app1/role_users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appId": "app1",
            "masterUsers": [{"userId": "u2"}, {"userId": "u1"}]
        })))
        .mount(&server)
        .await;

    let roles = providers(&server).app_role_users("app1").await.unwrap();

    let ids: Vec<&str> = roles.master_users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, ["u2", "u1"]);
}

#[tokio::test]
async fn test_lookup_failure_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apps/app1/role_users"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "message": "app not found"
        })))
        .mount(&server)
        .await;

    let err = providers(&server).app_role_users("app1").await.unwrap_err();

    match err {
        GuardError::Provider(message) => assert!(message.contains("app not found")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_associated_namespaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/envs/DEV/appnamespaces/TEST1.common/associated-namespaces"))
        .and(query_param("appId", "app1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"appId": "app1", "clusterName": "default", "namespaceName": "TEST1.common"},
            {"appId": "app2", "clusterName": "SHAJQ", "namespaceName": "TEST1.common"}
        ])))
        .mount(&server)
        .await;

    let associated = providers(&server)
        .associated_namespaces("app1", Env::Dev, "TEST1.common")
        .await
        .unwrap();

    assert_eq!(associated.len(), 2);
    assert_eq!(associated[1].app_id, "app2");
    assert_eq!(associated[1].cluster_name, "SHAJQ");
}

#[tokio::test]
async fn test_failover_to_next_portal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userId": "alice"})))
        .mount(&server)
        .await;

    let config = PortalClientConfig::with_servers(vec![
        "http://127.0.0.1:1".to_string(),
        server.uri(),
    ])
    .with_timeouts(500, 2000);
    let providers = PortalProviders::new(config).unwrap();

    let user = providers.load_current_user().await.unwrap();
    assert_eq!(user.user_id, "alice");
}

// ============== Delete ==============

#[tokio::test]
async fn test_delete_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/apps/app1/envs/PRO/clusters/default/namespaces/TEST1.common"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    providers(&server)
        .delete_namespace("app1", Env::Pro, "default", "TEST1.common")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_failure_keeps_portal_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/apps/app1/envs/PRO/clusters/default/namespaces/TEST1.common"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "namespace is being modified",
            "exception": "BadRequestException"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = providers(&server)
        .delete_namespace("app1", Env::Pro, "default", "TEST1.common")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GuardError::DeletionRequestFailed {
            message: "namespace is being modified".to_string(),
            detail: Some("BadRequestException".to_string()),
        }
    );
}

// ============== Namespace loading ==============

async fn mount_namespace(server: &MockServer, app_id: &str, parent_app_id: &str) {
    Mock::given(method("GET"))
        .and(path("/apps/app2/envs/DEV/clusters/default/namespaces/TEST1.common"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baseInfo": {
                "appId": app_id,
                "clusterName": "default",
                "namespaceName": "TEST1.common"
            },
            "isPublic": true,
            "parentAppId": parent_app_id
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/envs/DEV/instances/by-namespace/count"))
        .and(query_param("appId", "app2"))
        .and(query_param("clusterName", "default"))
        .and(query_param("namespaceName", "TEST1.common"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(4)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_linked_namespace_with_branch() {
    let server = MockServer::start().await;
    mount_namespace(&server, "app2", "app1").await;
    Mock::given(method("GET"))
        .and(path(
            "/apps/app2/envs/DEV/clusters/default/namespaces/TEST1.common/branches",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baseInfo": {
                "appId": "app2",
                "clusterName": "20261017-gray",
                "namespaceName": "TEST1.common"
            },
            "latestReleaseId": 42
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/envs/DEV/instances/by-release"))
        .and(query_param("releaseId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "page": 0,
            "size": 1,
            "total": 3
        })))
        .mount(&server)
        .await;

    let ns = providers(&server)
        .load_namespace("app2", Env::Dev, "default", "TEST1.common")
        .await
        .unwrap();

    assert!(ns.is_public);
    assert!(ns.is_linked_namespace);
    assert_eq!(ns.instances_count, 4);
    let branch = ns.branch.unwrap();
    assert_eq!(branch.branch_name, "20261017-gray");
    assert_eq!(branch.latest_release_instances.total, 3);
}

#[tokio::test]
async fn test_load_namespace_without_branch() {
    let server = MockServer::start().await;
    mount_namespace(&server, "app2", "app2").await;
    Mock::given(method("GET"))
        .and(path(
            "/apps/app2/envs/DEV/clusters/default/namespaces/TEST1.common/branches",
        ))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ns = providers(&server)
        .load_namespace("app2", Env::Dev, "default", "TEST1.common")
        .await
        .unwrap();

    assert!(!ns.is_linked_namespace);
    assert!(!ns.has_branch());
    assert_eq!(ns.env, Env::Dev);
}
