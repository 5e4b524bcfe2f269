//! Integration tests for the credential and lockout flow.

mod helpers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{StatusCode, header};
use helpers::{PASSWORD, PROXY_PEER, TestApp};

use ledgerhub_auth::AccessResolver;
use ledgerhub_core::error::ErrorKind;
use ledgerhub_database::BypassPurpose;
use ledgerhub_database::repositories::{IdentityRepository, MembershipRepository};
use ledgerhub_entity::membership::Role;

#[tokio::test]
async fn test_login_success() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, tenant_id) = app.owner_in_trial("login").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = &response.body["data"];
    assert!(data["access_token"].is_string());
    assert_eq!(data["refresh_token"].as_str().map(str::len), Some(43));
    assert_eq!(data["token_type"], "Bearer");
    assert_eq!(data["tenant_id"], tenant_id.to_string());
    assert_eq!(data["role"], "OWNER");
    assert!(data.get("warning").is_none());
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("casing").await;

    let response = app
        .login_as(&format!("  {}  ", email.to_uppercase()), PASSWORD)
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("generic").await;

    let wrong_password = app.login_as(&email, "Not-The-Password-1").await;
    let unknown_email = app
        .login_as(&TestApp::email("nobody"), "Not-The-Password-1")
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_third_failure_locks_email() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("lockout").await;

    for _ in 0..2 {
        let response = app.login_as(&email, "Wrong-Password-99").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let third = app.login_as(&email, "Wrong-Password-99").await;
    assert_eq!(third.status, StatusCode::LOCKED);
    assert_eq!(third.error_code(), "ACCOUNT_LOCKED");
    assert_eq!(third.body["details"]["tier"], 1);
    let retry_after: u64 = third.headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 300);

    // The correct password does not bypass an active lock
    let correct = app.login_as(&email, PASSWORD).await;
    assert_eq!(correct.status, StatusCode::LOCKED);
}

#[tokio::test]
async fn test_system_admin_unlock_clears_lock() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("unlock").await;
    let (admin_email, admin_id, _) = app.owner_in_trial("admin").await;
    sqlx::query("UPDATE identities SET is_system_admin = TRUE WHERE id = $1")
        .bind(admin_id)
        .execute(&app.pool)
        .await
        .unwrap();
    let (admin_token, _) = app.login(&admin_email).await;

    for _ in 0..3 {
        app.login_as(&email, "Wrong-Password-99").await;
    }
    assert_eq!(app.login_as(&email, PASSWORD).await.status, StatusCode::LOCKED);

    let unlock = app
        .request(
            "POST",
            "/api/admin/login-attempts/unlock",
            Some(serde_json::json!({
                "email": email,
                "ip_address": app.client_ip,
                "reason": "verified by phone",
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(unlock.status, StatusCode::OK, "{:?}", unlock.body);
    assert_eq!(unlock.body["data"]["cleared"], 3);

    assert_eq!(app.login_as(&email, PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unlock_requires_system_admin() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("notadmin").await;
    let (token, _) = app.login(&email).await;

    let response = app
        .request(
            "POST",
            "/api/admin/login-attempts/unlock",
            Some(serde_json::json!({ "email": email, "reason": "self service" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_inactive_identity_rejected_generically() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, identity_id, _) = app.owner_in_trial("inactive").await;
    IdentityRepository::new(app.state.db.unscoped(BypassPurpose::Maintenance))
        .set_active(identity_id, false)
        .await
        .unwrap();

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_identity_without_tenant_access_is_forbidden() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("orphan");
    app.create_identity(&email, false).await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_returns_identity_and_context() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, identity_id, tenant_id) = app.owner_in_trial("me").await;
    let (token, _) = app.login(&email).await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = &response.body["data"];
    assert_eq!(data["identity"]["id"], identity_id.to_string());
    assert_eq!(data["identity"]["email"], email);
    assert_eq!(data["tenant_id"], tenant_id.to_string());
    assert_eq!(data["role"], "OWNER");
}

#[tokio::test]
async fn test_company_role_only_identity_lands_in_company() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("clerk");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_trial_tenant().await;
    let company_id = app.create_company(tenant_id, "Northwind Trading").await;
    app.grant_company_role(identity_id, company_id, "SALES").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = &response.body["data"];
    assert_eq!(data["tenant_id"], tenant_id.to_string());
    assert_eq!(data["role"], "SALES");
    assert_eq!(data["company_id"], company_id.to_string());
    assert_eq!(data["companies"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_default_tenant_prefers_membership_over_company_grant() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("landing");
    let identity_id = app.create_identity(&email, false).await;
    let granted_tenant = app.create_trial_tenant().await;
    let company_id = app.create_company(granted_tenant, "Fabrikam Supply").await;
    app.grant_company_role(identity_id, company_id, "WAREHOUSE").await;
    let owned_tenant = app.create_trial_tenant().await;
    app.add_membership(identity_id, owned_tenant, "OWNER").await;
    let orphan_id = app.create_identity(&TestApp::email("landless"), false).await;

    let resolver = AccessResolver::new(
        app.state.db.clone(),
        Arc::new(MembershipRepository::new(
            app.state.db.unscoped(BypassPurpose::AccessResolution),
        )),
    );

    let landing = resolver.resolve_default_tenant(identity_id).await.unwrap();
    assert_eq!(landing.tenant_id, owned_tenant);
    assert_eq!(landing.role, Role::Owner);

    let err = resolver.resolve_default_tenant(orphan_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_success_is_recorded_and_keeps_earlier_failures() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("keepcount").await;

    for _ in 0..2 {
        app.login_as(&email, "Wrong-Password-99").await;
    }
    assert_eq!(app.login_as(&email, PASSWORD).await.status, StatusCode::OK);

    let last: (bool, Option<String>) = sqlx::query_as(
        "SELECT success, failure_reason::text FROM login_attempts \
         WHERE email = $1 ORDER BY attempted_at DESC LIMIT 1",
    )
    .bind(&email)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(last, (true, None));

    // The success did not reset the count: one more failure reaches tier 1
    let locked = app.login_as(&email, "Wrong-Password-99").await;
    assert_eq!(locked.status, StatusCode::LOCKED);
    assert_eq!(locked.body["details"]["tier"], 1);
}

#[tokio::test]
async fn test_locked_ip_blocks_other_emails() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (target, _, _) = app.owner_in_trial("iptarget").await;
    let (bystander, _, _) = app.owner_in_trial("bystander").await;

    for _ in 0..3 {
        app.login_as(&target, "Wrong-Password-99").await;
    }

    let response = app.login_as(&bystander, PASSWORD).await;
    assert_eq!(response.status, StatusCode::LOCKED);
    assert_eq!(response.error_code(), "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_forwarded_for_from_untrusted_peer_is_ignored() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("spoofed").await;
    let attacker = TestApp::unique_peer();
    let victim_ip = TestApp::unique_ip();

    // Rotating the header does not spread failures over several keys
    for _ in 0..3 {
        let spoofed = TestApp::unique_ip();
        let response = app
            .login_from(
                attacker,
                Some(&spoofed),
                &TestApp::email("ghost"),
                "Wrong-Password-99",
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    let blocked = app
        .login_from(attacker, Some(&victim_ip), &email, PASSWORD)
        .await;
    assert_eq!(blocked.status, StatusCode::LOCKED);

    let recorded: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM login_attempts WHERE ip_address = $1",
    )
    .bind(&victim_ip)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(recorded, 0);

    // The forged address itself stays usable through the real proxy
    let via_proxy = app
        .request_from(
            SocketAddr::from(PROXY_PEER),
            Some(&victim_ip),
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(via_proxy.status, StatusCode::OK, "{:?}", via_proxy.body);
}
