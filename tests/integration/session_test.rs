//! Integration tests for refresh rotation, the active-session cap,
//! switching and revocation.

mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use helpers::{PASSWORD, TestApp};
use tokio::task::JoinSet;
use uuid::Uuid;

use ledgerhub_auth::token::refresh::{generate_refresh_token, hash_refresh_token};

#[tokio::test]
async fn test_refresh_rotates_and_old_token_dies() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, tenant_id) = app.owner_in_trial("rotate").await;
    let (_, refresh_token) = app.login(&email).await;

    let rotated = app.refresh(&refresh_token).await;
    assert_eq!(rotated.status, StatusCode::OK, "{:?}", rotated.body);
    let next = rotated.str_at("refresh_token");
    assert_ne!(next, refresh_token);
    assert_eq!(rotated.body["data"]["tenant_id"], tenant_id.to_string());

    let reuse = app.refresh(&refresh_token).await;
    assert_eq!(reuse.status, StatusCode::UNAUTHORIZED);

    let again = app.refresh(&next).await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_refresh_has_one_winner() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, identity_id, _) = app.owner_in_trial("race").await;
    let (_, refresh_token) = app.login(&email).await;

    let (a, b) = tokio::join!(app.refresh(&refresh_token), app.refresh(&refresh_token));

    let statuses = [a.status, b.status];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "{statuses:?}"
    );
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM refresh_tokens WHERE identity_id = $1 AND revoked = FALSE",
    )
    .bind(identity_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(active, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_burst_larger_than_pool_succeeds() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let app = Arc::new(app);
    let mut refresh_tokens = Vec::new();
    for i in 0..32 {
        let (email, _, _) = app.owner_in_trial(&format!("burst{i}")).await;
        let (_, refresh_token) = app.login(&email).await;
        refresh_tokens.push(refresh_token);
    }

    let mut burst = JoinSet::new();
    for refresh_token in refresh_tokens {
        let app = Arc::clone(&app);
        burst.spawn(async move { app.refresh(&refresh_token).await });
    }

    let mut statuses = Vec::new();
    while let Some(response) = burst.join_next().await {
        let response = response.unwrap();
        statuses.push(response.status);
    }
    assert_eq!(statuses.len(), 32);
    assert!(
        statuses.iter().all(|s| *s == StatusCode::OK),
        "{statuses:?}"
    );
}

#[tokio::test]
async fn test_third_login_evicts_oldest_session() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, identity_id, _) = app.owner_in_trial("cap").await;

    let (_, first) = app.login(&email).await;
    let (_, second) = app.login(&email).await;
    let (_, third) = app.login(&email).await;

    assert_eq!(app.refresh(&first).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.refresh(&second).await.status, StatusCode::OK);
    assert_eq!(app.refresh(&third).await.status, StatusCode::OK);

    let reason: Option<String> = sqlx::query_scalar(
        "SELECT revoked_reason FROM refresh_tokens WHERE token_hash = $1",
    )
    .bind(hash_refresh_token(&first))
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(reason.as_deref(), Some("cap_exceeded"));

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM refresh_tokens WHERE identity_id = $1 AND revoked = FALSE",
    )
    .bind(identity_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(active, 2);
}

#[tokio::test]
async fn test_refresh_tokens_are_stored_hashed() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("hashed").await;
    let (_, refresh_token) = app.login(&email).await;

    let plain: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE token_hash = $1")
        .bind(&refresh_token)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let hashed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE token_hash = $1")
        .bind(hash_refresh_token(&refresh_token))
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!((plain, hashed), (0, 1));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("logout").await;
    let (_, refresh_token) = app.login(&email).await;
    let body = serde_json::json!({ "refresh_token": refresh_token });

    let first = app
        .request("POST", "/api/auth/logout", Some(body.clone()), None)
        .await;
    let second = app
        .request("POST", "/api/auth/logout", Some(body), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    assert_eq!(app.refresh(&refresh_token).await.status, StatusCode::UNAUTHORIZED);

    // Unknown tokens are accepted too
    let unknown = app
        .request(
            "POST",
            "/api/auth/logout",
            Some(serde_json::json!({ "refresh_token": generate_refresh_token() })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_revokes_every_session() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("pwchange").await;
    let (access, first) = app.login(&email).await;
    let (_, second) = app.login(&email).await;
    let new_password = "Harbor-Meadow-Violet-8842";

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "current_password": PASSWORD,
                "new_password": new_password,
            })),
            Some(&access),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["revoked_sessions"], 2);

    assert_eq!(app.refresh(&first).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.refresh(&second).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login_as(&email, PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login_as(&email, new_password).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_rejects_wrong_current_and_weak_new() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("pwreject").await;
    let (access, refresh_token) = app.login(&email).await;

    let wrong_current = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "current_password": "Not-The-Password-1",
                "new_password": "Harbor-Meadow-Violet-8842",
            })),
            Some(&access),
        )
        .await;
    assert_eq!(wrong_current.status, StatusCode::UNAUTHORIZED);

    let weak = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "current_password": PASSWORD,
                "new_password": "password",
            })),
            Some(&access),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    // Nothing was revoked
    assert_eq!(app.refresh(&refresh_token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_switch_company_within_grants() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("switcher");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_trial_tenant().await;
    let first = app.create_company(tenant_id, "Alpha Holdings").await;
    let second = app.create_company(tenant_id, "Beta Logistics").await;
    let not_granted = app.create_company(tenant_id, "Gamma Retail").await;
    app.grant_company_role(identity_id, first, "SALES").await;
    app.grant_company_role(identity_id, second, "FINANCE").await;
    let (access, refresh_token) = app.login(&email).await;

    let switched = app
        .request(
            "POST",
            "/api/auth/switch-company",
            Some(serde_json::json!({ "company_id": second })),
            Some(&access),
        )
        .await;
    assert_eq!(switched.status, StatusCode::OK, "{:?}", switched.body);
    assert_eq!(switched.body["data"]["company_id"], second.to_string());
    let new_access = switched.str_at("access_token");

    let me = app.request("GET", "/api/auth/me", None, Some(&new_access)).await;
    assert_eq!(me.body["data"]["company_id"], second.to_string());
    assert_eq!(me.body["data"]["effective_role"], "FINANCE");

    // The session remembers the company across a refresh
    let refreshed = app.refresh(&refresh_token).await;
    assert_eq!(refreshed.body["data"]["company_id"], second.to_string());

    let denied = app
        .request(
            "POST",
            "/api/auth/switch-company",
            Some(serde_json::json!({ "company_id": not_granted })),
            Some(&new_access),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_switch_tenant_to_accessible_tenant_only() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, identity_id, home) = app.owner_in_trial("multi").await;
    let other = app.create_trial_tenant().await;
    app.add_membership(identity_id, other, "TENANT_ADMIN").await;
    let foreign = app.create_trial_tenant().await;
    let (access, _) = app.login(&email).await;

    let tenants = app.request("GET", "/api/auth/tenants", None, Some(&access)).await;
    assert_eq!(tenants.status, StatusCode::OK);
    assert_eq!(tenants.body["data"]["current_tenant_id"], home.to_string());
    assert_eq!(
        tenants.body["data"]["tenants"].as_array().map(Vec::len),
        Some(2)
    );

    let switched = app
        .request(
            "POST",
            "/api/auth/switch-tenant",
            Some(serde_json::json!({ "tenant_id": other })),
            Some(&access),
        )
        .await;
    assert_eq!(switched.status, StatusCode::OK, "{:?}", switched.body);
    assert_eq!(switched.body["data"]["tenant_id"], other.to_string());
    assert_eq!(switched.body["data"]["role"], "TENANT_ADMIN");

    let denied = app
        .request(
            "POST",
            "/api/auth/switch-tenant",
            Some(serde_json::json!({ "tenant_id": foreign })),
            Some(&access),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cleanup_revokes_expired_tokens() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (_, identity_id, tenant_id) = app.owner_in_trial("sweep").await;
    let token_id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO refresh_tokens (id, identity_id, tenant_id, token_hash, expires_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(token_id)
    .bind(identity_id)
    .bind(tenant_id)
    .bind(hash_refresh_token(&generate_refresh_token()))
    .bind(Utc::now() - Duration::hours(1))
    .bind(Utc::now() - Duration::days(31))
    .execute(&app.pool)
    .await
    .unwrap();

    let report = app.state.cleanup.run_cleanup(Utc::now()).await.unwrap();
    assert!(report.expired_tokens >= 1);

    let revoked: bool = sqlx::query_scalar("SELECT revoked FROM refresh_tokens WHERE id = $1")
        .bind(token_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(revoked);
}
