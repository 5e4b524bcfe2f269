//! Integration tests for the subscription gate and the tenant lifecycle.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use helpers::{PASSWORD, TestApp};

use ledgerhub_entity::tenant::{LifecycleEvent, TenantStatus};

#[tokio::test]
async fn test_expired_trial_blocks_login() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("trialover");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app
        .create_tenant("TRIAL", Some(Utc::now() - Duration::days(1)))
        .await;
    app.add_membership(identity_id, tenant_id, "OWNER").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.error_code(), "TRIAL_EXPIRED");
}

#[tokio::test]
async fn test_suspended_tenant_blocks_login() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("suspended");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_tenant("SUSPENDED", None).await;
    app.add_membership(identity_id, tenant_id, "OWNER").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.error_code(), "SUSPENDED");
}

#[tokio::test]
async fn test_login_skips_blocked_tenant() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("fallback");
    let identity_id = app.create_identity(&email, false).await;
    let blocked = app.create_tenant("EXPIRED", None).await;
    app.add_membership(identity_id, blocked, "OWNER").await;
    let open = app.create_trial_tenant().await;
    app.add_membership(identity_id, open, "OWNER").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["tenant_id"], open.to_string());
}

#[tokio::test]
async fn test_past_due_in_grace_warns_but_allows() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("pastdue");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_tenant("PAST_DUE", None).await;
    app.create_subscription(
        tenant_id,
        "PAST_DUE",
        Utc::now() - Duration::days(2),
        Some(Utc::now() + Duration::days(5)),
    )
    .await;
    app.add_membership(identity_id, tenant_id, "OWNER").await;

    let login = app.login_as(&email, PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
    assert_eq!(login.body["data"]["warning"], "payment-overdue");
    let token = login.str_at("access_token");

    let companies = app
        .request("GET", "/api/tenant/companies", None, Some(&token))
        .await;
    assert_eq!(companies.status, StatusCode::OK);
    assert_eq!(
        companies.headers["x-subscription-warning"],
        "payment-overdue"
    );
}

#[tokio::test]
async fn test_past_due_after_grace_is_blocked() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("graceover");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_tenant("PAST_DUE", None).await;
    app.create_subscription(
        tenant_id,
        "PAST_DUE",
        Utc::now() - Duration::days(10),
        Some(Utc::now() - Duration::days(3)),
    )
    .await;
    app.add_membership(identity_id, tenant_id, "OWNER").await;

    let response = app.login_as(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.error_code(), "PAYMENT_OVERDUE");
}

#[tokio::test]
async fn test_gate_applies_to_existing_tokens() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, tenant_id) = app.owner_in_trial("gated").await;
    let (token, refresh_token) = app.login(&email).await;

    sqlx::query("UPDATE tenants SET status = 'SUSPENDED' WHERE id = $1")
        .bind(tenant_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let companies = app
        .request("GET", "/api/tenant/companies", None, Some(&token))
        .await;
    assert_eq!(companies.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(companies.error_code(), "SUSPENDED");

    // Identity routes stay open
    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);

    let refreshed = app.refresh(&refresh_token).await;
    assert_eq!(refreshed.status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_provision_and_payment_lifecycle() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (admin_email, admin_id, _) = app.owner_in_trial("sysadmin").await;
    sqlx::query("UPDATE identities SET is_system_admin = TRUE WHERE id = $1")
        .bind(admin_id)
        .execute(&app.pool)
        .await
        .unwrap();
    let owner_email = TestApp::email("newowner");
    let owner_id = app.create_identity(&owner_email, false).await;
    let (token, _) = app.login(&admin_email).await;

    let created = app
        .request(
            "POST",
            "/api/admin/tenants",
            Some(serde_json::json!({ "name": "  Contoso Ltd  ", "owner_id": owner_id })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["data"]["status"], "TRIAL");
    assert_eq!(created.body["data"]["name"], "Contoso Ltd");
    let tenant_id = created.str_at("id");

    // The owner can log straight into the trial
    let owner_login = app.login_as(&owner_email, PASSWORD).await;
    assert_eq!(owner_login.status, StatusCode::OK);
    assert_eq!(owner_login.body["data"]["tenant_id"], tenant_id);

    let paid = app
        .request(
            "POST",
            &format!("/api/admin/tenants/{tenant_id}/payments"),
            Some(serde_json::json!({
                "current_period_end": (Utc::now() + Duration::days(30)).to_rfc3339(),
            })),
            Some(&token),
        )
        .await;
    assert_eq!(paid.status, StatusCode::OK, "{:?}", paid.body);
    assert_eq!(paid.body["data"]["status"], "ACTIVE");
}

#[tokio::test]
async fn test_provision_requires_system_admin() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, _) = app.owner_in_trial("plainowner").await;
    let (token, _) = app.login(&email).await;

    let response = app
        .request(
            "POST",
            "/api/admin/tenants",
            Some(serde_json::json!({ "name": "Sneaky Corp" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lifecycle_advances_only_when_due() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let now = Utc::now();
    let running = app.create_trial_tenant().await;
    let lapsed = app
        .create_tenant("TRIAL", Some(now - Duration::hours(1)))
        .await;

    let untouched = app
        .state
        .lifecycle
        .advance(running, LifecycleEvent::TrialElapsed, now)
        .await
        .unwrap();
    assert_eq!(untouched, None);
    assert_eq!(app.tenant_status(running).await, "TRIAL");

    let expired = app
        .state
        .lifecycle
        .advance(lapsed, LifecycleEvent::TrialElapsed, now)
        .await
        .unwrap();
    assert_eq!(expired, Some(TenantStatus::Expired));
    assert_eq!(app.tenant_status(lapsed).await, "EXPIRED");
}

#[tokio::test]
async fn test_missed_billing_cycle_opens_grace_period() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let now = Utc::now();
    let tenant_id = app.create_tenant("ACTIVE", None).await;
    app.create_subscription(tenant_id, "ACTIVE", now - Duration::hours(1), None)
        .await;

    let status = app
        .state
        .lifecycle
        .advance(tenant_id, LifecycleEvent::BillingCycleMissed, now)
        .await
        .unwrap();
    assert_eq!(status, Some(TenantStatus::PastDue));

    let grace_ends_at: Option<chrono::DateTime<Utc>> = sqlx::query_scalar(
        "SELECT s.grace_period_ends_at FROM subscriptions s \
         JOIN tenants t ON t.subscription_id = s.id WHERE t.id = $1",
    )
    .bind(tenant_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    let grace_ends_at = grace_ends_at.unwrap();
    assert!(grace_ends_at > now + Duration::days(6));
    assert!(grace_ends_at <= now + Duration::days(7));
}

#[tokio::test]
async fn test_cancelled_tenant_is_blocked_for_good() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (admin_email, admin_id, _) = app.owner_in_trial("canceller").await;
    sqlx::query("UPDATE identities SET is_system_admin = TRUE WHERE id = $1")
        .bind(admin_id)
        .execute(&app.pool)
        .await
        .unwrap();
    let (admin_token, _) = app.login(&admin_email).await;
    let (email, _, tenant_id) = app.owner_in_trial("cancelled").await;
    let (token, refresh_token) = app.login(&email).await;

    let cancelled = app
        .request(
            "POST",
            &format!("/api/admin/tenants/{tenant_id}/cancel"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK, "{:?}", cancelled.body);
    assert_eq!(cancelled.body["data"]["status"], "CANCELLED");

    let companies = app
        .request("GET", "/api/tenant/companies", None, Some(&token))
        .await;
    assert_eq!(companies.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(companies.error_code(), "CANCELLED");
    assert_eq!(
        app.refresh(&refresh_token).await.status,
        StatusCode::PAYMENT_REQUIRED
    );

    // A late payment does not revive it
    let paid = app
        .request(
            "POST",
            &format!("/api/admin/tenants/{tenant_id}/payments"),
            Some(serde_json::json!({
                "current_period_end": (Utc::now() + Duration::days(30)).to_rfc3339(),
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(paid.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.tenant_status(tenant_id).await, "CANCELLED");

    let again = app
        .request(
            "POST",
            &format!("/api/admin/tenants/{tenant_id}/cancel"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_requires_system_admin() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, tenant_id) = app.owner_in_trial("selfcancel").await;
    let (token, _) = app.login(&email).await;

    let response = app
        .request(
            "POST",
            &format!("/api/admin/tenants/{tenant_id}/cancel"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.tenant_status(tenant_id).await, "TRIAL");
}

#[tokio::test]
async fn test_billing_standing_requires_billing_permission() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (owner_email, _, tenant_id) = app.owner_in_trial("billingowner").await;
    let admin_email = TestApp::email("billingadmin");
    let admin_id = app.create_identity(&admin_email, false).await;
    app.add_membership(admin_id, tenant_id, "TENANT_ADMIN").await;
    let grace_ends_at = Utc::now() + Duration::days(3);
    app.create_subscription(
        tenant_id,
        "PAST_DUE",
        Utc::now() - Duration::days(4),
        Some(grace_ends_at),
    )
    .await;
    sqlx::query("UPDATE tenants SET status = 'PAST_DUE' WHERE id = $1")
        .bind(tenant_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let (owner_token, _) = app.login(&owner_email).await;
    let standing = app
        .request("GET", "/api/tenant/billing", None, Some(&owner_token))
        .await;
    assert_eq!(standing.status, StatusCode::OK, "{:?}", standing.body);
    assert_eq!(standing.body["data"]["tenant_id"], tenant_id.to_string());
    assert_eq!(standing.body["data"]["warning"], "payment-overdue");
    assert!(standing.body["data"]["grace_ends_at"].is_string());

    let (admin_token, _) = app.login(&admin_email).await;
    let denied = app
        .request("GET", "/api/tenant/billing", None, Some(&admin_token))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}
