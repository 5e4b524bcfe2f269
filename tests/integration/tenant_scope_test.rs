//! Integration tests for tenant isolation, both through the scoped
//! database handle and through the HTTP routes built on it.

mod helpers;

use axum::http::StatusCode;
use helpers::{PASSWORD, TestApp};

use ledgerhub_core::error::ErrorKind;
use ledgerhub_database::{Filter, TenantScope, Value};
use ledgerhub_entity::company::Company;

#[tokio::test]
async fn test_scoped_reads_never_cross_tenants() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let tenant_a = app.create_trial_tenant().await;
    let tenant_b = app.create_trial_tenant().await;
    let a1 = app.create_company(tenant_a, "A One").await;
    let a2 = app.create_company(tenant_a, "A Two").await;
    let b1 = app.create_company(tenant_b, "B One").await;

    let db = app.state.db.scoped(TenantScope::tenant(tenant_a));

    let all = db.fetch_all::<Company>(&Filter::new()).await.unwrap();
    let mut ids: Vec<_> = all.iter().map(|c| c.id).collect();
    ids.sort();
    let mut expected = vec![a1, a2];
    expected.sort();
    assert_eq!(ids, expected);

    assert!(db.fetch_by_id::<Company>(b1).await.unwrap().is_none());
    assert_eq!(
        db.count::<Company>(&Filter::new().is_in("id", vec![a1, b1]))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_scoped_writes_never_cross_tenants() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let tenant_a = app.create_trial_tenant().await;
    let tenant_b = app.create_trial_tenant().await;
    let b1 = app.create_company(tenant_b, "B Original").await;

    let db = app.state.db.scoped(TenantScope::tenant(tenant_a));

    let renamed = db
        .update::<Company>(&[("name", Value::from("Hijacked"))], &Filter::by_id(b1))
        .await
        .unwrap();
    assert_eq!(renamed, 0);
    assert_eq!(db.delete::<Company>(&Filter::by_id(b1)).await.unwrap(), 0);

    let inserted = db
        .insert::<Company>(&[("name", Value::from("A New"))])
        .await
        .unwrap();
    assert_eq!(inserted.tenant_id, tenant_a);

    let name: String = sqlx::query_scalar("SELECT name FROM companies WHERE id = $1")
        .bind(b1)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(name, "B Original");
}

#[tokio::test]
async fn test_scope_columns_cannot_be_named() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let tenant_a = app.create_trial_tenant().await;
    let tenant_b = app.create_trial_tenant().await;
    let db = app.state.db.scoped(TenantScope::tenant(tenant_a));

    let filter_err = db
        .fetch_all::<Company>(&Filter::new().eq("tenant_id", tenant_b))
        .await
        .unwrap_err();
    assert_eq!(filter_err.kind, ErrorKind::Validation);

    let insert_err = db
        .insert::<Company>(&[
            ("tenant_id", Value::from(tenant_b)),
            ("name", Value::from("Smuggled")),
        ])
        .await
        .unwrap_err();
    assert_eq!(insert_err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_company_routes_only_show_granted_companies() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let email = TestApp::email("viewer");
    let identity_id = app.create_identity(&email, false).await;
    let tenant_id = app.create_trial_tenant().await;
    let granted = app.create_company(tenant_id, "Granted Co").await;
    let hidden = app.create_company(tenant_id, "Hidden Co").await;
    let other_tenant = app.create_trial_tenant().await;
    let foreign = app.create_company(other_tenant, "Foreign Co").await;
    app.grant_company_role(identity_id, granted, "VIEWER").await;

    let response = app.login_as(&email, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let token = response.str_at("access_token");

    let list = app
        .request("GET", "/api/tenant/companies", None, Some(&token))
        .await;
    assert_eq!(list.status, StatusCode::OK, "{:?}", list.body);
    let companies = list.body["data"].as_array().unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0]["id"], granted.to_string());
    assert_eq!(companies[0]["role"], "VIEWER");

    for id in [hidden, foreign] {
        let response = app
            .request("GET", &format!("/api/tenant/companies/{id}"), None, Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_owner_sees_every_company_of_own_tenant_only() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };
    let (email, _, tenant_id) = app.owner_in_trial("owner").await;
    app.create_company(tenant_id, "Owned One").await;
    app.create_company(tenant_id, "Owned Two").await;
    let other_tenant = app.create_trial_tenant().await;
    let foreign = app.create_company(other_tenant, "Foreign Co").await;
    let (token, _) = app.login(&email).await;

    let list = app
        .request("GET", "/api/tenant/companies", None, Some(&token))
        .await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"].as_array().map(Vec::len), Some(2));

    let response = app
        .request(
            "GET",
            &format!("/api/tenant/companies/{foreign}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
