//! Shared test helpers for integration tests.
//!
//! Tests need a PostgreSQL database in `DATABASE_URL`; without one,
//! [`TestApp::try_new`] returns `None` and the test exits early. Every
//! test seeds its own identities and tenants, so tests run in parallel
//! against one database.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use ledgerhub_api::{AppState, build_app};
use ledgerhub_auth::PasswordHasher;
use ledgerhub_core::config::AppConfig;
use ledgerhub_database::repositories::IdentityRepository;
use ledgerhub_database::{BypassPurpose, Database};
use ledgerhub_entity::identity::CreateIdentity;

/// Socket peer of every request sent through [`TestApp::request`]; it is
/// a trusted proxy, so `X-Forwarded-For` carries the client IP.
pub const PROXY_PEER: ([u8; 4], u16) = ([127, 0, 0, 1], 40_000);

/// A password that passes the strength check.
pub const PASSWORD: &str = "Quartz-Lantern-Orbit-7319";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for calling services directly
    pub state: AppState,
    /// Raw pool for seeding and assertions
    pub pool: PgPool,
    /// Client IP sent with every request; unique per test
    pub client_ip: String,
}

impl TestApp {
    /// Create a new test application, or `None` without `DATABASE_URL`.
    pub async fn try_new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let raw = format!(
            r#"
            [server]
            trusted_proxies = ["127.0.0.1"]

            [database]
            url = "{url}"
            max_connections = 10
            min_connections = 0

            [auth]
            jwt_secret = "integration-test-secret-0123456789abcdef"
            "#
        );
        let config = AppConfig::from_toml_str(&raw).expect("Failed to load test config");

        let db = Database::connect(&config.database)
            .await
            .expect("Failed to connect to test database");
        db.migrate().await.expect("Failed to run migrations");

        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to open seeding pool");

        let state = AppState::new(Arc::new(config), db);
        let router = build_app(state.clone());
        let client_ip = Self::unique_ip();

        Some(Self {
            router,
            state,
            pool,
            client_ip,
        })
    }

    /// Random address in 10.0.0.0/8 so lockout keys never collide.
    pub fn unique_ip() -> String {
        let id = Uuid::new_v4();
        let b = id.as_bytes();
        format!("10.{}.{}.{}", b[0], b[1], b[2])
    }

    /// Random socket peer that is not a trusted proxy.
    pub fn unique_peer() -> SocketAddr {
        let ip = Self::unique_ip();
        SocketAddr::new(ip.parse().expect("Failed to parse peer ip"), 51_000)
    }

    /// Unique email for this test run.
    pub fn email(prefix: &str) -> String {
        format!("{prefix}-{}@example.test", Uuid::new_v4().simple())
    }

    /// Create an active identity with [`PASSWORD`].
    pub async fn create_identity(&self, email: &str, is_system_admin: bool) -> Uuid {
        let hash = PasswordHasher::new()
            .hash_password(PASSWORD)
            .expect("Failed to hash password");
        let repo = IdentityRepository::new(
            self.state.db.unscoped(BypassPurpose::CredentialLookup),
        );
        repo.create(&CreateIdentity {
            email: email.to_string(),
            password_hash: hash,
            display_name: Some("Test User".to_string()),
            is_system_admin,
        })
        .await
        .expect("Failed to create identity")
        .id
    }

    /// Create a tenant in `status` with an optional trial end.
    pub async fn create_tenant(&self, status: &str, trial_ends_at: Option<DateTime<Utc>>) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tenants (name, status, trial_ends_at) \
             VALUES ($1, $2::tenant_status, $3) RETURNING id",
        )
        .bind(format!("Tenant {}", Uuid::new_v4().simple()))
        .bind(status)
        .bind(trial_ends_at)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create tenant")
    }

    /// A tenant in a trial that ends in two weeks.
    pub async fn create_trial_tenant(&self) -> Uuid {
        self.create_tenant("TRIAL", Some(Utc::now() + Duration::days(14)))
            .await
    }

    /// Attach a subscription record to a tenant.
    pub async fn create_subscription(
        &self,
        tenant_id: Uuid,
        status: &str,
        period_end: DateTime<Utc>,
        grace_period_ends_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO subscriptions \
             (tenant_id, status, current_period_start, current_period_end, grace_period_ends_at) \
             VALUES ($1, $2::subscription_status, $3, $4, $5) RETURNING id",
        )
        .bind(tenant_id)
        .bind(status)
        .bind(period_end - Duration::days(30))
        .bind(period_end)
        .bind(grace_period_ends_at)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create subscription");

        sqlx::query("UPDATE tenants SET subscription_id = $1 WHERE id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .expect("Failed to link subscription");
        id
    }

    pub async fn add_membership(&self, identity_id: Uuid, tenant_id: Uuid, role: &str) {
        sqlx::query(
            "INSERT INTO tenant_memberships (identity_id, tenant_id, role) \
             VALUES ($1, $2, $3::tenant_role)",
        )
        .bind(identity_id)
        .bind(tenant_id)
        .bind(role)
        .execute(&self.pool)
        .await
        .expect("Failed to add membership");
    }

    pub async fn create_company(&self, tenant_id: Uuid, name: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO companies (tenant_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create company")
    }

    pub async fn grant_company_role(&self, identity_id: Uuid, company_id: Uuid, role: &str) {
        sqlx::query(
            "INSERT INTO company_roles (identity_id, company_id, role) \
             VALUES ($1, $2, $3::company_role)",
        )
        .bind(identity_id)
        .bind(company_id)
        .bind(role)
        .execute(&self.pool)
        .await
        .expect("Failed to grant company role");
    }

    pub async fn tenant_status(&self, tenant_id: Uuid) -> String {
        sqlx::query_scalar::<_, String>("SELECT status::text FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read tenant status")
    }

    /// Identity with an `OWNER` membership in a fresh trial tenant.
    pub async fn owner_in_trial(&self, prefix: &str) -> (String, Uuid, Uuid) {
        let email = Self::email(prefix);
        let identity_id = self.create_identity(&email, false).await;
        let tenant_id = self.create_trial_tenant().await;
        self.add_membership(identity_id, tenant_id, "OWNER").await;
        (email, identity_id, tenant_id)
    }

    /// POST /api/auth/login
    pub async fn login_as(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Login and return `(access_token, refresh_token)`.
    pub async fn login(&self, email: &str) -> (String, String) {
        let response = self.login_as(email, PASSWORD).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        (
            response.str_at("access_token"),
            response.str_at("refresh_token"),
        )
    }

    /// POST /api/auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh_token": refresh_token })),
            None,
        )
        .await
    }

    /// Make an HTTP request to the test app through the trusted proxy,
    /// forwarded for [`TestApp::client_ip`].
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_from(
            SocketAddr::from(PROXY_PEER),
            Some(&self.client_ip),
            method,
            path,
            body,
            token,
        )
        .await
    }

    /// POST /api/auth/login straight from `peer`, optionally claiming to
    /// be forwarded for `forwarded_for`.
    pub async fn login_from(
        &self,
        peer: SocketAddr,
        forwarded_for: Option<&str>,
        email: &str,
        password: &str,
    ) -> TestResponse {
        self.request_from(
            peer,
            forwarded_for,
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Make an HTTP request arriving from socket peer `peer`.
    pub async fn request_from(
        &self,
        peer: SocketAddr,
        forwarded_for: Option<&str>,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .extension(ConnectInfo(peer));

        if let Some(forwarded_for) = forwarded_for {
            req = req.header("X-Forwarded-For", forwarded_for);
        }
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// `data.<key>` as a string.
    pub fn str_at(&self, key: &str) -> String {
        self.body["data"][key]
            .as_str()
            .unwrap_or_else(|| panic!("No data.{key} in {:?}", self.body))
            .to_string()
    }

    /// The `error` code of a failed response.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
