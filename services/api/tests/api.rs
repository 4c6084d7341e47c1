// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Router-level integration tests against in-memory store fakes.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use benchcom_api::auth::create_token;
use benchcom_api::state::AppState;
use benchcom_core::settings::{
    ApiSettings, AuthSettings, DatabaseSettings, ServerSettings, Settings, StatsSettings,
};
use benchcom_storage::runs::{
    NewRun, ResultDetail, ResultQuery, ResultWithRun, RunDetail, RunFilter, RunStore,
    TestCatalogEntry,
};
use benchcom_storage::stats::{CpuEntry, RecomputeOutcome, StatRow, StatStore, SystemEntry};
use benchcom_storage::users::{NewUser, User, UserStore};
use benchcom_storage::Result as StorageResult;

// ---------------------------------------------------------------------------
// Fakes

#[derive(Default)]
struct FakeUsers {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

impl FakeUsers {
    fn push(&self, username: &str, password_hash: &str, is_admin: bool) -> User {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_admin,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserStore for FakeUsers {
    async fn create(&self, new: NewUser) -> StorageResult<User> {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn identity_taken(&self, username: &str, email: &str) -> StorageResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username || u.email == email))
    }
}

#[derive(Default)]
struct FakeRuns {
    runs: Mutex<Vec<RunDetail>>,
    next_id: AtomicI64,
    last_filter: Mutex<Option<RunFilter>>,
    last_result_query: Mutex<Option<ResultQuery>>,
}

#[async_trait]
impl RunStore for FakeRuns {
    async fn insert(&self, new: NewRun) -> StorageResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let results = new
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| ResultDetail {
                id: id * 100 + i as i64,
                test_name: r.test_name.clone(),
                test_category: r.test_category.clone(),
                value: r.value,
                unit: r.unit.clone(),
                metrics: r.metrics.clone(),
            })
            .collect();
        self.runs.lock().unwrap().push(RunDetail {
            id,
            hostname: new.hostname,
            architecture: new.architecture,
            cpu_model: new.cpu_model,
            cpu_cores: new.cpu_cores,
            total_memory_mb: new.total_memory_mb,
            os_info: new.os_info,
            kernel_version: new.kernel_version,
            benchmark_started_at: new.benchmark_started_at,
            benchmark_completed_at: new.benchmark_completed_at,
            submitted_at: Utc::now(),
            is_anonymous: new.is_anonymous,
            benchmark_version: new.benchmark_version,
            tags: new.tags,
            notes: new.notes,
            dmi_info: new.dmi_info,
            console_output: new.console_output,
            submitter_ip: new.submitter_ip,
            user_id: new.user_id,
            username: None,
            results,
        });
        Ok(id)
    }

    async fn list(
        &self,
        filter: &RunFilter,
    ) -> StorageResult<Vec<benchcom_storage::runs::RunSummary>> {
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        Ok(vec![])
    }

    async fn detail(&self, id: i64) -> StorageResult<Option<RunDetail>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn delete(&self, id: i64) -> StorageResult<Option<Vec<String>>> {
        let mut runs = self.runs.lock().unwrap();
        let Some(pos) = runs.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let run = runs.remove(pos);
        let mut names: Vec<String> = run.results.iter().map(|r| r.test_name.clone()).collect();
        names.sort();
        names.dedup();
        Ok(Some(names))
    }

    async fn results_by_test(&self, query: &ResultQuery) -> StorageResult<Vec<ResultWithRun>> {
        *self.last_result_query.lock().unwrap() = Some(query.clone());
        Ok(vec![])
    }

    async fn test_catalog(&self) -> StorageResult<Vec<TestCatalogEntry>> {
        Ok(vec![TestCatalogEntry {
            test_name: "7zip_4t".into(),
            test_category: "compression".into(),
            unit: Some("MIPS".into()),
            result_count: 12,
        }])
    }
}

#[derive(Default)]
struct FakeStats {
    scopes: Mutex<Vec<Option<String>>>,
    rows: Vec<StatRow>,
}

#[async_trait]
impl StatStore for FakeStats {
    async fn recompute(&self, test_name: Option<&str>) -> StorageResult<RecomputeOutcome> {
        self.scopes
            .lock()
            .unwrap()
            .push(test_name.map(str::to_string));
        Ok(RecomputeOutcome {
            groups_written: 3,
            groups_deleted: 1,
        })
    }

    async fn by_test(&self, test_name: &str, limit: i64) -> StorageResult<Vec<StatRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.test_name == test_name)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn available_cpus(&self) -> StorageResult<Vec<CpuEntry>> {
        Ok(vec![CpuEntry {
            cpu_model: "AMD Ryzen 9 5950X".into(),
            architecture: "x86_64".into(),
            test_count: 8,
        }])
    }

    async fn available_systems(&self) -> StorageResult<Vec<SystemEntry>> {
        Ok(vec![SystemEntry {
            system_type: "Dell Inc. XPS 13 9310".into(),
            test_count: 5,
        }])
    }
}

fn stat_row(id: i64, cpu_model: Option<&str>, system_type: Option<&str>, median: f64) -> StatRow {
    StatRow {
        id,
        cpu_model: cpu_model.map(str::to_string),
        architecture: "x86_64".into(),
        system_type: system_type.map(str::to_string),
        test_name: "7zip_4t".into(),
        test_category: Some("compression".into()),
        unit: Some("MIPS".into()),
        median_value: median,
        mean_value: median,
        min_value: median - 100.0,
        max_value: median + 100.0,
        std_dev: Some(50.0),
        sample_count: 4,
        last_updated: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Harness

struct TestApp {
    router: Router,
    users: Arc<FakeUsers>,
    runs: Arc<FakeRuns>,
    stats: Arc<FakeStats>,
    settings: Settings,
}

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            host: "localhost".into(),
            port: 5432,
            user: "benchcom".into(),
            password: "benchcom".into(),
            database: "benchcom".into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
        },
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        auth: AuthSettings {
            jwt_secret: "integration-test-secret".into(),
            token_expiry_minutes: 30,
            allow_anonymous_submissions: true,
            allow_anonymous_browsing: true,
        },
        api: ApiSettings {
            default_page_size: 50,
            max_page_size: 500,
            cors_origins: vec![],
        },
        stats: StatsSettings {
            refresh_interval_secs: 900,
        },
    }
}

fn build_app(settings: Settings) -> TestApp {
    build_app_with_stats(settings, FakeStats::default())
}

fn build_app_with_stats(settings: Settings, stats: FakeStats) -> TestApp {
    let users = Arc::new(FakeUsers::default());
    let runs = Arc::new(FakeRuns::default());
    let stats = Arc::new(stats);
    let state = Arc::new(AppState::new(
        settings.clone(),
        users.clone(),
        runs.clone(),
        stats.clone(),
    ));
    TestApp {
        router: benchcom_api::app(state),
        users,
        runs,
        stats,
        settings,
    }
}

impl TestApp {
    fn token_for(&self, user: &User) -> String {
        create_token(user.id, &self.settings.auth).unwrap()
    }

    async fn request(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("DELETE").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }
}

fn submission_payload() -> Value {
    json!({
        "hostname": "buildbox",
        "architecture": "x86_64",
        "cpu_model": "AMD Ryzen 9 5950X",
        "cpu_cores": 16,
        "total_memory_mb": 64210,
        "benchmark_version": "1.1",
        "console_output": "=== benchmark log ===",
        "dmi_info": {"manufacturer": "Dell Inc.", "product": "XPS 13 9310"},
        "results": [
            {"test_name": "7zip_4t", "test_category": "compression", "value": 41230.0, "unit": "MIPS"},
            {"test_name": "pi_calculation", "test_category": "cpu", "value": 12.5, "unit": "seconds"},
            {"test_name": "7zip_4t", "test_category": "compression", "value": 41500.0, "unit": "MIPS"}
        ]
    })
}

/// Wait for spawned background tasks (scoped stats refreshes) to run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ---------------------------------------------------------------------------
// Health

#[tokio::test]
async fn test_health_reports_anonymity_flags() {
    let mut settings = test_settings();
    settings.auth.allow_anonymous_submissions = false;
    let app = build_app(settings);

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["allow_anonymous_submissions"], false);
    assert_eq!(body["allow_anonymous_browsing"], true);
}

// ---------------------------------------------------------------------------
// Users

#[tokio::test]
async fn test_register_login_me_round_trip() {
    let app = build_app(test_settings());

    let (status, body) = app
        .post(
            "/api/v1/register",
            None,
            json!({"username": "alice", "email": "alice@example.com", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .post(
            "/api/v1/login",
            None,
            json!({"username": "alice", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/v1/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let app = build_app(test_settings());
    app.post(
        "/api/v1/register",
        None,
        json!({"username": "alice", "email": "alice@example.com", "password": "hunter2hunter2"}),
    )
    .await;

    let (status, body) = app
        .post(
            "/api/v1/login",
            None,
            json!({"username": "alice", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = build_app(test_settings());
    let payload =
        json!({"username": "alice", "email": "alice@example.com", "password": "hunter2hunter2"});

    let (status, _) = app.post("/api/v1/register", None, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/v1/register", None, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Username or email already registered");
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let app = build_app(test_settings());
    let (status, _) = app
        .post(
            "/api/v1/register",
            None,
            json!({"username": "alice", "email": "alice@example.com", "password": "short"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = build_app(test_settings());
    let (status, _) = app.get("/api/v1/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Submission

#[tokio::test]
async fn test_anonymous_submission_is_accepted() {
    let app = build_app(test_settings());

    let (status, body) = app
        .post("/api/v1/benchmarks", None, submission_payload())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Benchmark submitted successfully");
    let id = body["id"].as_i64().unwrap();

    let runs = app.runs.runs.lock().unwrap();
    let run = runs.iter().find(|r| r.id == id).unwrap();
    assert!(run.is_anonymous);
    assert_eq!(run.results.len(), 3);
    assert_eq!(
        run.dmi_info.as_ref().unwrap()["manufacturer"],
        "Dell Inc."
    );
}

#[tokio::test]
async fn test_submission_triggers_scoped_stats_refresh() {
    let app = build_app(test_settings());

    let (status, _) = app
        .post("/api/v1/benchmarks", None, submission_payload())
        .await;
    assert_eq!(status, StatusCode::OK);
    settle().await;

    let scopes = app.stats.scopes.lock().unwrap();
    assert_eq!(
        *scopes,
        vec![
            Some("7zip_4t".to_string()),
            Some("pi_calculation".to_string())
        ]
    );
}

#[tokio::test]
async fn test_submission_rejected_when_anonymous_disabled() {
    let mut settings = test_settings();
    settings.auth.allow_anonymous_submissions = false;
    let app = build_app(settings);

    let (status, _) = app
        .post("/api/v1/benchmarks", None, submission_payload())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.runs.runs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_authenticated_submission_records_owner() {
    let app = build_app(test_settings());
    let user = app.users.push("alice", "unused", false);
    let token = app.token_for(&user);

    let (status, body) = app
        .post("/api/v1/benchmarks", Some(&token), submission_payload())
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_i64().unwrap();

    let runs = app.runs.runs.lock().unwrap();
    let run = runs.iter().find(|r| r.id == id).unwrap();
    assert_eq!(run.user_id, Some(user.id));
    assert!(!run.is_anonymous);
}

// ---------------------------------------------------------------------------
// Browsing

#[tokio::test]
async fn test_list_clamps_limit_to_max_page_size() {
    let app = build_app(test_settings());

    let (status, _) = app.get("/api/v1/benchmarks?limit=99999", None).await;
    assert_eq!(status, StatusCode::OK);

    let filter = app.runs.last_filter.lock().unwrap().clone().unwrap();
    assert_eq!(filter.limit, app.settings.api.max_page_size);
}

#[tokio::test]
async fn test_list_defaults_limit() {
    let app = build_app(test_settings());

    let (status, _) = app
        .get("/api/v1/benchmarks?architecture=aarch64", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let filter = app.runs.last_filter.lock().unwrap().clone().unwrap();
    assert_eq!(filter.limit, app.settings.api.default_page_size);
    assert_eq!(filter.architecture.as_deref(), Some("aarch64"));
}

#[tokio::test]
async fn test_browsing_rejected_when_anonymous_browsing_disabled() {
    let mut settings = test_settings();
    settings.auth.allow_anonymous_browsing = false;
    let app = build_app(settings);

    for uri in [
        "/api/v1/benchmarks",
        "/api/v1/results/by-test",
        "/api/v1/tests",
        "/api/v1/stats/by-test?test_name=7zip_4t",
        "/api/v1/stats/available-cpus",
        "/api/v1/stats/available-systems",
    ] {
        let (status, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {uri}");
    }

    let user = app.users.push("alice", "unused", false);
    let token = app.token_for(&user);
    let (status, _) = app.get("/api/v1/benchmarks", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_detail_unknown_run_is_not_found() {
    let app = build_app(test_settings());
    let (status, _) = app.get("/api/v1/benchmarks/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_redacts_sensitive_fields_for_strangers() {
    let app = build_app(test_settings());
    let owner = app.users.push("owner", "unused", false);
    let owner_token = app.token_for(&owner);

    let (_, body) = app
        .post("/api/v1/benchmarks", Some(&owner_token), submission_payload())
        .await;
    let id = body["id"].as_i64().unwrap();
    let uri = format!("/api/v1/benchmarks/{id}");

    // Anonymous caller sees nulls.
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["console_output"].is_null());
    assert!(body["submitter_ip"].is_null());
    assert!(body["user_id"].is_null());
    assert_eq!(body["hostname"], "buildbox");

    // Another user sees nulls too.
    let other = app.users.push("other", "unused", false);
    let (_, body) = app.get(&uri, Some(&app.token_for(&other))).await;
    assert!(body["console_output"].is_null());

    // The owner sees the real values.
    let (_, body) = app.get(&uri, Some(&owner_token)).await;
    assert_eq!(body["console_output"], "=== benchmark log ===");
    assert_eq!(body["user_id"], owner.id);

    // So does an admin.
    let admin = app.users.push("admin", "unused", true);
    let (_, body) = app.get(&uri, Some(&app.token_for(&admin))).await;
    assert_eq!(body["console_output"], "=== benchmark log ===");
}

#[tokio::test]
async fn test_results_by_test_passes_filters() {
    let app = build_app(test_settings());

    let (status, _) = app
        .get(
            "/api/v1/results/by-test?test_name=7zip_4t&test_category=compression&limit=10",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let query = app.runs.last_result_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.test_name.as_deref(), Some("7zip_4t"));
    assert_eq!(query.test_category.as_deref(), Some("compression"));
    assert_eq!(query.limit, 10);
}

#[tokio::test]
async fn test_test_catalog_lists_entries() {
    let app = build_app(test_settings());
    let (status, body) = app.get("/api/v1/tests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["test_name"], "7zip_4t");
    assert_eq!(body[0]["result_count"], 12);
}

// ---------------------------------------------------------------------------
// Deletion

#[tokio::test]
async fn test_delete_requires_authentication() {
    let app = build_app(test_settings());
    let (status, _) = app.delete("/api/v1/benchmarks/1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_unknown_run_is_not_found() {
    let app = build_app(test_settings());
    let user = app.users.push("alice", "unused", false);
    let token = app.token_for(&user);

    let (status, _) = app.delete("/api/v1/benchmarks/999", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_foreign_run_is_forbidden() {
    let app = build_app(test_settings());
    let owner = app.users.push("owner", "unused", false);
    let (_, body) = app
        .post(
            "/api/v1/benchmarks",
            Some(&app.token_for(&owner)),
            submission_payload(),
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    let intruder = app.users.push("intruder", "unused", false);
    let (status, _) = app
        .delete(
            &format!("/api/v1/benchmarks/{id}"),
            Some(&app.token_for(&intruder)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.runs.runs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_owner_can_delete_and_stats_refresh_is_scoped() {
    let app = build_app(test_settings());
    let owner = app.users.push("owner", "unused", false);
    let token = app.token_for(&owner);
    let (_, body) = app
        .post("/api/v1/benchmarks", Some(&token), submission_payload())
        .await;
    let id = body["id"].as_i64().unwrap();
    settle().await;
    app.stats.scopes.lock().unwrap().clear();

    let (status, body) = app
        .delete(&format!("/api/v1/benchmarks/{id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Benchmark run deleted");
    assert!(app.runs.runs.lock().unwrap().is_empty());

    settle().await;
    let scopes = app.stats.scopes.lock().unwrap();
    assert_eq!(
        *scopes,
        vec![
            Some("7zip_4t".to_string()),
            Some("pi_calculation".to_string())
        ]
    );
}

#[tokio::test]
async fn test_admin_can_delete_any_run() {
    let app = build_app(test_settings());
    let owner = app.users.push("owner", "unused", false);
    let (_, body) = app
        .post(
            "/api/v1/benchmarks",
            Some(&app.token_for(&owner)),
            submission_payload(),
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    let admin = app.users.push("admin", "unused", true);
    let (status, _) = app
        .delete(
            &format!("/api/v1/benchmarks/{id}"),
            Some(&app.token_for(&admin)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Stats

#[tokio::test]
async fn test_stats_refresh_reports_counts() {
    let app = build_app(test_settings());

    let (status, body) = app.post("/api/v1/stats/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["groups_written"], 3);
    assert_eq!(body["groups_deleted"], 1);

    let scopes = app.stats.scopes.lock().unwrap();
    assert_eq!(*scopes, vec![None]);
}

#[tokio::test]
async fn test_scoped_stats_refresh() {
    let app = build_app(test_settings());

    let (status, _) = app
        .post("/api/v1/stats/refresh?test_name=7zip_4t", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let scopes = app.stats.scopes.lock().unwrap();
    assert_eq!(*scopes, vec![Some("7zip_4t".to_string())]);
}

#[tokio::test]
async fn test_stats_by_test_defaults_to_cpu_grouping() {
    let stats = FakeStats {
        rows: vec![
            stat_row(1, Some("AMD Ryzen 9 5950X"), Some("Dell Inc. XPS"), 41000.0),
            stat_row(2, None, Some("Raspberry Pi Foundation Raspberry Pi 4"), 9000.0),
        ],
        ..Default::default()
    };
    let app = build_app_with_stats(test_settings(), stats);

    let (status, body) = app
        .get("/api/v1/stats/by-test?test_name=7zip_4t", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    // The null-cpu row has no label under cpu grouping and is omitted.
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["label"], "AMD Ryzen 9 5950X");
    assert_eq!(entries[0]["sample_count"], 4);
}

#[tokio::test]
async fn test_stats_by_test_group_by_system_skips_unlabeled_rows() {
    let stats = FakeStats {
        rows: vec![
            stat_row(1, Some("AMD Ryzen 9 5950X"), None, 41000.0),
            stat_row(2, Some("BCM2711"), Some("Raspberry Pi Foundation Raspberry Pi 4"), 9000.0),
        ],
        ..Default::default()
    };
    let app = build_app_with_stats(test_settings(), stats);

    let (status, body) = app
        .get("/api/v1/stats/by-test?test_name=7zip_4t&group_by=system", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["label"],
        "Raspberry Pi Foundation Raspberry Pi 4"
    );
}

#[tokio::test]
async fn test_stats_by_test_group_by_architecture_keeps_all_rows() {
    let stats = FakeStats {
        rows: vec![
            stat_row(1, None, None, 41000.0),
            stat_row(2, Some("BCM2711"), None, 9000.0),
        ],
        ..Default::default()
    };
    let app = build_app_with_stats(test_settings(), stats);

    let (status, body) = app
        .get(
            "/api/v1/stats/by-test?test_name=7zip_4t&group_by=architecture",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_stats_by_test_rejects_unknown_group_by() {
    let app = build_app(test_settings());
    let (status, body) = app
        .get(
            "/api/v1/stats/by-test?test_name=7zip_4t&group_by=hostname",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_available_cpus_and_systems() {
    let app = build_app(test_settings());

    let (status, body) = app.get("/api/v1/stats/available-cpus", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["cpu_model"], "AMD Ryzen 9 5950X");

    let (status, body) = app.get("/api/v1/stats/available-systems", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["system_type"], "Dell Inc. XPS 13 9310");
}
