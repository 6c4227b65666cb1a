#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use grantdesk::config::{
    AdminConfig, AdminCredential, Config, DatabaseConfig, IntakeConfig, SmtpConfig, StorageConfig,
};
use grantdesk::db::SubmissionRepository;
use grantdesk::email::{Email, Mailer};
use grantdesk::models::{Inserted, NewSubmission, Submission, Track};
use grantdesk::state::{AppState, SharedState};
use grantdesk::storage::{ObjectStore, PutOptions};

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

// ── Fakes ───────────────────────────────────────────────────────

/// In-memory datastore with the same idempotency-key semantics as the
/// Postgres table.
#[derive(Default)]
pub struct FakeRepo {
    rows: Mutex<Vec<Submission>>,
    next_id: Mutex<Option<i64>>,
    pub fail_insert: AtomicBool,
    pub fail_list: AtomicBool,
    pub inserts: AtomicUsize,
}

impl FakeRepo {
    /// The next inserted row gets this identifier.
    pub fn set_next_id(&self, id: i64) {
        *self.next_id.lock().unwrap() = Some(id);
    }

    pub fn rows(&self) -> Vec<Submission> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionRepository for FakeRepo {
    async fn insert(&self, record: &NewSubmission) -> Result<Inserted, String> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err("connection refused".to_string());
        }

        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter()
            .find(|r| r.idempotency_key.as_deref() == Some(record.idempotency_key.as_str()))
        {
            return Ok(Inserted {
                id: existing.id,
                created_at: existing.created_at,
                duplicate: true,
            });
        }

        let id = self
            .next_id
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| rows.iter().map(|r| r.id).max().unwrap_or(0) + 1);
        let created_at = Utc::now();
        rows.push(Submission {
            id,
            track: record.track.as_str().to_string(),
            applicant_name: record.applicant_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            payload_json: record.payload.clone(),
            uploads_json: record.uploads.clone(),
            idempotency_key: Some(record.idempotency_key.clone()),
            created_at,
        });

        Ok(Inserted {
            id,
            created_at,
            duplicate: false,
        })
    }

    async fn list(&self, track: Option<Track>) -> Result<Vec<Submission>, String> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err("connection refused".to_string());
        }
        let mut rows: Vec<Submission> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| track.is_none_or(|t| r.track == t.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub len: usize,
    pub options: PutOptions,
}

/// Object store that records writes and hands back predictable URLs.
#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<Vec<StoredObject>>,
    pub fail_put: AtomicBool,
    pub fail_sign: AtomicBool,
    pub fail_public: AtomicBool,
    pub puts: AtomicUsize,
}

impl FakeStore {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> Result<(), String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err("storage unavailable".to_string());
        }
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            len: data.len(),
            options: options.clone(),
        });
        Ok(())
    }

    async fn sign(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, String> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err("signing not permitted".to_string());
        }
        Ok(format!(
            "https://storage.test/sign/{bucket}/{key}?ttl={}",
            ttl.as_secs()
        ))
    }

    async fn public_url(&self, bucket: &str, key: &str) -> Result<String, String> {
        if self.fail_public.load(Ordering::SeqCst) {
            return Err("bucket is private".to_string());
        }
        Ok(format!("https://storage.test/public/{bucket}/{key}"))
    }
}

/// Mailer that records every message it is asked to send.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<Email>>,
    pub fail: AtomicBool,
    pub attempts: AtomicUsize,
}

impl FakeMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &Email) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(email.clone());
        true
    }
}

// ── Config ──────────────────────────────────────────────────────

pub fn eastern() -> Tz {
    chrono_tz::America::New_York
}

/// All windows open far into the future, plain admin password.
pub fn test_config() -> Config {
    let tz = eastern();
    let far = tz.with_ymd_and_hms(2099, 12, 31, 23, 59, 0).unwrap();
    Config {
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            service_url: None,
        },
        session_secret: "test-session-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 5 * 1024 * 1024,
        log_level: "warn".to_string(),
        intake: IntakeConfig {
            timezone: tz,
            org_deadline: Some(far),
            student_deadline: Some(far),
            poster_deadline: None,
            cc_email: "nhcma@lutinemanagement.com".to_string(),
            signed_url_ttl_secs: 604_800,
        },
        storage: StorageConfig {
            url: "https://storage.test".to_string(),
            anon_key: "anon".to_string(),
            service_key: None,
            grants_bucket: "nhcma-uploads".to_string(),
            posters_bucket: "nhcma-posters".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.test".to_string(),
            port: 587,
            user: None,
            pass: None,
            from: None,
            from_name: "NHCMA Foundation".to_string(),
        },
        admin: AdminConfig {
            credential: Some(AdminCredential::Plain(ADMIN_PASSWORD.to_string())),
            session_minutes: 60,
        },
    }
}

// ── Fixtures ────────────────────────────────────────────────────

pub fn organization_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("org_name", "Elm City Free Clinic"),
        ("applicant_name", "Ada Lovelace"),
        ("email", "ada@example.org"),
        ("phone", "203-555-0100"),
        ("project_title", "Mobile Vaccination Van"),
        ("budget_total", "5000"),
        ("elig_nonprofit", "on"),
        ("elig_report", "on"),
        ("elig_benefit", "on"),
    ]
}

pub fn student_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("applicant_name", "Grace Hopper"),
        ("school", "Yale School of Medicine"),
        ("email", "grace.hopper@yale.edu"),
        ("phone", "203-555-0111"),
        ("project_title", "Asthma Outreach in Fair Haven"),
        ("elig_enrolled", "on"),
        ("elig_report", "on"),
    ]
}

pub fn poster_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("category", "Resident"),
        ("lead_author", "Katherine Johnson"),
        ("contact_email", "kj@example.org"),
        ("title", "Sepsis Screening in the ED"),
        ("abstract", "We describe a quality improvement project."),
    ]
}

pub fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

// ── Running app ─────────────────────────────────────────────────

/// A running test server wired to in-memory collaborators.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub repo: Arc<FakeRepo>,
    pub store: Arc<FakeStore>,
    pub mailer: Arc<FakeMailer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit form-urlencoded data to the JSON intake endpoint.
    pub async fn submit_form(&self, track: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/submissions/{track}")))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn submit_json(&self, track: &str, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/submissions/{track}")))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/admin/login"))
            .json(&json!({ "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Log in with the configured password and return the bearer token.
    pub async fn admin_token(&self) -> String {
        let (body, status) = self.login(ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub struct Fakes {
    pub repo: Arc<FakeRepo>,
    pub store: Arc<FakeStore>,
    pub mailer: Arc<FakeMailer>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            repo: Arc::new(FakeRepo::default()),
            store: Arc::new(FakeStore::default()),
            mailer: Arc::new(FakeMailer::default()),
        }
    }

    pub fn state(&self, config: Config) -> SharedState {
        AppState::new(
            config,
            self.repo.clone(),
            self.store.clone(),
            self.mailer.clone(),
        )
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let fakes = Fakes::new();
    let state = fakes.state(config);
    let app = grantdesk::build_app(state.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        state,
        repo: fakes.repo,
        store: fakes.store,
        mailer: fakes.mailer,
    }
}
