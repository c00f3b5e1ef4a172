//! Test harness for fids-board integration tests
//!
//! Provides a TestApp wrapper with:
//! - Temp-file SQLite database for isolation
//! - A recording audio sink injected into the scheduler
//! - Request helpers driving the router via tower::ServiceExt

// Each test binary uses a subset of the harness
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use fids_board::announce::{AnnouncementScheduler, SchedulerHandle};
use fids_board::api::{create_router, AppContext};
use fids_board::audio::{AudioSink, ClipRequest};
use fids_board::db;
use fids_board::Result;
use fids_common::events::EventBus;
use fids_common::Role;
use http_body_util::BodyExt;
use sqlx::{Pool, Sqlite};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// Sink that records playback requests instead of touching audio files
#[derive(Default)]
pub struct RecordingSink {
    played: Mutex<Vec<ClipRequest>>,
}

impl RecordingSink {
    pub fn played(&self) -> Vec<ClipRequest> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, clip: ClipRequest) -> Result<()> {
        self.played.lock().unwrap().push(clip);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db_pool: Pool<Sqlite>,
    pub bus: EventBus,
    pub sink: Arc<RecordingSink>,
    pub scheduler: SchedulerHandle,
    pub admin_id: Uuid,
    pub operator_id: Uuid,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Create a test app with a seeded admin and one operator limited
    /// to the BEG board
    pub async fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_pool = db::init::connect(&temp_dir.path().join("test_fids.db")).await?;
        db::init::init_schema(&db_pool).await?;
        db::init::seed_admin(&db_pool).await?;

        let operator = db::users::create(
            &db_pool,
            "ops@fids.local",
            "operator",
            Role::Operator,
            &["BEG".to_string()],
        )
        .await?;

        let admin = db::users::list(&db_pool)
            .await?
            .into_iter()
            .find(|u| u.role == Role::Admin)
            .expect("seeded admin");

        let bus = EventBus::new(64);
        let sink = Arc::new(RecordingSink::default());
        let scheduler = AnnouncementScheduler::spawn(db_pool.clone(), sink.clone(), bus.clone());

        let ctx = AppContext {
            db_pool: db_pool.clone(),
            bus: bus.clone(),
            scheduler: scheduler.clone(),
        };

        Ok(Self {
            router: create_router(ctx),
            db_pool,
            bus,
            sink,
            scheduler,
            admin_id: admin.id,
            operator_id: operator.id,
            _temp_dir: temp_dir,
        })
    }

    /// Log in and return the session token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin@fids.local", "admin").await
    }

    pub async fn operator_token(&self) -> String {
        self.login("ops@fids.local", "operator").await
    }

    /// Drive one request through the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }
}

/// A flight ingest payload departing `minutes_from_now` minutes out
pub fn flight_payload(
    flight_number: &str,
    airport: &str,
    minutes_from_now: i64,
) -> serde_json::Value {
    let departure = fids_common::time::now() + chrono::Duration::minutes(minutes_from_now);
    serde_json::json!({
        "flight_number": flight_number,
        "origin_airport": airport,
        "destination_airport": "JFK",
        "scheduled_time": departure,
        "status": "SCHEDULED",
        "gate": "14",
        "terminal": "2",
        "aircraft_type": "A320",
        "airport_code": airport,
    })
}
