//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partbridge_api::{AppState, build_app};
use partbridge_converter::ConversionProcessor;
use partbridge_core::config::{AppConfig, StorageProviderKind};
use partbridge_core::error::AppError;
use partbridge_core::result::AppResult;
use partbridge_core::traits::project::ProjectRecordStore;
use partbridge_core::traits::storage::{ObjectStore, UploadOptions};
use partbridge_core::types::ProjectId;
use partbridge_storage::providers::LocalObjectStore;

/// Bucket used by every test.
pub const BUCKET: &str = "project-files";

/// Project records kept in memory.
#[derive(Debug, Default)]
pub struct MemoryProjectRecords {
    previews: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
}

impl MemoryProjectRecords {
    /// Preview key recorded for a project.
    pub fn preview_of(&self, project_id: &str) -> Option<String> {
        self.previews.lock().unwrap().get(project_id).cloned()
    }

    /// Make the health check fail as if the database were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectRecordStore for MemoryProjectRecords {
    async fn set_preview_key(&self, project_id: &ProjectId, preview_key: &str) -> AppResult<()> {
        self.previews
            .lock()
            .unwrap()
            .insert(project_id.to_string(), preview_key.to_string());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::database("connection refused"));
        }
        Ok(true)
    }
}

/// Response captured from the router.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.raw).unwrap()
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Stand-in for the conversion job API
    pub conversion_api: MockServer,
    /// Object store behind the pipeline
    pub store: Arc<LocalObjectStore>,
    /// Project records behind the pipeline
    pub records: Arc<MemoryProjectRecords>,
    /// Root cancellation token of the app
    pub shutdown: CancellationToken,
    storage_dir: TempDir,
}

impl TestApp {
    /// App with a configured API key and a 3-check polling ceiling.
    pub async fn new() -> Self {
        Self::with_api_key("cc-test-key").await
    }

    /// App with the given conversion API key.
    pub async fn with_api_key(api_key: &str) -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let conversion_api = MockServer::start().await;

        let mut config = AppConfig::default();
        config.storage.provider = StorageProviderKind::Local;
        config.storage.local.root_path = storage_dir.path().to_string_lossy().to_string();
        config.conversion.api_base_url = conversion_api.uri();
        config.conversion.api_key = api_key.to_string();
        config.conversion.poll_interval_ms = 1;
        config.conversion.max_poll_attempts = 3;

        let store = Arc::new(LocalObjectStore::new(storage_dir.path()).await.unwrap());
        let records = Arc::new(MemoryProjectRecords::default());
        let processor = ConversionProcessor::new(
            &config.conversion,
            &config.storage,
            store.clone(),
            records.clone(),
        )
        .unwrap();

        let shutdown = CancellationToken::new();
        let router = build_app(AppState::new(config, processor, shutdown.clone()));

        Self {
            router,
            conversion_api,
            store,
            records,
            shutdown,
            storage_dir,
        }
    }

    /// Put a source file into the bucket.
    pub async fn seed_source(&self, key: &str, data: &'static [u8]) {
        self.store
            .upload(
                BUCKET,
                key,
                Bytes::from_static(data),
                &UploadOptions::upsert("application/octet-stream"),
            )
            .await
            .unwrap();
    }

    /// Root directory of the local object store.
    pub fn storage_root(&self) -> &Path {
        self.storage_dir.path()
    }

    /// Read an object back from the bucket.
    pub async fn stored(&self, key: &str) -> Option<Bytes> {
        self.store.download(BUCKET, key).await.ok()
    }

    /// Send a request through the full middleware stack.
    pub async fn request(&self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let raw = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse { status, headers, raw }
    }

    /// POST a conversion request.
    pub async fn convert(&self, project_id: &str, file_name: &str) -> TestResponse {
        let body = json!({ "projectId": project_id, "fileName": file_name });
        self.request(Method::POST, "/convert-cad", Some(body.to_string()))
            .await
    }

    /// Job API that accepts the job and the upload, reports `final_job` on
    /// every status check, and serves `output` at the export URL.
    pub async fn mount_job_api(&self, final_job: Value, output: &'static [u8]) {
        let server = &self.conversion_api;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {
                    "id": "job-1",
                    "status": "waiting",
                    "tasks": [{
                        "name": "import-file",
                        "operation": "import/upload",
                        "status": "waiting",
                        "result": {
                            "form": {
                                "url": format!("{}/upload/job-1", server.uri()),
                                "parameters": { "expires": 1700000000, "signature": "sig" }
                            }
                        }
                    }]
                }
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload/job-1"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_job))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/output/preview.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(output.to_vec()))
            .mount(server)
            .await;
    }

    /// Job API whose job finishes on the first status check.
    pub async fn mount_successful_job(&self, output: &'static [u8]) {
        let finished = self.finished_job();
        self.mount_job_api(finished, output).await;
    }

    /// A finished job whose export points at the mock output.
    pub fn finished_job(&self) -> Value {
        json!({
            "data": {
                "id": "job-1",
                "status": "finished",
                "tasks": [{
                    "name": "export-file",
                    "operation": "export/url",
                    "status": "finished",
                    "result": {
                        "files": [{
                            "filename": "preview.png",
                            "url": format!("{}/output/preview.png", self.conversion_api.uri())
                        }]
                    }
                }]
            }
        })
    }
}
