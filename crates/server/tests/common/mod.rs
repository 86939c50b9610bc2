//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use inferbox_core::{RecognitionOutput, RecognizeError, RecognizeOptions, Recognizer};
use inferbox_server::{create_app, AppState, Staging};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tower::ServiceExt;

/// Handle for a gated recognition: `started` fires once the engine has read
/// the image, and the engine does not return until `release` is sent.
pub struct Gate {
    pub started: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct Held {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Recognizer driven by the uploaded bytes.
///
/// The image content is treated as the word to "recognise":
/// - `BLANK` yields no output at all
/// - anything starting with `FAIL` yields a `CliError`
/// - any other word yields one PaddleOCR-style detection line for that word
#[derive(Default)]
pub struct FakeRecognizer {
    gates: Mutex<HashMap<String, Held>>,
    langs: Mutex<Vec<String>>,
    completed: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next recognition of `word` until the returned gate is released.
    pub fn gate(&self, word: &str) -> Gate {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(
            word.to_string(),
            Held {
                started: started_tx,
                release: release_rx,
            },
        );
        Gate {
            started: started_rx,
            release: release_tx,
        }
    }

    /// Languages requested so far, in call order.
    pub fn langs(&self) -> Vec<String> {
        self.langs.lock().unwrap().clone()
    }

    /// Recognitions that ran to completion (successfully or not).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

pub fn detection_line(word: &str) -> String {
    format!("[[[0.0, 0.0], [40.0, 0.0], [40.0, 12.0], [0.0, 12.0]], ('{word}', 0.98)]\n")
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn recognize(
        &self,
        image: &Path,
        options: &RecognizeOptions,
    ) -> Result<RecognitionOutput, RecognizeError> {
        let bytes = tokio::fs::read(image)
            .await
            .map_err(|_| RecognizeError::MissingImage(image.display().to_string()))?;
        let word = String::from_utf8_lossy(&bytes).trim().to_string();
        self.langs.lock().unwrap().push(options.lang.clone());

        let held = self.gates.lock().unwrap().remove(&word);
        if let Some(held) = held {
            let _ = held.started.send(());
            let _ = held.release.await;
        }

        let result = if word.starts_with("FAIL") {
            Err(RecognizeError::CliError("engine exploded".to_string()))
        } else if word == "BLANK" {
            Ok(RecognitionOutput::from_raw(""))
        } else {
            Ok(RecognitionOutput::from_raw(detection_line(&word)))
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn health_check(&self) -> Result<(), RecognizeError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A running app plus the pieces tests want to inspect.
pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub fake: Arc<FakeRecognizer>,
    pub stage: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limit(1024 * 1024)
    }

    pub fn with_limit(max_upload_bytes: usize) -> Self {
        let stage = TempDir::new().unwrap();
        let staging = Staging::new(stage.path(), "img.png");
        let fake = FakeRecognizer::new();
        let state = AppState::new(
            fake.clone(),
            staging,
            RecognizeOptions::default(),
        );
        let app = create_app(state.clone(), max_upload_bytes);
        Self {
            app,
            state,
            fake,
            stage,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: impl Into<Body>,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.request("GET", uri, Body::empty()).await
    }

    pub async fn post(&self, uri: &str, body: &'static str) -> (StatusCode, String) {
        self.request("POST", uri, body).await
    }

    pub async fn json(&self, uri: &str) -> serde_json::Value {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}: {body}");
        serde_json::from_str(&body).unwrap()
    }

    /// Submit a job and return its id.
    pub async fn submit_job(&self, uri: &str, body: &'static str) -> u64 {
        let (status, body) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{body}");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        json["jobId"].as_u64().unwrap()
    }

    /// Poll a job until it leaves pending/running.
    pub async fn wait_job(&self, id: u64) -> serde_json::Value {
        let uri = format!("/api/jobs/{id}");
        within_deadline(async {
            loop {
                let job = self.json(&uri).await;
                if job["status"] != "pending" && job["status"] != "running" {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }

    /// Poll `/get` until `pred` holds for the slot value.
    pub async fn wait_slot(&self, pred: impl Fn(&str) -> bool) -> String {
        within_deadline(async {
            loop {
                let (_, body) = self.get("/get").await;
                if pred(&body) {
                    return body;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }

    /// Wait until the fake has finished `n` recognitions.
    pub async fn wait_completed(&self, n: usize) {
        within_deadline(async {
            while self.fake.completed() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }

    /// Wait until no staged job or scratch files remain.
    pub async fn wait_stage_clean(&self) {
        within_deadline(async {
            while staged_files(self.stage.path()) > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }
}

/// Per-request files in the stage dir (the legacy image is not counted).
pub fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with("job-") || name.starts_with("recognize-")
        })
        .count()
}

/// Run `fut` with a 5 s cap.
pub async fn within_deadline<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("condition not reached in time")
}

/// Wait for a gated recognition to reach the engine.
pub async fn started(gate: &mut Gate) {
    tokio::time::timeout(Duration::from_secs(5), &mut gate.started)
        .await
        .expect("recognition did not start")
        .expect("gate dropped");
}
