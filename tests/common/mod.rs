//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_catalog`: a small catalog of past-paper names in the shapes seen upstream
//! - [`TempWorkspace`]: temp directory for catalog files and downloads
//! - [`FakeTelegram`]: local Bot API stand-in serving `getFile` and file downloads,
//!   counting requests so tests can assert on caching and de-duplication

#![allow(dead_code)] // Helpers used across different integration test crates

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use papervault::{CatalogEntry, TelegramFetcher};
use rstest::fixture;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub const TOKEN: &str = "test-token";

/// A temporary directory removed when dropped.
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content, creating parent directories.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }
}

#[fixture]
pub fn sample_catalog() -> Vec<CatalogEntry> {
    [
        ("Physics_2021_Paper.pdf", "phy-2021"),
        ("Chemistry_2021_Paper.pdf", "chem-2021"),
        ("Physics_2019_Paper.pdf", "phy-2019"),
        ("A/L Combined Maths 2020 Sinhala Marking Scheme.pdf", "cm-2020-si-ms"),
        ("Advanced Level Combined Maths 2020 English Paper.pdf", "cm-2020-en"),
        ("O/L Science 2018 Tamil Paper.pdf", "sci-2018-ta"),
        ("&lt;div&gt;Biology_2022_Sinhala&lt;/div&gt;.pdf", "bio-2022-si"),
        ("Grade 10 History Term Test.pdf", "hist-g10"),
    ]
    .into_iter()
    .map(|(name, id)| CatalogEntry::new(name, id))
    .collect()
}

/// Request counters shared with the fake server.
#[derive(Debug, Default)]
pub struct Counters {
    pub get_file: AtomicUsize,
    pub download: AtomicUsize,
}

/// A local Bot API stand-in.
///
/// Known ids: `doc1`, `doc2` (downloadable), `expired` (400 from getFile),
/// `vanished` (file path resolves but the download 404s) and `slow`
/// (getFile answers after two seconds).
pub struct FakeTelegram {
    pub addr: SocketAddr,
    pub counters: Arc<Counters>,
}

impl FakeTelegram {
    pub async fn spawn() -> Self {
        papervault::tracing::init();

        let counters = Arc::new(Counters::default());
        let app = Router::new()
            .route("/:bot/getFile", get(get_file))
            .route("/file/:bot/*path", get(download))
            .with_state(Arc::clone(&counters));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, counters }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn fetcher(&self) -> TelegramFetcher {
        self.fetcher_with(Some(TOKEN), Duration::from_secs(5))
    }

    pub fn fetcher_with(&self, token: Option<&str>, timeout: Duration) -> TelegramFetcher {
        TelegramFetcher::new(self.base_url(), token.map(str::to_string), timeout).unwrap()
    }

    pub fn get_file_calls(&self) -> usize {
        self.counters.get_file.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.counters.download.load(Ordering::SeqCst)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"})),
    )
        .into_response()
}

async fn get_file(
    State(counters): State<Arc<Counters>>,
    AxumPath(bot): AxumPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    counters.get_file.fetch_add(1, Ordering::SeqCst);
    if bot != format!("bot{TOKEN}") {
        return unauthorized();
    }

    let id = params.get("file_id").map(String::as_str).unwrap_or_default();
    match id {
        "doc1" | "doc2" | "vanished" => Json(json!({
            "ok": true,
            "result": {"file_id": id, "file_path": format!("documents/{id}.pdf")}
        }))
        .into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"ok": true, "result": {"file_path": "documents/slow.pdf"}})).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: invalid file_id"
            })),
        )
            .into_response(),
    }
}

async fn download(
    State(counters): State<Arc<Counters>>,
    AxumPath((bot, path)): AxumPath<(String, String)>,
) -> Response {
    counters.download.fetch_add(1, Ordering::SeqCst);
    if bot != format!("bot{TOKEN}") {
        return unauthorized();
    }

    match path.trim_start_matches('/') {
        "documents/doc1.pdf" => b"%PDF-1 doc1".to_vec().into_response(),
        "documents/doc2.pdf" => b"%PDF-1 doc2".to_vec().into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
