use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::analyzer::{self, AnalysisResult, AnalyzeError};

#[derive(Clone)]
pub struct AppState {
    pub file_path: Arc<PathBuf>,
    pub workers: usize,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    success: bool,
    message: String,
    data: AnalysisResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: &'static str,
    file: String,
    file_size: Option<u64>,
    workers: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(frontend))
        .route("/healthz", get(healthz))
        .route("/api/status", get(status))
        .route("/api/analyze", post(analyze))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn frontend() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let file_size = std::fs::metadata(state.file_path.as_ref())
        .ok()
        .map(|meta| meta.len());
    Json(StatusResponse {
        status: if file_size.is_some() { "ready" } else { "missing" },
        file: state.file_path.display().to_string(),
        file_size,
        workers: state.workers,
    })
}

async fn analyze(State(state): State<AppState>) -> Result<Response, ApiError> {
    let path = Arc::clone(&state.file_path);
    let workers = state.workers;

    // The scan phase is CPU- and IO-bound; keep it off the async runtime.
    let result = tokio::task::spawn_blocking(move || {
        analyzer::analyze_with_workers(&path, workers)
    })
    .await
    .map_err(|err| {
        error!("analysis task failed to complete: {err}");
        ApiError::Internal
    })??;

    Ok(Json(AnalyzeResponse {
        success: true,
        message: "analysis completed".to_string(),
        data: result,
    })
    .into_response())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Analysis(#[from] AnalyzeError),
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Analysis(AnalyzeError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "message": format!("analysis failed: {self}"),
        }));
        (status, body).into_response()
    }
}

const INDEX_HTML: &str = r#"
<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Word Frequency Analyzer</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet">
  <style>
    body { background: #f8f9fa; }
    .stat-value { font-size: 1.5rem; font-weight: 600; }
    .stat-label { font-size: 0.85rem; }
    .results-table { max-height: 60vh; overflow-y: auto; }
    .rank-col { width: 4rem; }
    .count-col { width: 8rem; }
  </style>
</head>
<body class="py-4">
  <div class="container">
    <div class="d-flex justify-content-between align-items-center mb-3">
      <div>
        <h1 class="h4 mb-0">Word Frequency Analyzer</h1>
        <div id="corpus" class="small text-muted">Checking corpus…</div>
      </div>
      <button id="analyzeBtn" class="btn btn-primary btn-lg">Analyze</button>
    </div>

    <div id="alert" class="alert alert-danger d-none" role="alert"></div>

    <div id="stats" class="row g-3 mb-4 d-none">
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="totalWords" class="stat-value">–</div>
        <div class="stat-label text-muted">Total words</div>
      </div></div></div>
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="uniqueWords" class="stat-value">–</div>
        <div class="stat-label text-muted">Unique words</div>
      </div></div></div>
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="fileSize" class="stat-value">–</div>
        <div class="stat-label text-muted">File size</div>
      </div></div></div>
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="processingTime" class="stat-value">–</div>
        <div class="stat-label text-muted">Scan time</div>
      </div></div></div>
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="totalTime" class="stat-value">–</div>
        <div class="stat-label text-muted">Total time</div>
      </div></div></div>
      <div class="col-6 col-md-2"><div class="card shadow-sm"><div class="card-body text-center">
        <div id="rate" class="stat-value">–</div>
        <div class="stat-label text-muted">Words / s</div>
      </div></div></div>
    </div>

    <div class="card shadow-sm">
      <div class="card-body">
        <h2 class="h5">Top words</h2>
        <div id="status" class="text-muted mb-2">Run an analysis to see results.</div>
        <div class="results-table">
          <table class="table table-sm table-striped mb-0">
            <thead><tr>
              <th class="rank-col">#</th><th>Word</th><th class="count-col text-end">Count</th>
            </tr></thead>
            <tbody id="resultsBody"></tbody>
          </table>
        </div>
      </div>
    </div>
  </div>

  <script>
    const analyzeBtn = document.getElementById('analyzeBtn');
    const corpusEl = document.getElementById('corpus');
    const statusEl = document.getElementById('status');
    const statsEl = document.getElementById('stats');
    const alertEl = document.getElementById('alert');
    const resultsBody = document.getElementById('resultsBody');

    function formatBytes(bytes) {
      if (bytes < 1024) return bytes + ' B';
      if (bytes < 1024 * 1024) return (bytes / 1024).toFixed(2) + ' KB';
      return (bytes / (1024 * 1024)).toFixed(2) + ' MB';
    }

    function showError(message) {
      alertEl.textContent = message;
      alertEl.classList.remove('d-none');
    }

    async function loadStatus() {
      try {
        const res = await fetch('/api/status');
        const body = await res.json();
        if (body.status === 'ready') {
          corpusEl.textContent = body.file + ' (' + formatBytes(body.fileSize) +
            ', ' + body.workers + ' workers)';
        } else {
          corpusEl.textContent = body.file + ' is missing';
          analyzeBtn.disabled = true;
        }
      } catch (err) {
        corpusEl.textContent = 'status unavailable';
      }
    }

    function render(data) {
      document.getElementById('totalWords').textContent = data.totalWords.toLocaleString();
      document.getElementById('uniqueWords').textContent = data.uniqueWords.toLocaleString();
      document.getElementById('fileSize').textContent = formatBytes(data.fileSize);
      document.getElementById('processingTime').textContent = data.processingTimeMs + ' ms';
      document.getElementById('totalTime').textContent = data.totalTimeMs + ' ms';
      document.getElementById('rate').textContent = Math.round(data.wordsPerSecond).toLocaleString();
      statsEl.classList.remove('d-none');

      resultsBody.innerHTML = '';
      data.topWords.forEach((entry, i) => {
        const row = document.createElement('tr');
        row.innerHTML = '<td>' + (i + 1) + '</td><td>' + entry.word +
          '</td><td class="text-end">' + entry.count.toLocaleString() + '</td>';
        resultsBody.appendChild(row);
      });
      statusEl.textContent = data.complete
        ? data.topWords.length + ' words ranked.'
        : data.topWords.length + ' words ranked (partial: some chunks failed to read).';
    }

    async function analyze() {
      analyzeBtn.disabled = true;
      alertEl.classList.add('d-none');
      statusEl.textContent = 'Analyzing…';
      try {
        const res = await fetch('/api/analyze', { method: 'POST' });
        const body = await res.json();
        if (!body.success) {
          statusEl.textContent = 'Analysis failed.';
          showError(body.message);
          return;
        }
        render(body.data);
      } catch (err) {
        statusEl.textContent = 'Analysis failed.';
        showError(String(err));
      } finally {
        analyzeBtn.disabled = false;
      }
    }

    analyzeBtn.addEventListener('click', analyze);
    loadStatus();
  </script>
</body>
</html>
"#;
