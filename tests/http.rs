use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use wordanalyzer::handlers::{AppState, router};

fn make_state(contents: &str) -> (tempfile::TempDir, AppState) {
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("corpus.txt");
    std::fs::write(&path, contents).unwrap();
    let state = AppState {
        file_path: Arc::new(path),
        workers: 2,
    };
    (tempdir, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_ok() {
    let (_dir, state) = make_state("el sol\n");
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn frontend_serves_html() {
    let (_dir, state) = make_state("el sol\n");
    let app = router(state);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("<html"));
    assert!(page.contains("Word Frequency Analyzer"));
}

#[tokio::test]
async fn analyze_endpoint_returns_result() {
    let (_dir, state) = make_state("El Sol es una estrella. El Sol da luz.\n");
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["totalWords"], 5);
    assert_eq!(data["uniqueWords"], 3);
    assert_eq!(data["complete"], true);
    let top = data["topWords"].as_array().unwrap();
    assert_eq!(top[0]["word"], "sol");
    assert_eq!(top[0]["count"], 2);
}

#[tokio::test]
async fn analyze_missing_file_is_not_found() {
    let tempdir = tempfile::tempdir().unwrap();
    let state = AppState {
        file_path: Arc::new(tempdir.path().join("nope.txt")),
        workers: 2,
    };
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("not found")
    );
}

#[tokio::test]
async fn status_reports_corpus() {
    let contents = "el sol brilla\n";
    let (_dir, state) = make_state(contents);
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["fileSize"], contents.len() as u64);
    assert_eq!(body["workers"], 2);
}

#[tokio::test]
async fn status_reports_missing_corpus() {
    let tempdir = tempfile::tempdir().unwrap();
    let state = AppState {
        file_path: Arc::new(tempdir.path().join("nope.txt")),
        workers: 2,
    };
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "missing");
    assert!(body["fileSize"].is_null());
}

#[tokio::test]
async fn throttle_limits_forwarded_clients() {
    use axum::middleware;
    use wordanalyzer::{Throttle, throttle};

    let (_dir, state) = make_state("el sol\n");
    let limiter = Throttle::new(1, 1);
    let app = router(state).layer(middleware::from_fn_with_state(limiter, throttle::limit));

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
