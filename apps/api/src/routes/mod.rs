pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::discovery::handlers as discovery;
use crate::matching::handlers as matching;
use crate::parsing::handlers as parsing;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jd/parse", post(parsing::handle_parse_jd))
        .route("/api/v1/match/score", post(matching::handle_score))
        .route(
            "/api/v1/discover/resumes",
            post(discovery::handle_discover_resumes),
        )
        .route(
            "/api/v1/discover/linkedin",
            post(discovery::handle_discover_profiles),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    use super::*;
    use crate::config::Config;
    use crate::providers::HashingEmbedder;
    use crate::test_support::{hit, profile_hit, FakeFetcher, FakeSearch};

    const RESUME: &str = "Ada Lovelace\nPython and SQL engineer building data pipelines.\n";

    fn app_with(search: FakeSearch, fetcher: FakeFetcher, results_dir: Option<PathBuf>) -> Router {
        let state = AppState::new(
            Config::for_tests(results_dir),
            Arc::new(search),
            Arc::new(fetcher),
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap();
        build_router(state)
    }

    fn app() -> Router {
        app_with(FakeSearch::new(vec![]), FakeFetcher::default(), None)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["embedder"], "hashing");
    }

    #[tokio::test]
    async fn test_parse_jd_route() {
        let (status, body) = post_json(
            app(),
            "/api/v1/jd/parse",
            json!({"jd_text": "Senior Python Engineer\n- Build APIs with Django and PostgreSQL"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jd"]["seniority_level"], "senior");
        assert!(body["jd"]["skills"].as_array().unwrap().contains(&json!("django")));
    }

    #[tokio::test]
    async fn test_parse_jd_rejects_empty_text() {
        let (status, body) = post_json(app(), "/api/v1/jd/parse", json!({"jd_text": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_score_route_normalizes_both_sides() {
        let (status, body) = post_json(
            app(),
            "/api/v1/match/score",
            json!({
                "jd": {"skills": ["Python", "SQL", "Docker"], "seniority_level": "Senior", "domain": "data"},
                "candidate": {"name": "Ada", "raw_text": "python and sql", "skills": ["python ", "SQL"]}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["matched_skills"], json!(["python", "sql"]));
        assert_eq!(body["report"]["missing_skills"], json!(["docker"]));
    }

    #[tokio::test]
    async fn test_score_route_rejects_malformed_jd() {
        let (status, _) = post_json(
            app(),
            "/api/v1/match/score",
            json!({"jd": {"skills": "python"}, "candidate": {"name": "A", "raw_text": "x"}}),
        )
        .await;
        assert!(status.is_client_error(), "status was {status}");
    }

    #[tokio::test]
    async fn test_discover_resumes_route() {
        let dir = tempfile::tempdir().unwrap();
        let search = FakeSearch::new(vec![Ok(vec![hit("https://cv.example.com/ada.txt")])]);
        let fetcher = FakeFetcher::new([("https://cv.example.com/ada.txt", RESUME)]);
        let app = app_with(search, fetcher, Some(dir.path().to_path_buf()));

        let (status, body) = post_json(
            app,
            "/api/v1/discover/resumes",
            json!({"jd_text": "Data Engineer\n- Python and SQL pipelines", "max_downloads": 3}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reports"][0]["candidate_name"], "Ada Lovelace");
        assert_eq!(body["stats"]["fetch_attempts"], 1);

        let run_id = body["run_id"].as_str().unwrap();
        assert!(dir.path().join(format!("resumes-{run_id}.json")).exists());
    }

    #[tokio::test]
    async fn test_discover_resumes_rejects_zero_downloads() {
        let (status, body) = post_json(
            app(),
            "/api/v1/discover/resumes",
            json!({"jd_text": "Python engineer", "max_downloads": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_discover_requires_a_jd() {
        let (status, _) = post_json(app(), "/api/v1/discover/linkedin", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_outage_is_503() {
        let app = app_with(FakeSearch::failing(), FakeFetcher::default(), None);
        let (status, body) =
            post_json(app, "/api/v1/discover/resumes", json!({"jd_text": "Python engineer"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "PROVIDER_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_discover_linkedin_route() {
        let search = FakeSearch::new(vec![Ok(vec![profile_hit(
            "Jane Doe - Java backend engineer | LinkedIn",
            "",
            "https://www.linkedin.com/in/jane",
        )])]);
        let app = app_with(search, FakeFetcher::default(), None);

        let (status, body) = post_json(
            app,
            "/api/v1/discover/linkedin",
            json!({"jd": {"skills": ["Java", "Spring"], "seniority_level": "senior", "domain": "backend"}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reports"][0]["name"], "Jane Doe");
        assert_eq!(body["reports"][0]["match_score"], 50);
    }
}
