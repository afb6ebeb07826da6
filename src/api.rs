use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::{
    generator::{self, MODEL_UNAVAILABLE},
    types::{ErrorResponse, HealthResponse, QueryRequest, QueryResponse, Source},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `POST /query`: predefined answers first, model generation on a miss.
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_message(&rejection)),
    };
    if req.query.is_empty() {
        return bad_request("No query provided");
    }
    tracing::info!(query = %req.query, "received query");

    if let Some(answer) = state.qa.lookup(&req.query) {
        return answer_response(answer.to_string(), Source::Predefined);
    }

    let Some(runtime) = state.runtime.clone() else {
        return answer_response(MODEL_UNAVAILABLE.to_string(), Source::Model);
    };

    let query = req.query.clone();
    let generation =
        tokio::task::spawn_blocking(move || generator::generate(&runtime, &query));
    match tokio::time::timeout(state.settings.generation_timeout, generation).await {
        Ok(Ok(Ok(text))) => answer_response(text, Source::Model),
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "generation failed");
            server_error("Failed to generate a response")
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "generation task panicked");
            server_error("Failed to generate a response")
        }
        Err(_) => {
            tracing::error!(timeout = ?state.settings.generation_timeout, "generation timed out");
            server_error("Generation timed out")
        }
    }
}

/// `GET /health`: process liveness plus whether the model is loaded.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model_status = if state.model_loaded() { "loaded" } else { "not loaded" };
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_status: model_status.to_string(),
    })
}

fn rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        // valid JSON of the wrong shape: there is no usable query field
        JsonRejection::JsonDataError(_) => "No query provided",
        _ => "Request must be JSON",
    }
}

fn answer_response(response: String, source: Source) -> Response {
    (StatusCode::OK, Json(QueryResponse { response, source })).into_response()
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
}

fn server_error(msg: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(msg))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::qa::{QaEntry, QaStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let qa = QaStore::new(vec![QaEntry {
            question: "What are the admission requirements?".into(),
            answer: "See the admissions page.".into(),
        }]);
        let state = Arc::new(AppState::new(None, qa, Settings::default()));
        create_router(state)
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predefined_match_answers_from_store() {
        let response = test_app()
            .oneshot(json_post(r#"{"query": "admission requirements"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "See the admissions page.");
        assert_eq!(body["source"], "predefined");
    }

    #[tokio::test]
    async fn fallback_without_model_returns_fixed_message() {
        let response = test_app()
            .oneshot(json_post(r#"{"query": "What is the weather today?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Model is not loaded. Please check the setup.");
        assert_eq!(body["source"], "model");
    }

    #[tokio::test]
    async fn missing_query_field_is_rejected() {
        let response = test_app().oneshot(json_post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No query provided");
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let response = test_app()
            .oneshot(json_post(r#"{"query": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No query provided");
    }

    #[tokio::test]
    async fn non_json_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "text/plain")
            .body(Body::from("admission requirements"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Request must be JSON");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let response = test_app().oneshot(json_post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Request must be JSON");
    }

    #[tokio::test]
    async fn same_query_classifies_the_same_both_times() {
        for _ in 0..2 {
            let response = test_app()
                .oneshot(json_post(r#"{"query": "admission requirements"}"#))
                .await
                .unwrap();
            let body = body_json(response).await;
            assert_eq!(body["source"], "predefined");
        }
    }

    #[tokio::test]
    async fn health_reports_model_absence() {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_status"], "not loaded");
    }
}
