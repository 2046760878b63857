use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::metrics::AnalysisView;
use crate::error::reject;
use crate::planner::services::{current_view, run_analysis};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/analysis", get(get_analysis).post(analyze))
}

/// Runs one analysis cycle over the current meals and targets.
#[instrument(skip(state))]
pub async fn analyze(
    State(state): State<AppState>,
) -> Result<Json<AnalysisView>, (StatusCode, String)> {
    let view = run_analysis(&state).await.map_err(reject)?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn get_analysis(
    State(state): State<AppState>,
) -> Result<Json<AnalysisView>, (StatusCode, String)> {
    current_view(&state)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No analysis yet".into()))
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::analysis::client::testing::ScriptedService;
    use crate::analysis::validator::validator_tests::SAMPLE_REPLY;
    use crate::app::build_app;
    use crate::error::ANALYSIS_RETRY_HINT;
    use crate::state::testing::fake;

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn analysis_round_trip_over_http() {
        let service = Arc::new(ScriptedService::replying(vec![Ok(SAMPLE_REPLY.to_string())]));
        let app = build_app(fake(service).await);

        let res = app
            .clone()
            .oneshot(Request::get("/api/v1/analysis").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.clone().oneshot(post("/api/v1/analysis", "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        app.clone()
            .oneshot(
                Request::put("/api/v1/meals")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"lunch":"chicken salad"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let res = app.clone().oneshot(post("/api/v1/analysis", "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["analysis"]["mealBreakdown"]["lunch"]["rating"], "excellent");
        assert!(json.get("calorieDistribution").is_none());

        let res = app
            .oneshot(Request::get("/api/v1/analysis").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn failed_analysis_returns_hint() {
        let service = Arc::new(ScriptedService::replying(vec![Ok("not json".into())]));
        let app = build_app(fake(service).await);
        app.clone()
            .oneshot(
                Request::put("/api/v1/meals")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"dinner":"pasta"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let res = app.oneshot(post("/api/v1/analysis", "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), ANALYSIS_RETRY_HINT);
    }
}
