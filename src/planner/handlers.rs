use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::session::SessionSnapshot;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}

/// A failed target write is reported here until a later write succeeds.
#[instrument(skip(state))]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut snapshot = state.session.lock().await.snapshot();
    if snapshot.notice.is_none() {
        snapshot.notice = state.autosave.failure();
    }
    Json(snapshot)
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use crate::analysis::client::testing::ScriptedService;
    use crate::app::build_app;
    use crate::state::testing::{fake, fake_with};
    use crate::storage::testing::FlakyStore;
    use crate::targets::services::TARGETS_SAVE_FAILED;

    async fn session_json(app: &axum::Router) -> serde_json::Value {
        let res = app
            .clone()
            .oneshot(Request::get("/api/v1/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn fresh_session_is_idle() {
        let app = build_app(fake(Arc::new(ScriptedService::default())).await);
        let json = session_json(&app).await;
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["canAnalyze"], false);
        assert_eq!(json["analysisInFlight"], false);
        assert!(json.get("notice").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_target_write_shows_as_notice() {
        let kv = Arc::new(FlakyStore::default());
        kv.set_fail_writes(true);
        let app = build_app(fake_with(kv.clone(), Arc::new(ScriptedService::default())).await);

        let res = app
            .clone()
            .oneshot(
                Request::put("/api/v1/targets")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"dailyCalories":1900,"proteinGoal":100}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(res.status().is_success());

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(kv.write_count(), 1);
        assert_eq!(session_json(&app).await["notice"], TARGETS_SAVE_FAILED);

        kv.set_fail_writes(false);
        app.clone()
            .oneshot(
                Request::put("/api/v1/targets")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"dailyCalories":2000,"proteinGoal":100}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(session_json(&app).await.get("notice").is_none());
    }
}
