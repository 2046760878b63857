use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{TargetsResponse, UserTargets};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/targets", get(get_targets).put(put_targets))
}

fn respond(targets: UserTargets) -> Json<TargetsResponse> {
    Json(TargetsResponse {
        macro_targets: targets.macro_targets(),
        targets,
    })
}

#[instrument(skip(state))]
pub async fn get_targets(State(state): State<AppState>) -> Json<TargetsResponse> {
    respond(state.session.lock().await.targets())
}

/// Replaces the targets in the session; persistence follows once edits settle.
#[instrument(skip(state))]
pub async fn put_targets(
    State(state): State<AppState>,
    Json(targets): Json<UserTargets>,
) -> Json<TargetsResponse> {
    let mut session = state.session.lock().await;
    session.set_targets(targets);
    // autosave order must match session order
    state.autosave.notify(targets);
    drop(session);
    respond(targets)
}
