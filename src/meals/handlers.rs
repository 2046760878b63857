use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{MealEntrySet, PatchMealRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/meals",
        get(get_meals)
            .put(put_meals)
            .patch(patch_meal)
            .delete(clear_meals),
    )
}

#[instrument(skip(state))]
pub async fn get_meals(State(state): State<AppState>) -> Json<MealEntrySet> {
    Json(state.session.lock().await.meals().clone())
}

#[instrument(skip(state))]
pub async fn put_meals(
    State(state): State<AppState>,
    Json(meals): Json<MealEntrySet>,
) -> Json<MealEntrySet> {
    let mut session = state.session.lock().await;
    session.set_meals(meals);
    Json(session.meals().clone())
}

/// Edits one meal field, leaving the others alone.
#[instrument(skip(state))]
pub async fn patch_meal(
    State(state): State<AppState>,
    Json(req): Json<PatchMealRequest>,
) -> Json<MealEntrySet> {
    let mut session = state.session.lock().await;
    session.set_meal(req.slot, req.text);
    Json(session.meals().clone())
}

/// "Plan another day": empties every field and drops the analysis.
#[instrument(skip(state))]
pub async fn clear_meals(State(state): State<AppState>) -> Json<MealEntrySet> {
    let mut session = state.session.lock().await;
    session.clear_meals();
    Json(session.meals().clone())
}
