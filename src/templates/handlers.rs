use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{debug, instrument};

use super::dto::{DeleteTemplateQuery, MealTemplate, SaveTemplateRequest, TemplateListing};
use crate::error::{reject, PlannerError};
use crate::meals::dto::MealEntrySet;
use crate::planner::session::PlannerSession;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/templates", get(list_templates))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", post(save_template))
        .route("/templates/:id/load", post(load_template))
        .route("/templates/:id", delete(delete_template))
}

/// The listing held by the session, with keys that failed to load at startup.
#[instrument(skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Json<TemplateListing> {
    let session = state.session.lock().await;
    Json(TemplateListing {
        templates: session.templates().to_vec(),
        skipped: session.skipped_templates().to_vec(),
    })
}

/// Saves the current meal texts under a name.
#[instrument(skip(state))]
pub async fn save_template(
    State(state): State<AppState>,
    Json(req): Json<SaveTemplateRequest>,
) -> Result<(StatusCode, Json<MealTemplate>), (StatusCode, String)> {
    let mut session = state.session.lock().await;
    let template = state
        .templates
        .save(&req.name, session.meals())
        .await
        .map_err(reject)?;
    session.add_template(template.clone());
    Ok((StatusCode::CREATED, Json(template)))
}

/// Makes sure `id` is in the session listing, fetching it from the store when
/// another process sharing the store saved it after startup.
async fn ensure_listed(
    state: &AppState,
    session: &mut PlannerSession,
    id: &str,
) -> Result<(), PlannerError> {
    if session.find_template(id).is_ok() {
        return Ok(());
    }
    let template = state.templates.get(id).await?;
    debug!(%id, "template fetched from store");
    session.add_template(template);
    Ok(())
}

#[instrument(skip(state))]
pub async fn load_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MealEntrySet>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    ensure_listed(&state, &mut session, &id)
        .await
        .map_err(reject)?;
    session.apply_template(&id).map_err(reject)?;
    Ok(Json(session.meals().clone()))
}

/// Deletes only with `?confirm=true`; the listing drops exactly that template.
#[instrument(skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<DeleteTemplateQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    if !q.confirm {
        return Err(reject(PlannerError::ConfirmationRequired));
    }
    ensure_listed(&state, &mut session, &id)
        .await
        .map_err(reject)?;
    state
        .templates
        .delete(&id, q.confirm)
        .await
        .map_err(reject)?;
    session.remove_template(&id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use tower::ServiceExt;

    use crate::analysis::client::testing::ScriptedService;
    use crate::app::build_app;
    use crate::state::testing::fake;
    use crate::storage::{KvStore, MemoryStore};
    use crate::templates::repo::TemplateStore;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn save_load_delete_cycle() {
        let app = build_app(fake(Arc::new(ScriptedService::default())).await);
        call(&app, "PUT", "/api/v1/meals", Some(r#"{"breakfast":"oats","snacks":"apple"}"#)).await;

        let res = call(&app, "POST", "/api/v1/templates", Some(r#"{"name":"  Workday  "}"#)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let saved = json(res).await;
        assert_eq!(saved["name"], "Workday");
        let id = saved["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("template:"));

        call(&app, "DELETE", "/api/v1/meals", None).await;
        let res = call(&app, "POST", &format!("/api/v1/templates/{id}/load"), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let meals = json(res).await;
        assert_eq!(meals["breakfast"], "oats");
        assert_eq!(meals["snacks"], "apple");

        let res = call(&app, "DELETE", &format!("/api/v1/templates/{id}"), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = call(&app, "DELETE", &format!("/api/v1/templates/{id}?confirm=true"), None).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let listing = json(call(&app, "GET", "/api/v1/templates", None).await).await;
        assert_eq!(listing["templates"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = build_app(fake(Arc::new(ScriptedService::default())).await);
        let res = call(&app, "POST", "/api/v1/templates", Some(r#"{"name":"   "}"#)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let listing = json(call(&app, "GET", "/api/v1/templates", None).await).await;
        assert!(listing["templates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let app = build_app(fake(Arc::new(ScriptedService::default())).await);
        let res = call(&app, "POST", "/api/v1/templates/template:42/load", None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = call(&app, "DELETE", "/api/v1/templates/template:42?confirm=true", None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_template_saved_by_another_process() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let state =
            crate::state::testing::fake_with(kv.clone(), Arc::new(ScriptedService::default())).await;
        let app = build_app(state);

        let meals = crate::meals::dto::MealEntrySet {
            lunch: "soup".into(),
            ..Default::default()
        };
        let template = TemplateStore::new(kv.clone()).save("Elsewhere", &meals).await.unwrap();

        let uri = format!("/api/v1/templates/{}?confirm=true", template.id);
        let res = call(&app, "DELETE", &uri, None).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(kv.get(&template.id).await.unwrap(), None);
        let listing = json(call(&app, "GET", "/api/v1/templates", None).await).await;
        assert!(listing["templates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_template_saved_by_another_process() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let state =
            crate::state::testing::fake_with(kv.clone(), Arc::new(ScriptedService::default())).await;
        let app = build_app(state);

        let meals = crate::meals::dto::MealEntrySet {
            dinner: "stew".into(),
            ..Default::default()
        };
        let template = TemplateStore::new(kv).save("Later", &meals).await.unwrap();

        let res = call(&app, "POST", &format!("/api/v1/templates/{}/load", template.id), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["dinner"], "stew");
    }
}
