pub mod client;
pub mod dto;
pub mod handlers;
pub mod metrics;
pub mod prompt;
pub mod validator;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
