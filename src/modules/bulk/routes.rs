use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{export_entity, import_entity};
use crate::app_state::AppState;

pub fn bulk_routes() -> Router<AppState> {
    Router::new()
        .route("/api/quizzes/:quiz_id/export/:entity", get(export_entity))
        .route("/api/import/:entity", post(import_entity))
}
