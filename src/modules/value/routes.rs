use axum::{routing::patch, Router};

use super::handlers::{delete_value, update_value};
use crate::app_state::AppState;

pub fn value_routes() -> Router<AppState> {
    Router::new().route(
        "/api/values/:value_id",
        patch(update_value).delete(delete_value),
    )
}
