use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{UpdateValue, Value};
use crate::db::ValueRepository;
use crate::error::{AppError, AppResult};
use crate::modules::question::handlers::load_question;

async fn load_value(state: &AppState, value_id: i64) -> AppResult<Value> {
    ValueRepository::get(&state.db, value_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("value {value_id}")))
}

/// Editing a value retroactively rescores every stored answer of its
/// question; scores are always derived from the current configuration.
pub async fn update_value(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(value_id): Path<i64>,
    Json(payload): Json<UpdateValue>,
) -> AppResult<Json<Value>> {
    payload.validate()?;
    let value = load_value(&state, value_id).await?;
    let (_, section) = load_question(&state, value.question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let value = ValueRepository::update(&mut tx, value_id, &payload).await?;
    tx.commit().await?;

    Ok(Json(value))
}

pub async fn delete_value(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(value_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let value = load_value(&state, value_id).await?;
    let (_, section) = load_question(&state, value.question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    ValueRepository::delete(&mut tx, value_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}
