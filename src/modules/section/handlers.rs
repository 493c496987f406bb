use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use time::OffsetDateTime;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{NewQuestion, Question, Section, UpdateSection};
use crate::db::{QuestionRepository, QuizRepository, SectionRepository};
use crate::error::{AppError, AppResult};
use crate::ordering;

pub async fn load_section(state: &AppState, section_id: i64) -> AppResult<Section> {
    SectionRepository::get(&state.db, section_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {section_id}")))
}

#[derive(Debug, Deserialize)]
pub struct OrderPayload {
    pub order_number: Option<i32>,
}

pub async fn update_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
    Json(payload): Json<UpdateSection>,
) -> AppResult<Json<Section>> {
    payload.validate()?;
    let mut section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    if let Some(name) = &payload.name {
        let mut tx = state.db.begin().await?;
        section = SectionRepository::rename(&mut tx, section_id, name).await?;
        tx.commit().await?;
    }

    Ok(Json(section))
}

/// Delete a section and pull the remaining siblings together so order
/// numbers stay dense.
pub async fn delete_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let removed = SectionRepository::delete(&mut tx, section_id).await?;
    if let (Some(quiz_id), Some(removed)) = (section.container_id, removed) {
        let siblings = SectionRepository::siblings(&mut tx, quiz_id).await?;
        let assignments = ordering::close_gap(&siblings, removed);
        SectionRepository::apply_order(&mut tx, &assignments).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn order_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
    Json(payload): Json<OrderPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    let Some(quiz_id) = section.container_id else {
        return Err(AppError::BadRequest(
            "section does not belong to a quiz".to_string(),
        ));
    };

    let mut tx = state.db.begin().await?;
    let siblings = SectionRepository::siblings(&mut tx, quiz_id).await?;
    let assignments = ordering::set_order(&siblings, section_id, payload.order_number);
    SectionRepository::apply_order(&mut tx, &assignments).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn open_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    SectionRepository::set_open(&mut tx, section_id, !section.open).await?;
    if let Some(quiz_id) = section.container_id {
        QuizRepository::touch(&mut tx, quiz_id, OffsetDateTime::now_utc()).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

/// Toggle the closed flag. Closing locks every contained question;
/// reopening leaves the questions locked.
pub async fn close_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    let closed = !section.closed;
    let mut tx = state.db.begin().await?;
    SectionRepository::set_closed(&mut tx, section_id, closed).await?;
    if closed {
        SectionRepository::close_questions(&mut tx, section_id).await?;
    }
    if let Some(quiz_id) = section.container_id {
        QuizRepository::touch(&mut tx, quiz_id, OffsetDateTime::now_utc()).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn create_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(section_id): Path<i64>,
    Json(payload): Json<NewQuestion>,
) -> AppResult<Json<Question>> {
    payload.validate()?;
    let section = load_section(&state, section_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let siblings = QuestionRepository::siblings(&mut tx, section_id).await?;
    let mut question = QuestionRepository::create(&mut tx, section_id, &payload, None).await?;

    let assignments = ordering::set_order(&siblings, question.id, payload.order_number);
    QuestionRepository::apply_order(&mut tx, &assignments).await?;
    question.order_number = assignments
        .iter()
        .find(|a| a.id == question.id)
        .map(|a| a.order_number);
    tx.commit().await?;

    Ok(Json(question))
}
