use axum::extract::{Path, State};
use axum::Json;
use time::OffsetDateTime;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{
    NewAnswer, NewQuestion, NewValue, Question, Section, UpdateQuestion, Value,
};
use crate::db::{
    AnswerRepository, QuestionRepository, QuizRepository, SectionRepository, ValueRepository,
};
use crate::error::{AppError, AppResult};
use crate::modules::section::handlers::OrderPayload;
use crate::ordering;

/// A question together with its section, which carries the ownership
/// and the quiz linkage.
pub async fn load_question(
    state: &AppState,
    question_id: i64,
) -> AppResult<(Question, Section)> {
    let question = QuestionRepository::get(&state.db, question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("question {question_id}")))?;
    let section = SectionRepository::get(&state.db, question.container_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {}", question.container_id)))?;
    Ok((question, section))
}

pub async fn update_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
    Json(payload): Json<UpdateQuestion>,
) -> AppResult<Json<Question>> {
    payload.validate()?;
    let (_, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let question = QuestionRepository::update(&mut tx, question_id, &payload).await?;
    tx.commit().await?;

    Ok(Json(question))
}

pub async fn delete_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let (question, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let removed = QuestionRepository::delete(&mut tx, question_id).await?;
    if let Some(removed) = removed {
        let siblings = QuestionRepository::siblings(&mut tx, question.container_id).await?;
        let assignments = ordering::close_gap(&siblings, removed);
        QuestionRepository::apply_order(&mut tx, &assignments).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn order_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
    Json(payload): Json<OrderPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let (question, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let siblings = QuestionRepository::siblings(&mut tx, question.container_id).await?;
    let assignments = ordering::set_order(&siblings, question_id, payload.order_number);
    QuestionRepository::apply_order(&mut tx, &assignments).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn open_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let (question, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    QuestionRepository::set_open(&mut tx, question_id, !question.open).await?;
    if let Some(quiz_id) = section.container_id {
        QuizRepository::touch(&mut tx, quiz_id, OffsetDateTime::now_utc()).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn close_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let (question, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    QuestionRepository::set_closed(&mut tx, question_id, !question.closed).await?;
    if let Some(quiz_id) = section.container_id {
        QuizRepository::touch(&mut tx, quiz_id, OffsetDateTime::now_utc()).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

/// Copy a question with its values to the end of the same section. The
/// copy starts fresh: no answer reveal text, not open, not closed.
pub async fn duplicate_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<Question>> {
    let (question, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let values = ValueRepository::list_by_question(&state.db, question_id).await?;

    let mut tx = state.db.begin().await?;
    let siblings = QuestionRepository::siblings(&mut tx, question.container_id).await?;
    let copy = QuestionRepository::create(
        &mut tx,
        question.container_id,
        &NewQuestion {
            content: question.content.clone(),
            answer_content: None,
            show_values: question.show_values,
            max_answers: Some(question.max_answers),
            base_points: Some(question.base_points),
            bonus: question.bonus,
            order_number: None,
        },
        Some(ordering::next_order_number(&siblings)),
    )
    .await?;

    for value in &values {
        ValueRepository::create(
            &mut tx,
            copy.id,
            &value.text,
            value.allowed_misses,
            value.points,
            value.order_number,
        )
        .await?;
    }
    tx.commit().await?;

    Ok(Json(copy))
}

pub async fn like_question(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let (_, section) = load_question(&state, question_id).await?;

    let mut tx = state.db.begin().await?;
    QuestionRepository::toggle_like(&mut tx, question_id, current.user.id).await?;
    if let Some(quiz_id) = section.container_id {
        QuizRepository::touch(&mut tx, quiz_id, OffsetDateTime::now_utc()).await?;
    }
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

/// Record an answer. Locked questions reject, and a bonus question
/// rejects once the caller has spent their one bonus attempt elsewhere
/// in the section. Blank submissions are silently ignored.
pub async fn submit_answer(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
    Json(payload): Json<NewAnswer>,
) -> AppResult<Json<serde_json::Value>> {
    let (question, _) = load_question(&state, question_id).await?;

    if question.closed {
        return Err(AppError::Authorization("question is closed".to_string()));
    }
    if question.bonus
        && AnswerRepository::has_other_bonus_answer(
            &state.db,
            question.container_id,
            question_id,
            current.user.id,
        )
        .await?
    {
        return Err(AppError::Authorization(
            "bonus answer already used in this section".to_string(),
        ));
    }

    let Some(value) = payload.value.filter(|v| !v.is_empty()) else {
        return Ok(Json(serde_json::Value::Null));
    };

    let mut tx = state.db.begin().await?;
    AnswerRepository::create(&mut tx, current.user.id, question_id, &value).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn clear_answers(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    load_question(&state, question_id).await?;

    let mut tx = state.db.begin().await?;
    AnswerRepository::delete_for_user(&mut tx, question_id, current.user.id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn create_value(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(question_id): Path<i64>,
    Json(payload): Json<NewValue>,
) -> AppResult<Json<Value>> {
    payload.validate()?;
    let (_, section) = load_question(&state, question_id).await?;
    current.authorize_owner(section.user_id)?;

    let mut tx = state.db.begin().await?;
    let value = ValueRepository::create(
        &mut tx,
        question_id,
        &payload.text,
        payload.allowed_misses.unwrap_or(0),
        payload.points.unwrap_or(1.0),
        payload.order_number,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(value))
}
