use axum::extract::{Path, Query, State};
use axum::Json;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{NewQuiz, NewSection, Quiz, Section, UpdateQuiz};
use crate::db::QuizRepository;
use crate::error::{AppError, AppResult};
use crate::services::snapshot::{self, QuizSnapshot};
use crate::services::templates;

/// Hosts and admins may manage a quiz; everyone else only participates.
pub async fn require_host(
    state: &AppState,
    current: &CurrentUser,
    quiz_id: i64,
) -> AppResult<()> {
    if current.is_admin() || QuizRepository::is_host(&state.db, quiz_id, current.user.id).await? {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "not a host of this quiz".to_string(),
        ))
    }
}

pub async fn load_quiz(state: &AppState, quiz_id: i64) -> AppResult<Quiz> {
    QuizRepository::get(&state.db, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("quiz {quiz_id}")))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QuizPage {
    pub items: Vec<Quiz>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Quizzes the caller may see: started ones plus their own, paginated.
pub async fn list_quizzes(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<QuizPage>> {
    let per_page = state.env.app.page_size;
    let page = params.page.unwrap_or(1).max(1);
    let now = OffsetDateTime::now_utc();

    let items = QuizRepository::list_visible(
        &state.db,
        current.user.id,
        now,
        per_page,
        (page - 1) * per_page,
    )
    .await?;
    let total = QuizRepository::count_visible(&state.db, current.user.id, now).await?;

    Ok(Json(QuizPage {
        items,
        page,
        per_page,
        total,
    }))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<NewQuiz>,
) -> AppResult<Json<Quiz>> {
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    let quiz = QuizRepository::create(&mut tx, &payload).await?;
    QuizRepository::add_host(&mut tx, quiz.id, current.user.id).await?;
    tx.commit().await?;

    Ok(Json(quiz))
}

pub async fn update_quiz(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<UpdateQuiz>,
) -> AppResult<Json<Quiz>> {
    payload.validate()?;
    load_quiz(&state, quiz_id).await?;
    require_host(&state, &current, quiz_id).await?;

    let mut tx = state.db.begin().await?;
    let quiz = QuizRepository::update(&mut tx, quiz_id, &payload).await?;
    tx.commit().await?;

    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    load_quiz(&state, quiz_id).await?;
    require_host(&state, &current, quiz_id).await?;

    let mut tx = state.db.begin().await?;
    QuizRepository::delete(&mut tx, quiz_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

#[derive(Debug, Deserialize)]
pub struct PollParams {
    #[serde(default)]
    pub force: bool,
    pub cached_content: Option<String>,
    pub cached_answers: Option<String>,
}

/// Polling endpoint: `null` while nothing changed since the caller's
/// watermark, otherwise the full nested quiz state.
pub async fn poll_quiz(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(quiz_id): Path<i64>,
    Query(params): Query<PollParams>,
) -> AppResult<Json<Option<QuizSnapshot>>> {
    let quiz = load_quiz(&state, quiz_id).await?;

    if !state
        .updates
        .should_serve(current.user.id, quiz.id, quiz.last_updated, params.force)
    {
        return Ok(Json(None));
    }

    let cached_content = parse_id_list(params.cached_content.as_deref());
    let cached_answers = parse_id_list(params.cached_answers.as_deref());

    let data =
        snapshot::build(&state.db, quiz, current.user.id, &cached_content, &cached_answers).await?;
    Ok(Json(Some(data)))
}

fn parse_id_list(raw: Option<&str>) -> Vec<i64> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct JoinPayload {
    pub password: Option<SecretString>,
}

/// Password-checked enrollment as a quiz host.
pub async fn join_quiz(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(quiz_id): Path<i64>,
    payload: Option<Json<JoinPayload>>,
) -> AppResult<Json<serde_json::Value>> {
    let quiz = load_quiz(&state, quiz_id).await?;

    let payload = payload.map(|Json(payload)| payload).unwrap_or(JoinPayload {
        password: None,
    });
    let provided = payload.password.as_ref().map(|p| p.expose_secret().as_str());
    if quiz.password.as_deref() != provided {
        return Err(AppError::Authorization("wrong quiz password".to_string()));
    }

    let mut tx = state.db.begin().await?;
    QuizRepository::add_host(&mut tx, quiz.id, current.user.id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::Value::Null))
}

pub async fn create_section(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<NewSection>,
) -> AppResult<Json<Section>> {
    payload.validate()?;
    load_quiz(&state, quiz_id).await?;
    require_host(&state, &current, quiz_id).await?;

    let mut tx = state.db.begin().await?;
    let section = templates::create_section(&mut tx, quiz_id, current.user.id, &payload).await?;
    tx.commit().await?;

    Ok(Json(section))
}
