use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::modules::quiz::handlers::{load_quiz, require_host};
use crate::services::importer::{self, ImportEntity};
use crate::tabular;

#[derive(Debug, Deserialize)]
pub struct TransferParams {
    pub separator: Option<String>,
    pub newline: Option<String>,
    #[serde(default)]
    pub remove_missing: bool,
}

impl TransferParams {
    fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(";")
    }

    fn newline(&self) -> &str {
        self.newline.as_deref().unwrap_or("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub removed: u64,
}

/// Delimited export of a quiz's configuration tables, host or admin
/// only.
pub async fn export_entity(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((quiz_id, entity)): Path<(i64, String)>,
    Query(params): Query<TransferParams>,
) -> AppResult<String> {
    let quiz = load_quiz(&state, quiz_id).await?;
    require_host(&state, &current, quiz.id).await?;

    let entity: ImportEntity = entity.parse()?;
    importer::export(
        &state.db,
        quiz_id,
        entity,
        params.separator(),
        params.newline(),
    )
    .await
}

/// Delimited import of configuration rows, admin only. The whole load
/// runs in one transaction; any bad row rolls everything back.
pub async fn import_entity(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(entity): Path<String>,
    Query(params): Query<TransferParams>,
    body: String,
) -> AppResult<Json<ImportReport>> {
    current.require_admin()?;

    let entity: ImportEntity = entity.parse()?;
    let records = tabular::parse(&body, params.separator(), params.newline());

    let mut tx = state.db.begin().await?;
    let outcome = importer::import(&mut tx, entity, &records, params.remove_missing).await?;
    tx.commit().await?;

    Ok(Json(ImportReport {
        imported: outcome.imported,
        removed: outcome.removed,
    }))
}
