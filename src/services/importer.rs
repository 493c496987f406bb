//! Bulk import/export of quiz configuration tables.
//!
//! Records pass through an explicit per-entity field allowlist; unknown
//! columns are rejected instead of being assigned dynamically. The
//! first column must be `id` and acts as the lookup key: present rows
//! are updated (empty cells keep their stored value), missing rows are
//! inserted, and `remove_missing` sweeps out everything the import did
//! not mention.

use std::str::FromStr;

use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::{QuestionImport, ValueImport};
use crate::db::{QuestionRepository, ValueRepository};
use crate::error::{AppError, AppResult};
use crate::tabular::{self, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportEntity {
    Questions,
    Values,
}

impl FromStr for ImportEntity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "questions" => Ok(ImportEntity::Questions),
            "values" => Ok(ImportEntity::Values),
            other => Err(AppError::BadRequest(format!(
                "unknown import entity: {other}"
            ))),
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub removed: u64,
}

pub async fn import(
    tx: &mut Transaction<'_, Postgres>,
    entity: ImportEntity,
    records: &[Record],
    remove_missing: bool,
) -> AppResult<ImportOutcome> {
    let mut outcome = ImportOutcome::default();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        match entity {
            ImportEntity::Values => {
                let Some(data) = value_record(record)? else {
                    continue;
                };
                if ValueRepository::exists(tx, data.id).await? {
                    ValueRepository::update_import(tx, &data).await?;
                } else {
                    ValueRepository::insert_import(tx, &data).await?;
                }
                kept.push(data.id);
            }
            ImportEntity::Questions => {
                let Some(data) = question_record(record)? else {
                    continue;
                };
                if QuestionRepository::exists(tx, data.id).await? {
                    QuestionRepository::update_import(tx, &data).await?;
                } else {
                    QuestionRepository::insert_import(tx, &data).await?;
                }
                kept.push(data.id);
            }
        }
        outcome.imported += 1;
    }

    if remove_missing {
        outcome.removed = match entity {
            ImportEntity::Values => ValueRepository::delete_missing(tx, &kept).await?,
            ImportEntity::Questions => QuestionRepository::delete_missing(tx, &kept).await?,
        };
    }

    Ok(outcome)
}

/// Map a parsed record onto the value allowlist. Records without a key
/// are skipped, matching the behavior of administrative loads where
/// half-filled trailing rows are common.
pub fn value_record(record: &Record) -> AppResult<Option<ValueImport>> {
    let Some(id) = record_id(record)? else {
        return Ok(None);
    };

    let mut data = ValueImport {
        id,
        ..Default::default()
    };

    for (header, cell) in record.iter().skip(1) {
        if cell.is_empty() {
            continue;
        }
        match header.as_str() {
            "question_id" => data.question_id = Some(parse_field(header, cell)?),
            "text" => data.text = Some(cell.clone()),
            "allowed_misses" => data.allowed_misses = Some(parse_field(header, cell)?),
            "points" => data.points = Some(parse_field(header, cell)?),
            "order_number" => data.order_number = Some(parse_field(header, cell)?),
            other => {
                return Err(AppError::BadRequest(format!(
                    "column not allowed for value import: {other}"
                )))
            }
        }
    }

    Ok(Some(data))
}

pub fn question_record(record: &Record) -> AppResult<Option<QuestionImport>> {
    let Some(id) = record_id(record)? else {
        return Ok(None);
    };

    let mut data = QuestionImport {
        id,
        ..Default::default()
    };

    for (header, cell) in record.iter().skip(1) {
        if cell.is_empty() {
            continue;
        }
        match header.as_str() {
            "container_id" => data.container_id = Some(parse_field(header, cell)?),
            "order_number" => data.order_number = Some(parse_field(header, cell)?),
            "content" => data.content = Some(cell.clone()),
            "answer_content" => data.answer_content = Some(cell.clone()),
            "show_values" => data.show_values = Some(parse_bool(header, cell)?),
            "max_answers" => data.max_answers = Some(parse_field(header, cell)?),
            "base_points" => data.base_points = Some(parse_field(header, cell)?),
            "bonus" => data.bonus = Some(parse_bool(header, cell)?),
            "open" => data.open = Some(parse_bool(header, cell)?),
            "closed" => data.closed = Some(parse_bool(header, cell)?),
            other => {
                return Err(AppError::BadRequest(format!(
                    "column not allowed for question import: {other}"
                )))
            }
        }
    }

    Ok(Some(data))
}

fn record_id(record: &Record) -> AppResult<Option<i64>> {
    let Some((header, cell)) = record.first() else {
        return Ok(None);
    };
    if header != "id" {
        return Err(AppError::BadRequest(
            "the first import column must be id".to_string(),
        ));
    }
    if cell.is_empty() {
        return Ok(None);
    }
    Ok(Some(parse_field(header, cell)?))
}

fn parse_field<T: FromStr>(header: &str, cell: &str) -> AppResult<T> {
    cell.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {header}: {cell}")))
}

fn parse_bool(header: &str, cell: &str) -> AppResult<bool> {
    match cell.to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        _ => Err(AppError::BadRequest(format!("invalid {header}: {cell}"))),
    }
}

/// Render a quiz's configuration table in the same delimited form the
/// importer accepts.
pub async fn export(
    pool: &PgPool,
    quiz_id: i64,
    entity: ImportEntity,
    separator: &str,
    newline: &str,
) -> AppResult<String> {
    let (headers, rows): (Vec<&str>, Vec<Vec<String>>) = match entity {
        ImportEntity::Values => {
            let values = ValueRepository::list_by_quiz(pool, quiz_id).await?;
            (
                vec!["id", "question_id", "text", "allowed_misses", "points", "order_number"],
                values
                    .into_iter()
                    .map(|v| {
                        vec![
                            v.id.to_string(),
                            v.question_id.to_string(),
                            v.text,
                            v.allowed_misses.to_string(),
                            v.points.to_string(),
                            optional(v.order_number),
                        ]
                    })
                    .collect(),
            )
        }
        ImportEntity::Questions => {
            let questions = QuestionRepository::list_by_quiz(pool, quiz_id).await?;
            (
                vec![
                    "id",
                    "container_id",
                    "order_number",
                    "content",
                    "answer_content",
                    "show_values",
                    "max_answers",
                    "base_points",
                    "bonus",
                    "open",
                    "closed",
                ],
                questions
                    .into_iter()
                    .map(|q| {
                        vec![
                            q.id.to_string(),
                            q.container_id.to_string(),
                            optional(q.order_number),
                            q.content.unwrap_or_default(),
                            q.answer_content.unwrap_or_default(),
                            q.show_values.to_string(),
                            q.max_answers.to_string(),
                            q.base_points.to_string(),
                            q.bonus.to_string(),
                            q.open.to_string(),
                            q.closed.to_string(),
                        ]
                    })
                    .collect(),
            )
        }
    };

    Ok(tabular::render(&headers, &rows, separator, newline))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular;

    #[test]
    fn value_records_map_allowlisted_columns() {
        let records = tabular::parse(
            "id;question_id;text;allowed_misses;points\n300;200;alma;2;1.5\n",
            ";",
            "\n",
        );
        let data = value_record(&records[0]).unwrap().unwrap();
        assert_eq!(
            data,
            ValueImport {
                id: 300,
                question_id: Some(200),
                text: Some("alma".to_string()),
                allowed_misses: Some(2),
                points: Some(1.5),
                order_number: None,
            }
        );
    }

    #[test]
    fn empty_cells_leave_fields_untouched() {
        let records = tabular::parse("id;text;points\n300;;2\n", ";", "\n");
        let data = value_record(&records[0]).unwrap().unwrap();
        assert_eq!(data.text, None);
        assert_eq!(data.points, Some(2.0));
    }

    #[test]
    fn records_without_a_key_are_skipped() {
        let records = tabular::parse("id;text\n;alma\n", ";", "\n");
        assert!(value_record(&records[0]).unwrap().is_none());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let records = tabular::parse("id;sneaky\n300;x\n", ";", "\n");
        assert!(value_record(&records[0]).is_err());
    }

    #[test]
    fn key_column_must_come_first() {
        let records = tabular::parse("text;id\nalma;300\n", ";", "\n");
        assert!(value_record(&records[0]).is_err());
    }

    #[test]
    fn question_records_parse_flags() {
        let records = tabular::parse(
            "id;container_id;bonus;open;max_answers\n200;100;true;0;3\n",
            ";",
            "\n",
        );
        let data = question_record(&records[0]).unwrap().unwrap();
        assert_eq!(data.container_id, Some(100));
        assert_eq!(data.bonus, Some(true));
        assert_eq!(data.open, Some(false));
        assert_eq!(data.max_answers, Some(3));
        assert!(question_record(&tabular::parse("id;bonus\n200;maybe\n", ";", "\n")[0]).is_err());
    }
}
