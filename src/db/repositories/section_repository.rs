use sqlx::{PgPool, Postgres, Transaction};

use crate::db::error::DatabaseError;
use crate::db::ids::generate_id;
use crate::db::models::Section;
use crate::ordering::{Assignment, Sibling};

const SECTION_COLUMNS: &str = "id, container_id, user_id, name, order_number, open, closed";

pub struct SectionRepository;

impl SectionRepository {
    pub async fn get(pool: &PgPool, section_id: i64) -> Result<Option<Section>, DatabaseError> {
        let section = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE id = $1"
        ))
        .bind(section_id)
        .fetch_optional(pool)
        .await?;

        Ok(section)
    }

    pub async fn list_by_quiz(pool: &PgPool, quiz_id: i64) -> Result<Vec<Section>, DatabaseError> {
        let sections = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE container_id = $1 ORDER BY order_number"
        ))
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(sections)
    }

    /// Current order positions of every section in a quiz, for the
    /// ordering engine.
    pub async fn siblings(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
    ) -> Result<Vec<Sibling>, DatabaseError> {
        let rows = sqlx::query_as::<_, (i64, Option<i32>)>(
            "SELECT id, order_number FROM sections WHERE container_id = $1 ORDER BY order_number",
        )
        .bind(quiz_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, order_number)| Sibling { id, order_number })
            .collect())
    }

    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
        user_id: i64,
        name: &str,
        order_number: Option<i32>,
    ) -> Result<Section, DatabaseError> {
        let id = generate_id(tx, "sections").await?;
        let section = sqlx::query_as::<_, Section>(&format!(
            r#"
            INSERT INTO sections (id, container_id, user_id, name, order_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SECTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(quiz_id)
        .bind(user_id)
        .bind(name)
        .bind(order_number)
        .fetch_one(&mut **tx)
        .await?;

        Ok(section)
    }

    pub async fn rename(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
        name: &str,
    ) -> Result<Section, DatabaseError> {
        let section = sqlx::query_as::<_, Section>(&format!(
            "UPDATE sections SET name = $1 WHERE id = $2 RETURNING {SECTION_COLUMNS}"
        ))
        .bind(name)
        .bind(section_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(section)
    }

    pub async fn set_open(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
        open: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE sections SET open = $1 WHERE id = $2")
            .bind(open)
            .bind(section_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn set_closed(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
        closed: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE sections SET closed = $1 WHERE id = $2")
            .bind(closed)
            .bind(section_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Closing a section locks every contained question; reopening the
    /// section later leaves them locked.
    pub async fn close_questions(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE questions SET open = FALSE, closed = TRUE WHERE container_id = $1")
            .bind(section_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn apply_order(
        tx: &mut Transaction<'_, Postgres>,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError> {
        for assignment in assignments {
            sqlx::query("UPDATE sections SET order_number = $1 WHERE id = $2")
                .bind(assignment.order_number)
                .bind(assignment.id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    /// Delete a section and report the freed order position.
    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
    ) -> Result<Option<i32>, DatabaseError> {
        let order_number = sqlx::query_scalar::<_, Option<i32>>(
            "DELETE FROM sections WHERE id = $1 RETURNING order_number",
        )
        .bind(section_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(order_number)
    }
}
