use rand::Rng;
use sqlx::{Postgres, Transaction};

use crate::db::error::DatabaseError;

const ID_MIN: i64 = 100_000_000;
const ID_MAX: i64 = 999_999_999;

/// Pick an unused random 9-digit identifier for `table`.
///
/// Identifiers are random rather than sequential so they cannot be
/// guessed from one another. Collisions are resolved by retrying; the
/// surrounding unique constraint still catches the check-then-insert
/// race.
pub async fn generate_id(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
) -> Result<i64, DatabaseError> {
    let query = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
    loop {
        let candidate = rand::thread_rng().gen_range(ID_MIN..=ID_MAX);
        let taken: bool = sqlx::query_scalar(&query)
            .bind(candidate)
            .fetch_one(&mut **tx)
            .await?;
        if !taken {
            return Ok(candidate);
        }
    }
}
