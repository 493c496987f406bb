use sqlx::PgPool;

use crate::db::error::DatabaseError;
use crate::db::models::{Role, User};

pub struct UserRepository;

impl UserRepository {
    /// Resolve the owner of a bearer token.
    pub async fn token_bearer(pool: &PgPool, token: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.language, u.active, u.registered_at
            FROM user_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn role_names(pool: &PgPool, user_id: i64) -> Result<Vec<String>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(roles.into_iter().map(|role| role.name).collect())
    }

    pub async fn get_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, language, active, registered_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
