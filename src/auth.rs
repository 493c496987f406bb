use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::app_state::AppState;
use crate::db::models::{User, ADMIN_ROLE};
use crate::db::UserRepository;
use crate::error::AppError;

/// The authenticated caller, resolved from a pre-provisioned bearer
/// token. Registration, login and token issuing happen out-of-band.
pub struct CurrentUser {
    pub user: User,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }

    /// The `admin` role implies every other role.
    #[allow(unused)]
    pub fn has_role(&self, role: &str) -> bool {
        self.is_admin() || self.roles.iter().any(|r| r == role)
    }

    /// Admins may act on everything, owners on their own records.
    pub fn authorize_owner(&self, owner_id: Option<i64>) -> Result<(), AppError> {
        if self.is_admin() || owner_id == Some(self.user.id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "not the owner of this record".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("admin role required".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Authentication("missing bearer token".to_string()))?;

        let user = UserRepository::token_bearer(&state.db, token)
            .await?
            .ok_or_else(|| AppError::Authentication("unknown token".to_string()))?;

        if !user.active {
            return Err(AppError::Authentication("inactive user".to_string()));
        }

        let roles = UserRepository::role_names(&state.db, user.id).await?;

        Ok(CurrentUser { user, roles })
    }
}
