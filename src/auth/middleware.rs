//! Authentication extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use super::db as auth_db;
use crate::config::SESSION_COOKIE_NAME;
use crate::db::try_lock;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated request context.
/// Add this as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let token = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?;

        let conn = try_lock(&state.db)?;
        let user_id = auth_db::get_session_user(&conn, &token)?.ok_or(AppError::Unauthorized)?;

        let is_admin = auth_db::has_role(&conn, &user_id, auth_db::ADMIN_ROLE).unwrap_or_else(|e| {
            tracing::warn!("Role check failed for {}: {}", user_id, e);
            false
        });

        Ok(AuthContext { user_id, is_admin })
    }
}
