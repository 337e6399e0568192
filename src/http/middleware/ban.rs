use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app::users::UserService;
use crate::http::{AppError, AuthUser};
use crate::AppState;

/// Rejects bearer tokens of banned or deleted accounts on every API route.
pub async fn ban_check_middleware(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(auth_user) = auth {
        let status = UserService::new(state.db.clone())
            .account_status(auth_user.user_id)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "failed to check ban status");
                AppError::internal("failed to check ban status")
            })?;

        match status {
            None => return Err(AppError::unauthorized("account not found")),
            Some(status) if status.banned => {
                return Err(AppError::forbidden("your account has been banned"));
            }
            Some(_) => {}
        }
    }

    Ok(next.run(request).await)
}
