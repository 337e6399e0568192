use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::AppState;

mod auth;
mod error;
mod extract;
mod handlers;
mod middleware;
mod routes;

pub use auth::{AdminUser, AuthUser};
pub use error::AppError;

use self::middleware::ban::ban_check_middleware;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth())
        .merge(routes::users())
        .merge(routes::posts())
        .merge(routes::comments())
        .merge(routes::likes())
        .merge(routes::admin())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            ban_check_middleware,
        ));

    Router::new()
        .merge(routes::health())
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(RequestBodyLimitLayer::new(state.max_body_bytes))
        .with_state(state)
}
