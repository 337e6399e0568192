use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh_token))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::get_current_user))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(handlers::list_users))
        .route(
            "/usuarios/:id",
            get(handlers::get_user)
                .put(handlers::update_profile)
                .delete(handlers::delete_user),
        )
        .route("/usuarios/:id/postagens", get(handlers::list_user_posts))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route(
            "/postagens",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/postagens/:id",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/postagens/:id/comments", get(handlers::list_post_comments))
}

pub fn comments() -> Router<AppState> {
    Router::new()
        .route("/comments", post(handlers::create_comment))
        .route("/comments/post/:post_id", get(handlers::list_post_comments))
        .route(
            "/comments/:id",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
}

pub fn likes() -> Router<AppState> {
    Router::new()
        .route("/likes/toggle", post(handlers::toggle_like))
        .route("/likes/check/:post_id", get(handlers::check_like))
        .route("/likes/count/:post_id", get(handlers::count_likes))
}

pub fn admin() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(handlers::admin_stats))
        .route("/admin/usuarios", get(handlers::admin_list_users))
        .route("/admin/usuarios/:id/role", put(handlers::admin_set_role))
        .route("/admin/usuarios/:id/ban", put(handlers::admin_set_banned))
        .route("/admin/usuarios/:id", delete(handlers::admin_delete_user))
        .route("/admin/postagens/:id", delete(handlers::admin_delete_post))
        .route("/admin/comments/:id", delete(handlers::admin_delete_comment))
}
