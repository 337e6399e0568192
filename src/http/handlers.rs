use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::app::admin::AdminService;
use crate::app::auth::LoginOutcome;
use crate::app::comments::CommentService;
use crate::app::likes::{LikeService, ToggleOutcome};
use crate::app::posts::PostService;
use crate::app::users::UserService;
use crate::domain::admin::AdminStats;
use crate::domain::engagement::{Comment, LikeState};
use crate::domain::post::Post;
use crate::domain::user::{PublicUser, Role, User};
use crate::http::error::{is_unique_violation, owned};
use crate::http::extract::{AppJson, AppPath, AppQuery};
use crate::http::{AdminUser, AppError, AuthUser};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 500;
const MAX_POST_LEN: usize = 5000;
const MAX_COMMENT_LEN: usize = 1000;
const MAX_IMAGE_LEN: usize = 500;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

fn parse_limit(limit: Option<i64>, default: i64, max: i64) -> Result<i64, AppError> {
    let limit = limit.unwrap_or(default);
    if !(1..=max).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {}",
            max
        )));
    }
    Ok(limit)
}

fn parse_cursor(cursor: Option<String>) -> Result<Option<(OffsetDateTime, i64)>, AppError> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };

    let (timestamp, id) = cursor
        .rsplit_once('/')
        .ok_or_else(|| AppError::bad_request("invalid cursor"))?;

    let timestamp = OffsetDateTime::parse(timestamp, &Rfc3339)
        .map_err(|_| AppError::bad_request("invalid cursor"))?;
    let id = id
        .parse::<i64>()
        .map_err(|_| AppError::bad_request("invalid cursor"))?;

    Ok(Some((timestamp, id)))
}

fn encode_cursor(cursor: Option<(OffsetDateTime, i64)>) -> Option<String> {
    let (timestamp, id) = cursor?;
    let timestamp = timestamp.format(&Rfc3339).ok()?;
    Some(format!("{}/{}", timestamp, id))
}

/// `items` was fetched with `limit + 1`; the extra row only signals a next page.
fn paginate<T>(
    mut items: Vec<T>,
    limit: i64,
    key: impl Fn(&T) -> (OffsetDateTime, i64),
) -> ListResponse<T> {
    let next_cursor = if items.len() > limit as usize {
        items.truncate(limit as usize);
        items.last().map(key)
    } else {
        None
    };

    ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    }
}

/// Trims an optional text field, treating blank as absent.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_max_len(value: Option<&str>, max: usize, field: &str) -> Result<(), AppError> {
    match value {
        Some(value) if value.chars().count() > max => Err(AppError::bad_request(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

fn validate_post_body(content: &str, image: Option<&str>) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::bad_request("content is required"));
    }
    check_max_len(Some(content), MAX_POST_LEN, "content")?;
    check_max_len(image, MAX_IMAGE_LEN, "image")
}

fn validate_comment_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::bad_request("comment text cannot be empty"));
    }
    check_max_len(Some(text), MAX_COMMENT_LEN, "comment text")
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.db.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "database ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);
    let bio = normalize_optional(payload.bio);

    if name.is_empty() {
        return Err(AppError::bad_request("name cannot be empty"));
    }
    check_max_len(Some(&name), MAX_NAME_LEN, "name")?;
    if email.is_empty() {
        return Err(AppError::bad_request("email cannot be empty"));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("invalid email"));
    }
    if payload.password.trim().len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }
    check_max_len(bio.as_deref(), MAX_BIO_LEN, "bio")?;

    let role = match &state.admin_email {
        Some(admin_email) if *admin_email == email => Role::Admin,
        _ => Role::User,
    };

    let user = state
        .auth_service()
        .register(name, email, payload.password, bio, role)
        .await
        .map_err(|err| {
            if is_unique_violation(&err, "usuarios_email_key") {
                return AppError::conflict("email already registered");
            }
            tracing::error!(error = ?err, "failed to register user");
            AppError::internal("failed to register user")
        })?;

    tracing::info!(user_id = user.id, role = user.role.as_db(), "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: AuthTokenResponse,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let outcome = state
        .auth_service()
        .login(&email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match outcome {
        LoginOutcome::Success { user, tokens } => Ok(Json(LoginResponse {
            tokens: AuthTokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                access_expires_at: tokens.access_expires_at,
                refresh_expires_at: tokens.refresh_expires_at,
            },
            user,
        })),
        LoginOutcome::InvalidCredentials => Err(AppError::unauthorized("invalid credentials")),
        LoginOutcome::Banned => Err(AppError::forbidden("your account has been banned")),
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let tokens = state
        .auth_service()
        .refresh(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<StatusCode, AppError> {
    let revoked = state
        .auth_service()
        .revoke_refresh_token(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke token");
            AppError::internal("failed to revoke token")
        })?;

    tracing::debug!(revoked, "logout");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
        AppError::internal("failed to fetch current user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ListResponse<PublicUser>>, AppError> {
    let limit = parse_limit(query.limit, 50, 200)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = UserService::new(state.db.clone());
    let users = service
        .list_public(cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list users");
            AppError::internal("failed to list users")
        })?;

    Ok(Json(paginate(users, limit, |user| {
        (user.created_at, user.id)
    })))
}

pub async fn get_user(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_public_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to fetch user");
        AppError::internal("failed to fetch user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
}

pub async fn update_profile(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    if auth.user_id != id {
        return Err(AppError::forbidden("cannot update other users"));
    }

    let name = match payload.name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::bad_request("name cannot be empty"));
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };
    // A blank bio or photo clears the field.
    let bio = payload.bio.map(|bio| normalize_optional(Some(bio)));
    let photo = payload.photo.map(|photo| normalize_optional(Some(photo)));
    check_max_len(name.as_deref(), MAX_NAME_LEN, "name")?;
    check_max_len(bio.as_ref().and_then(Option::as_deref), MAX_BIO_LEN, "bio")?;
    check_max_len(photo.as_ref().and_then(Option::as_deref), MAX_IMAGE_LEN, "photo")?;

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(id, name, bio, photo)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

/// Account owners delete themselves; admins may delete anyone.
pub async fn delete_user(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = UserService::new(state.db.clone());

    if auth.user_id != id {
        let actor = service
            .account_status(auth.user_id)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = auth.user_id, "failed to check role");
                AppError::internal("failed to delete account")
            })?;
        if !actor.map(|status| status.role.is_admin()).unwrap_or(false) {
            return Err(AppError::forbidden("cannot delete other users"));
        }
    }

    let deleted = service.delete_account(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to delete account");
        AppError::internal("failed to delete account")
    })?;

    if deleted {
        tracing::info!(user_id = id, actor_id = auth.user_id, "account deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user not found"))
    }
}

pub async fn list_user_posts(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit, 50, 100)?;
    let cursor = parse_cursor(query.cursor)?;

    let user = UserService::new(state.db.clone())
        .get_user(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to fetch user");
            AppError::internal("failed to list user posts")
        })?;
    if user.is_none() {
        return Err(AppError::not_found("user not found"));
    }

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_by_user(id, cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to list user posts");
            AppError::internal("failed to list user posts")
        })?;

    Ok(Json(paginate(posts, limit, |post| (post.created_at, post.id))))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit, 50, 100)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_posts(cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list posts");
            AppError::internal("failed to list posts")
        })?;

    Ok(Json(paginate(posts, limit, |post| (post.created_at, post.id))))
}

#[derive(Deserialize)]
pub struct PostRequest {
    pub content: String,
    pub image: Option<String>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let image = normalize_optional(payload.image);
    validate_post_body(&payload.content, image.as_deref())?;

    let service = PostService::new(state.db.clone());
    let post = service
        .create_post(auth.user_id, payload.content, image)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = auth.user_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn update_post(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<Json<Post>, AppError> {
    let image = normalize_optional(payload.image);
    validate_post_body(&payload.content, image.as_deref())?;

    let service = PostService::new(state.db.clone());
    let outcome = service
        .update_post(id, auth.user_id, payload.content, image)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to update post");
            AppError::internal("failed to update post")
        })?;

    owned(outcome, "post").map(Json)
}

pub async fn delete_post(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PostService::new(state.db.clone());
    let outcome = service.delete_post(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;

    owned(outcome, "post")?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub async fn list_post_comments(
    AppPath(post_id): AppPath<i64>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ListResponse<Comment>>, AppError> {
    let limit = parse_limit(query.limit, 100, 200)?;
    let cursor = parse_cursor(query.cursor)?;

    let exists = PostService::new(state.db.clone())
        .exists(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to list comments")
        })?;
    if !exists {
        return Err(AppError::not_found("post not found"));
    }

    let service = CommentService::new(state.db.clone());
    let comments = service
        .list_comments(post_id, cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    Ok(Json(paginate(comments, limit, |comment| {
        (comment.created_at, comment.id)
    })))
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub text: String,
}

pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    validate_comment_text(&payload.text)?;

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create_comment(auth.user_id, payload.post_id, payload.text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, post_id = payload.post_id, "failed to comment");
            AppError::internal("failed to comment")
        })?;

    match comment {
        Some(comment) => Ok((StatusCode::CREATED, Json(comment))),
        None => Err(AppError::not_found("post not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

pub async fn update_comment(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    validate_comment_text(&payload.text)?;

    let service = CommentService::new(state.db.clone());
    let outcome = service
        .update_comment(id, auth.user_id, payload.text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = id, user_id = auth.user_id, "failed to update comment");
            AppError::internal("failed to update comment")
        })?;

    owned(outcome, "comment").map(Json)
}

pub async fn delete_comment(
    AppPath(id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = CommentService::new(state.db.clone());
    let outcome = service
        .delete_comment(id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = id, user_id = auth.user_id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    owned(outcome, "comment")?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ToggleLikeRequest {
    pub post_id: i64,
}

pub async fn toggle_like(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ToggleLikeRequest>,
) -> Result<Json<LikeState>, AppError> {
    let service = LikeService::new(state.db.clone());
    let like = service
        .toggle(auth.user_id, payload.post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, post_id = payload.post_id, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?;

    match like {
        ToggleOutcome::Toggled(like) => Ok(Json(like)),
        ToggleOutcome::PostNotFound => Err(AppError::not_found("post not found")),
        ToggleOutcome::UserNotFound => Err(AppError::unauthorized("account not found")),
    }
}

#[derive(Serialize)]
pub struct LikeCheckResponse {
    pub post_id: i64,
    pub liked: bool,
}

pub async fn check_like(
    AppPath(post_id): AppPath<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeCheckResponse>, AppError> {
    let service = LikeService::new(state.db.clone());
    let liked = service
        .has_liked(auth.user_id, post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, post_id, "failed to check like");
            AppError::internal("failed to check like")
        })?;

    Ok(Json(LikeCheckResponse { post_id, liked }))
}

#[derive(Serialize)]
pub struct LikeCountResponse {
    pub post_id: i64,
    pub total: i64,
}

pub async fn count_likes(
    AppPath(post_id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<LikeCountResponse>, AppError> {
    let service = LikeService::new(state.db.clone());
    let total = service.count(post_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id, "failed to count likes");
        AppError::internal("failed to count likes")
    })?;

    Ok(Json(LikeCountResponse { post_id, total }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

pub async fn admin_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, AppError> {
    let service = AdminService::new(state.db.clone());
    let stats = service.stats().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to load admin stats");
        AppError::internal("failed to load admin stats")
    })?;

    Ok(Json(stats))
}

pub async fn admin_list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ListResponse<User>>, AppError> {
    let limit = parse_limit(query.limit, 50, 200)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = UserService::new(state.db.clone());
    let users = service
        .list_users(cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list users");
            AppError::internal("failed to list users")
        })?;

    Ok(Json(paginate(users, limit, |user| {
        (user.created_at, user.id)
    })))
}

#[derive(Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

pub async fn admin_set_role(
    admin: AdminUser,
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetRoleRequest>,
) -> Result<Json<User>, AppError> {
    let role = Role::from_db(payload.role.trim())
        .ok_or_else(|| AppError::bad_request("role must be 'user' or 'admin'"))?;
    if admin.user_id == id {
        return Err(AppError::bad_request("cannot change your own role"));
    }

    let service = AdminService::new(state.db.clone());
    let user = service.set_role(id, role).await.map_err(|err| {
        tracing::error!(error = ?err, actor_id = admin.user_id, user_id = id, "failed to set role");
        AppError::internal("failed to set role")
    })?;

    match user {
        Some(user) => {
            tracing::info!(actor_id = admin.user_id, user_id = id, role = role.as_db(), "role changed");
            Ok(Json(user))
        }
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct SetBannedRequest {
    pub banned: bool,
}

pub async fn admin_set_banned(
    admin: AdminUser,
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetBannedRequest>,
) -> Result<Json<User>, AppError> {
    if admin.user_id == id {
        return Err(AppError::bad_request("cannot ban yourself"));
    }

    let service = AdminService::new(state.db.clone());
    let user = service
        .set_banned(id, payload.banned)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, actor_id = admin.user_id, user_id = id, "failed to update ban");
            AppError::internal("failed to update ban")
        })?;

    match user {
        Some(user) => {
            tracing::info!(actor_id = admin.user_id, user_id = id, banned = payload.banned, "ban updated");
            Ok(Json(user))
        }
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn admin_delete_user(
    admin: AdminUser,
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if admin.user_id == id {
        return Err(AppError::bad_request(
            "cannot delete yourself from the admin panel",
        ));
    }

    let service = AdminService::new(state.db.clone());
    let deleted = service.delete_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, actor_id = admin.user_id, user_id = id, "failed to delete user");
        AppError::internal("failed to delete user")
    })?;

    if deleted {
        tracing::info!(actor_id = admin.user_id, user_id = id, "user deleted by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user not found"))
    }
}

pub async fn admin_delete_post(
    admin: AdminUser,
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = AdminService::new(state.db.clone());
    let deleted = service.delete_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, actor_id = admin.user_id, post_id = id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;

    if deleted {
        tracing::info!(actor_id = admin.user_id, post_id = id, "post deleted by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("post not found"))
    }
}

pub async fn admin_delete_comment(
    admin: AdminUser,
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = AdminService::new(state.db.clone());
    let deleted = service.delete_comment(id).await.map_err(|err| {
        tracing::error!(error = ?err, actor_id = admin.user_id, comment_id = id, "failed to delete comment");
        AppError::internal("failed to delete comment")
    })?;

    if deleted {
        tracing::info!(actor_id = admin.user_id, comment_id = id, "comment deleted by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("comment not found"))
    }
}
