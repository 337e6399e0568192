//! Admin Panel Tests
//!
//! Covers the admin guard, stats, role and ban management, and moderation
//! deletes.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

// ===========================================================================
// Guard
// ===========================================================================

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = app().await;
    let user = app.create_user("admin_guard_user").await;
    let token = Some(user.access_token.as_str());

    let stats = app.get("/api/admin/stats", token).await;
    assert_eq!(stats.status, StatusCode::FORBIDDEN);
    assert_eq!(stats.error_message(), "admin access required");

    let users = app.get("/api/admin/usuarios", token).await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);

    let role = app
        .put_json(
            &format!("/api/admin/usuarios/{}/role", user.id),
            json!({ "role": "admin" }),
            token,
        )
        .await;
    assert_eq!(role.status, StatusCode::FORBIDDEN);

    let ban = app
        .put_json(
            &format!("/api/admin/usuarios/{}/ban", user.id),
            json!({ "banned": true }),
            token,
        )
        .await;
    assert_eq!(ban.status, StatusCode::FORBIDDEN);

    for path in [
        "/api/admin/usuarios/1",
        "/api/admin/postagens/1",
        "/api/admin/comments/1",
    ] {
        let resp = app.delete(path, token).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{}", path);
    }

    let tipo: String = sqlx::query_scalar("SELECT tipo FROM usuarios WHERE id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(tipo, "user");
}

#[tokio::test]
async fn admin_routes_require_token() {
    let app = app().await;

    let resp = app.get("/api/admin/stats", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn demoted_admin_loses_access() {
    let app = app().await;
    let admin = app.create_admin("admin_demoted").await;
    sqlx::query("UPDATE usuarios SET tipo = 'user' WHERE id = $1")
        .bind(admin.id)
        .execute(app.pool())
        .await
        .unwrap();

    let resp = app.get("/api/admin/stats", Some(&admin.access_token)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

// ===========================================================================
// Stats & Listing
// ===========================================================================

#[tokio::test]
async fn admin_stats_counts() {
    let app = app().await;
    let admin = app.create_admin("admin_stats").await;
    let post_id = app.create_post_for_user(admin.id).await;
    app.like_post(admin.id, post_id).await;
    app.create_comment_for_user(admin.id, post_id).await;

    let resp = app.get("/api/admin/stats", Some(&admin.access_token)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    for key in ["users", "posts", "comments", "likes", "admins"] {
        assert!(body[key].as_i64().unwrap() >= 1, "{}", key);
    }
    assert!(body["banned"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn admin_lists_full_user_records() {
    let app = app().await;
    let admin = app.create_admin("admin_list").await;

    let resp = app
        .get("/api/admin/usuarios?limit=200", Some(&admin.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    let me = items
        .iter()
        .find(|item| item["id"] == admin.id)
        .expect("admin listed");
    assert_eq!(me["email"], admin.email);
    assert_eq!(me["role"], "admin");
    assert_eq!(me["banned"], false);
}

// ===========================================================================
// Roles & Bans
// ===========================================================================

#[tokio::test]
async fn admin_promotes_and_demotes() {
    let app = app().await;
    let admin = app.create_admin("admin_role").await;
    let user = app.create_user("admin_role_target").await;
    let path = format!("/api/admin/usuarios/{}/role", user.id);

    let resp = app
        .put_json(&path, json!({ "role": "admin" }), Some(&admin.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["role"], "admin");

    let stats = app.get("/api/admin/stats", Some(&user.access_token)).await;
    assert_eq!(stats.status, StatusCode::OK);

    let resp = app
        .put_json(&path, json!({ "role": "user" }), Some(&admin.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["role"], "user");
}

#[tokio::test]
async fn admin_role_validation() {
    let app = app().await;
    let admin = app.create_admin("admin_role_invalid").await;
    let user = app.create_user("admin_role_invalid_target").await;

    let resp = app
        .put_json(
            &format!("/api/admin/usuarios/{}/role", user.id),
            json!({ "role": "moderator" }),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .put_json(
            &format!("/api/admin/usuarios/{}/role", admin.id),
            json!({ "role": "user" }),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "cannot change your own role");

    let resp = app
        .put_json(
            "/api/admin/usuarios/999999999/role",
            json!({ "role": "admin" }),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_ban_blocks_user_and_revokes_sessions() {
    let app = app().await;
    let admin = app.create_admin("admin_ban").await;
    let user = app.create_user("admin_ban_target").await;
    let path = format!("/api/admin/usuarios/{}/ban", user.id);

    let resp = app
        .put_json(&path, json!({ "banned": true }), Some(&admin.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["banned"], true);

    let me = app.get("/api/auth/me", Some(&user.access_token)).await;
    assert_eq!(me.status, StatusCode::FORBIDDEN);

    let refresh = app
        .post_json(
            "/api/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post_json(
            "/api/auth/login",
            json!({ "email": user.email, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);

    let resp = app
        .put_json(&path, json!({ "banned": false }), Some(&admin.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["banned"], false);

    let me = app.get("/api/auth/me", Some(&user.access_token)).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_ban_or_delete_self() {
    let app = app().await;
    let admin = app.create_admin("admin_self").await;

    let resp = app
        .put_json(
            &format!("/api/admin/usuarios/{}/ban", admin.id),
            json!({ "banned": true }),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "cannot ban yourself");

    let resp = app
        .delete(
            &format!("/api/admin/usuarios/{}", admin.id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Moderation Deletes
// ===========================================================================

#[tokio::test]
async fn admin_deletes_user_with_content() {
    let app = app().await;
    let admin = app.create_admin("admin_del_user").await;
    let target = app.create_user("admin_del_user_target").await;
    let post_id = app.create_post_for_user(target.id).await;
    app.like_post(admin.id, post_id).await;
    app.create_comment_for_user(admin.id, post_id).await;

    let resp = app
        .delete(
            &format!("/api/admin/usuarios/{}", target.id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    assert_eq!(
        app.count_rows("SELECT COUNT(*) FROM postagens WHERE id = $1", post_id)
            .await,
        0
    );
    assert_eq!(
        app.count_rows("SELECT COUNT(*) FROM curtidas WHERE postagem_id = $1", post_id)
            .await,
        0
    );

    let resp = app
        .delete(
            &format!("/api/admin/usuarios/{}", target.id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_deletes_any_post_and_comment() {
    let app = app().await;
    let admin = app.create_admin("admin_del_content").await;
    let author = app.create_user("admin_del_content_author").await;
    let post_id = app.create_post_for_user(author.id).await;
    let other_post = app.create_post_for_user(author.id).await;
    let comment_id = app.create_comment_for_user(author.id, other_post).await;
    app.create_comment_for_user(author.id, post_id).await;
    app.like_post(author.id, post_id).await;

    let resp = app
        .delete(
            &format!("/api/admin/comments/{}", comment_id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .delete(
            &format!("/api/admin/postagens/{}", post_id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.count_rows("SELECT COUNT(*) FROM comentarios WHERE postagem_id = $1", post_id)
            .await,
        0
    );

    let resp = app
        .delete("/api/admin/postagens/999999999", Some(&admin.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = app
        .delete(
            &format!("/api/admin/comments/{}", comment_id),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
