use anyhow::Result;
use sqlx::Row;

use crate::app::auth::revoke_sessions_with_tx;
use crate::app::posts::{delete_post_with_tx, lock_post};
use crate::app::users::{user_from_row, UserService, USER_COLUMNS};
use crate::domain::admin::AdminStats;
use crate::domain::user::{Role, User};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AdminService {
    db: Db,
}

impl AdminService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn stats(&self) -> Result<AdminStats> {
        let row = sqlx::query(
            "SELECT \
                (SELECT COUNT(*) FROM usuarios) AS users, \
                (SELECT COUNT(*) FROM postagens) AS posts, \
                (SELECT COUNT(*) FROM comentarios) AS comments, \
                (SELECT COUNT(*) FROM curtidas) AS likes, \
                (SELECT COUNT(*) FROM usuarios WHERE tipo = 'admin') AS admins, \
                (SELECT COUNT(*) FROM usuarios WHERE banido) AS banned",
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(AdminStats {
            users: row.get("users"),
            posts: row.get("posts"),
            comments: row.get("comments"),
            likes: row.get("likes"),
            admins: row.get("admins"),
            banned: row.get("banned"),
        })
    }

    pub async fn set_role(&self, user_id: i64, role: Role) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE usuarios SET tipo = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(role.as_db())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Banning also revokes the user's refresh tokens.
    pub async fn set_banned(&self, user_id: i64, banned: bool) -> Result<Option<User>> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE usuarios SET banido = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(banned)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        if banned {
            let revoked = revoke_sessions_with_tx(user_id, &mut tx).await?;
            tracing::debug!(user_id, revoked, "revoked sessions of banned user");
        }

        tx.commit().await?;
        user_from_row(&row).map(Some)
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let user_service = UserService::new(self.db.clone());
        user_service.delete_account(user_id).await
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;
        if !lock_post(post_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(false);
        }

        let deleted = delete_post_with_tx(post_id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comentarios WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
