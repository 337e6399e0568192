use anyhow::Result;

use crate::domain::engagement::LikeState;
use crate::infra::db::Db;

#[derive(Debug)]
pub enum ToggleOutcome {
    Toggled(LikeState),
    PostNotFound,
    UserNotFound,
}

#[derive(Clone)]
pub struct LikeService {
    db: Db,
}

impl LikeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Flips the like of `user_id` on `post_id`.
    pub async fn toggle(&self, user_id: i64, post_id: i64) -> Result<ToggleOutcome> {
        let mut tx = self.db.pool().begin().await?;

        // Serialises concurrent toggles from the same user. NO KEY UPDATE still
        // lets the user's post and comment inserts take their KEY SHARE locks.
        let user = sqlx::query("SELECT id FROM usuarios WHERE id = $1 FOR NO KEY UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            tx.rollback().await?;
            return Ok(ToggleOutcome::UserNotFound);
        }

        let post = sqlx::query("SELECT id FROM postagens WHERE id = $1 FOR KEY SHARE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            tx.rollback().await?;
            return Ok(ToggleOutcome::PostNotFound);
        }

        let removed = sqlx::query("DELETE FROM curtidas WHERE usuario_id = $1 AND postagem_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed == 0 {
            sqlx::query(
                "INSERT INTO curtidas (usuario_id, postagem_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
            true
        } else {
            false
        };

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM curtidas WHERE postagem_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ToggleOutcome::Toggled(LikeState { liked, total }))
    }

    pub async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM curtidas WHERE usuario_id = $1 AND postagem_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(liked)
    }

    pub async fn count(&self, post_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM curtidas WHERE postagem_id = $1")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(total)
    }
}
