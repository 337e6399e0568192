use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};
use time::OffsetDateTime;

use crate::app::{check_owner, Owned};
use crate::domain::engagement::Comment;
use crate::infra::db::Db;

const COMMENT_SELECT: &str = "SELECT m.id, m.postagem_id, m.usuario_id, u.nome AS autor_nome, \
            u.foto_perfil AS autor_foto, m.texto, m.criado_em \
     FROM comentarios m \
     JOIN usuarios u ON u.id = m.usuario_id";

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("postagem_id"),
        author_id: row.get("usuario_id"),
        author_name: row.get("autor_nome"),
        author_photo: row.get("autor_foto"),
        text: row.get("texto"),
        created_at: row.get("criado_em"),
    }
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Returns `None` when the post does not exist.
    pub async fn create_comment(
        &self,
        author_id: i64,
        post_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let mut tx = self.db.pool().begin().await?;

        // Held until commit so a concurrent post delete waits for the insert.
        let post = sqlx::query("SELECT id FROM postagens WHERE id = $1 FOR KEY SHARE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query(
            "WITH inserted_comment AS ( \
                INSERT INTO comentarios (usuario_id, postagem_id, texto) \
                VALUES ($1, $2, $3) \
                RETURNING id, usuario_id, postagem_id, texto, criado_em \
             ) \
             SELECT m.*, u.nome AS autor_nome, u.foto_perfil AS autor_foto \
             FROM inserted_comment m \
             JOIN usuarios u ON u.id = m.usuario_id",
        )
        .bind(author_id)
        .bind(post_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(comment_from_row(&row)))
    }

    /// Oldest first, so the cursor walks forward in time.
    pub async fn list_comments(
        &self,
        post_id: i64,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let rows = match cursor {
            Some((created_at, comment_id)) => {
                sqlx::query(&format!(
                    "{} \
                     WHERE m.postagem_id = $1 \
                       AND (m.criado_em > $2 OR (m.criado_em = $2 AND m.id > $3)) \
                     ORDER BY m.criado_em ASC, m.id ASC \
                     LIMIT $4",
                    COMMENT_SELECT
                ))
                .bind(post_id)
                .bind(created_at)
                .bind(comment_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} \
                     WHERE m.postagem_id = $1 \
                     ORDER BY m.criado_em ASC, m.id ASC \
                     LIMIT $2",
                    COMMENT_SELECT
                ))
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn update_comment(
        &self,
        comment_id: i64,
        actor_id: i64,
        text: String,
    ) -> Result<Owned<Comment>> {
        let mut tx = self.db.pool().begin().await?;

        let owner_id = lock_comment_owner(comment_id, &mut tx).await?;
        match check_owner(owner_id, actor_id) {
            Owned::Done(()) => {}
            Owned::NotFound => {
                tx.rollback().await?;
                return Ok(Owned::NotFound);
            }
            Owned::Forbidden => {
                tx.rollback().await?;
                return Ok(Owned::Forbidden);
            }
        }

        sqlx::query("UPDATE comentarios SET texto = $2 WHERE id = $1")
            .bind(comment_id)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!("{} WHERE m.id = $1", COMMENT_SELECT))
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Owned::Done(comment_from_row(&row)))
    }

    pub async fn delete_comment(&self, comment_id: i64, actor_id: i64) -> Result<Owned<()>> {
        let mut tx = self.db.pool().begin().await?;

        let owner_id = lock_comment_owner(comment_id, &mut tx).await?;
        let outcome = check_owner(owner_id, actor_id);
        if !matches!(outcome, Owned::Done(())) {
            tx.rollback().await?;
            return Ok(outcome);
        }

        sqlx::query("DELETE FROM comentarios WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Owned::Done(()))
    }
}

async fn lock_comment_owner(
    comment_id: i64,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Option<i64>> {
    let owner_id: Option<i64> =
        sqlx::query_scalar("SELECT usuario_id FROM comentarios WHERE id = $1 FOR UPDATE")
            .bind(comment_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(owner_id)
}
