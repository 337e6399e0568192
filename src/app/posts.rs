use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};
use time::OffsetDateTime;

use crate::app::{check_owner, Owned};
use crate::domain::post::Post;
use crate::infra::db::Db;

const POST_SELECT: &str = "SELECT p.id, p.usuario_id, u.nome AS autor_nome, u.foto_perfil AS autor_foto, \
            p.conteudo, p.imagem, p.criado_em, \
            (SELECT COUNT(*) FROM curtidas c WHERE c.postagem_id = p.id) AS total_curtidas, \
            (SELECT COUNT(*) FROM comentarios m WHERE m.postagem_id = p.id) AS total_comentarios \
     FROM postagens p \
     JOIN usuarios u ON u.id = p.usuario_id";

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("usuario_id"),
        author_name: row.get("autor_nome"),
        author_photo: row.get("autor_foto"),
        content: row.get("conteudo"),
        image: row.get("imagem"),
        created_at: row.get("criado_em"),
        total_curtidas: row.get("total_curtidas"),
        total_comentarios: row.get("total_comentarios"),
    }
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        content: String,
        image: Option<String>,
    ) -> Result<Post> {
        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO postagens (usuario_id, conteudo, imagem) \
                VALUES ($1, $2, $3) \
                RETURNING id, usuario_id, conteudo, imagem, criado_em \
             ) \
             SELECT p.*, u.nome AS autor_nome, u.foto_perfil AS autor_foto, \
                    0::BIGINT AS total_curtidas, 0::BIGINT AS total_comentarios \
             FROM inserted_post p \
             JOIN usuarios u ON u.id = p.usuario_id",
        )
        .bind(author_id)
        .bind(content)
        .bind(image)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn exists(&self, post_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM postagens WHERE id = $1)")
                .bind(post_id)
                .fetch_one(self.db.pool())
                .await?;
        Ok(exists)
    }

    pub async fn update_post(
        &self,
        post_id: i64,
        actor_id: i64,
        content: String,
        image: Option<String>,
    ) -> Result<Owned<Post>> {
        let mut tx = self.db.pool().begin().await?;

        let owner_id = lock_post_owner(post_id, &mut tx).await?;
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

        sqlx::query("UPDATE postagens SET conteudo = $2, imagem = $3 WHERE id = $1")
            .bind(post_id)
            .bind(content)
            .bind(image)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Owned::Done(post_from_row(&row)))
    }

    /// Owner-only delete. Likes and comments go first, in the same transaction.
    pub async fn delete_post(&self, post_id: i64, actor_id: i64) -> Result<Owned<()>> {
        let mut tx = self.db.pool().begin().await?;

        let owner_id = lock_post_owner(post_id, &mut tx).await?;
        let outcome = check_owner(owner_id, actor_id);
        if !matches!(outcome, Owned::Done(())) {
            tx.rollback().await?;
            return Ok(outcome);
        }

        delete_post_with_tx(post_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Owned::Done(()))
    }

    pub async fn list_posts(
        &self,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(&format!(
                    "{} \
                     WHERE (p.criado_em < $1 OR (p.criado_em = $1 AND p.id < $2)) \
                     ORDER BY p.criado_em DESC, p.id DESC \
                     LIMIT $3",
                    POST_SELECT
                ))
                .bind(created_at)
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} ORDER BY p.criado_em DESC, p.id DESC LIMIT $1",
                    POST_SELECT
                ))
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn list_by_user(
        &self,
        author_id: i64,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(&format!(
                    "{} \
                     WHERE p.usuario_id = $1 \
                       AND (p.criado_em < $2 OR (p.criado_em = $2 AND p.id < $3)) \
                     ORDER BY p.criado_em DESC, p.id DESC \
                     LIMIT $4",
                    POST_SELECT
                ))
                .bind(author_id)
                .bind(created_at)
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} \
                     WHERE p.usuario_id = $1 \
                     ORDER BY p.criado_em DESC, p.id DESC \
                     LIMIT $2",
                    POST_SELECT
                ))
                .bind(author_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(post_from_row).collect())
    }
}

async fn lock_post_owner(
    post_id: i64,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Option<i64>> {
    let owner_id: Option<i64> =
        sqlx::query_scalar("SELECT usuario_id FROM postagens WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(owner_id)
}

/// Removes a post and everything hanging off it. The caller holds the row lock.
pub(crate) async fn delete_post_with_tx(
    post_id: i64,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<bool> {
    sqlx::query("DELETE FROM curtidas WHERE postagem_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM comentarios WHERE postagem_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let result = sqlx::query("DELETE FROM postagens WHERE id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn lock_post(post_id: i64, tx: &mut Transaction<'_, Postgres>) -> Result<bool> {
    Ok(lock_post_owner(post_id, tx).await?.is_some())
}
