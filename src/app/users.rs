use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};
use time::OffsetDateTime;

use crate::domain::user::{PublicUser, Role, User};
use crate::infra::db::Db;

pub(crate) const USER_COLUMNS: &str =
    "id, nome, email, bio, foto_perfil, tipo, banido, criado_em";

pub(crate) fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("tipo");
    let role = Role::from_db(&role).ok_or_else(|| anyhow!("unknown user role: {}", role))?;
    Ok(User {
        id: row.get("id"),
        name: row.get("nome"),
        email: row.get("email"),
        bio: row.get("bio"),
        photo: row.get("foto_perfil"),
        role,
        banned: row.get("banido"),
        created_at: row.get("criado_em"),
    })
}

/// Role and ban flag of an existing account.
#[derive(Debug, Clone, Copy)]
pub struct AccountStatus {
    pub role: Role,
    pub banned: bool,
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM usuarios WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn account_status(&self, user_id: i64) -> Result<Option<AccountStatus>> {
        let row = sqlx::query("SELECT tipo, banido FROM usuarios WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let role: String = row.get("tipo");
        let role = Role::from_db(&role).ok_or_else(|| anyhow!("unknown user role: {}", role))?;
        Ok(Some(AccountStatus {
            role,
            banned: row.get("banido"),
        }))
    }

    pub async fn get_public_user(&self, user_id: i64) -> Result<Option<PublicUser>> {
        let row = sqlx::query(&format!(
            "SELECT {}, (SELECT COUNT(*) FROM postagens p WHERE p.usuario_id = usuarios.id) AS posts_count \
             FROM usuarios WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => {
                let posts_count: i64 = row.get("posts_count");
                Ok(Some(PublicUser::from_user_with_posts(
                    user_from_row(&row)?,
                    posts_count,
                )))
            }
            None => Ok(None),
        }
    }

    pub async fn list_public(
        &self,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<PublicUser>> {
        let rows = self.list_rows(cursor, limit).await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let posts_count: i64 = row.get("posts_count");
            users.push(PublicUser::from_user_with_posts(
                user_from_row(&row)?,
                posts_count,
            ));
        }
        Ok(users)
    }

    /// Full records, including email and ban flag, for the admin panel.
    pub async fn list_users(
        &self,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<User>> {
        let rows = self.list_rows(cursor, limit).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_rows(
        &self,
        cursor: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<PgRow>> {
        let rows = match cursor {
            Some((created_at, user_id)) => {
                sqlx::query(&format!(
                    "SELECT {}, (SELECT COUNT(*) FROM postagens p WHERE p.usuario_id = usuarios.id) AS posts_count \
                     FROM usuarios \
                     WHERE (criado_em < $1 OR (criado_em = $1 AND id < $2)) \
                     ORDER BY criado_em DESC, id DESC \
                     LIMIT $3",
                    USER_COLUMNS
                ))
                .bind(created_at)
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {}, (SELECT COUNT(*) FROM postagens p WHERE p.usuario_id = usuarios.id) AS posts_count \
                     FROM usuarios \
                     ORDER BY criado_em DESC, id DESC \
                     LIMIT $1",
                    USER_COLUMNS
                ))
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };
        Ok(rows)
    }

    /// `None` keeps a field; `Some(None)` clears `bio` or `photo`.
    pub async fn update_profile(
        &self,
        user_id: i64,
        name: Option<String>,
        bio: Option<Option<String>>,
        photo: Option<Option<String>>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE usuarios \
             SET nome = COALESCE($2, nome), \
                 bio = CASE WHEN $3 THEN $4 ELSE bio END, \
                 foto_perfil = CASE WHEN $5 THEN $6 ELSE foto_perfil END \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(bio.is_some())
        .bind(bio.flatten())
        .bind(photo.is_some())
        .bind(photo.flatten())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Delete the account together with its posts, comments, likes and sessions.
    pub async fn delete_account(&self, user_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;
        let deleted = delete_user_with_tx(user_id, &mut tx).await?;
        if deleted {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(deleted)
    }
}

async fn delete_user_with_tx(
    user_id: i64,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<bool> {
    let exists = sqlx::query("SELECT id FROM usuarios WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    // Locking the posts blocks concurrent likes/comments from referencing them.
    sqlx::query("SELECT id FROM postagens WHERE usuario_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;

    sqlx::query(
        "DELETE FROM curtidas \
         WHERE usuario_id = $1 \
            OR postagem_id IN (SELECT id FROM postagens WHERE usuario_id = $1)",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "DELETE FROM comentarios \
         WHERE usuario_id = $1 \
            OR postagem_id IN (SELECT id FROM postagens WHERE usuario_id = $1)",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM postagens WHERE usuario_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM refresh_tokens WHERE usuario_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}
