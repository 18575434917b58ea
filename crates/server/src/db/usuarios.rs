//! Customer account repository.
//!
//! Covers the `usuarios` table and the `password_reset` codes tied to it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tq_core::{Email, PasswordResetId, UserId};

use super::RepositoryError;
use crate::models::{Perfil, Usuario};

const USUARIO_COLUMNS: &str = "id, correo, nombre, celular, direccionentrega, created_at, updated_at";

/// Profile fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerfilUpdate {
    pub nombre: Option<String>,
    pub celular: Option<String>,
    pub direccionentrega: Option<String>,
}

/// Repository for customer accounts.
pub struct UsuarioRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UsuarioRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, correo: &Email) -> Result<Option<Usuario>, RepositoryError> {
        let sql = format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE correo = $1");
        let row = sqlx::query_as::<_, Usuario>(&sql)
            .bind(correo)
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Get an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Usuario>, RepositoryError> {
        let sql = format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE id = $1");
        let row = sqlx::query_as::<_, Usuario>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Get an account together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        correo: &Email,
    ) -> Result<Option<(Usuario, String)>, RepositoryError> {
        let Some(usuario) = self.get_by_email(correo).await? else {
            return Ok(None);
        };

        let hash: String = sqlx::query_scalar("SELECT password_hash FROM usuarios WHERE id = $1")
            .bind(usuario.id)
            .fetch_one(self.pool)
            .await?;

        Ok(Some((usuario, hash)))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        correo: &Email,
        password_hash: &str,
        perfil: &Perfil,
    ) -> Result<Usuario, RepositoryError> {
        let sql = format!(
            "INSERT INTO usuarios (correo, password_hash, nombre, celular, direccionentrega) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USUARIO_COLUMNS}"
        );

        sqlx::query_as::<_, Usuario>(&sql)
            .bind(correo)
            .bind(password_hash)
            .bind(&perfil.nombre)
            .bind(&perfil.celular)
            .bind(perfil.direccionentrega.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "email"))
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &PerfilUpdate,
    ) -> Result<Usuario, RepositoryError> {
        let sql = format!(
            "UPDATE usuarios SET \
                 nombre = COALESCE($2, nombre), \
                 celular = COALESCE($3, celular), \
                 direccionentrega = COALESCE($4, direccionentrega), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USUARIO_COLUMNS}"
        );

        sqlx::query_as::<_, Usuario>(&sql)
            .bind(id)
            .bind(update.nombre.as_deref())
            .bind(update.celular.as_deref())
            .bind(update.direccionentrega.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Password recovery
    // =========================================================================

    /// Store a new recovery code, voiding any earlier unused one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn create_password_reset(
        &self,
        usuario_id: UserId,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE password_reset SET used_at = now() WHERE usuario_id = $1 AND used_at IS NULL",
        )
        .bind(usuario_id)
        .execute(&mut *tx)
        .await?;

        let id: PasswordResetId = sqlx::query_scalar(
            "INSERT INTO password_reset (usuario_id, code_hash, expires_at) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(usuario_id)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    /// The unused, unexpired recovery code for an account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_password_reset(
        &self,
        usuario_id: UserId,
    ) -> Result<Option<(PasswordResetId, String)>, RepositoryError> {
        let row: Option<(PasswordResetId, String)> = sqlx::query_as(
            "SELECT id, code_hash FROM password_reset \
             WHERE usuario_id = $1 AND used_at IS NULL AND expires_at > now() \
             ORDER BY expires_at DESC LIMIT 1",
        )
        .bind(usuario_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Count a wrong guess against a recovery code.
    ///
    /// The code is voided (marked used) once `max_attempts` wrong guesses
    /// have been made. Returns the attempt count, or `None` if the code was
    /// already void.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_failed_reset_attempt(
        &self,
        reset_id: PasswordResetId,
        max_attempts: i32,
    ) -> Result<Option<i32>, RepositoryError> {
        let attempts: Option<i32> = sqlx::query_scalar(
            "UPDATE password_reset SET \
                 failed_attempts = failed_attempts + 1, \
                 used_at = CASE WHEN failed_attempts + 1 >= $2 THEN now() ELSE used_at END \
             WHERE id = $1 AND used_at IS NULL \
             RETURNING failed_attempts",
        )
        .bind(reset_id)
        .bind(max_attempts)
        .fetch_optional(self.pool)
        .await?;

        Ok(attempts)
    }

    /// Mark a recovery code used and set the new password in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code was used concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn consume_password_reset(
        &self,
        reset_id: PasswordResetId,
        usuario_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE password_reset SET used_at = now() \
             WHERE id = $1 AND usuario_id = $2 AND used_at IS NULL",
        )
        .bind(reset_id)
        .bind(usuario_id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() != 1 {
            return Err(RepositoryError::Conflict(
                "recovery code already used".to_owned(),
            ));
        }

        sqlx::query("UPDATE usuarios SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(usuario_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::test_support;

    fn in_minutes(minutes: i64) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(minutes)
    }

    #[tokio::test]
    #[ignore = "Requires a migrated database"]
    async fn test_recovery_code_is_single_use() {
        let pool = test_support::pool().await;
        let usuario = test_support::usuario(&pool).await;
        let repo = UsuarioRepository::new(&pool);

        let reset_id = repo
            .create_password_reset(usuario.id, "hash", in_minutes(30))
            .await
            .unwrap();
        let (active_id, code_hash) = repo.active_password_reset(usuario.id).await.unwrap().unwrap();
        assert_eq!(active_id, reset_id);
        assert_eq!(code_hash, "hash");

        repo.consume_password_reset(reset_id, usuario.id, "new-hash")
            .await
            .unwrap();
        assert!(matches!(
            repo.consume_password_reset(reset_id, usuario.id, "other-hash").await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(repo.active_password_reset(usuario.id).await.unwrap().is_none());

        let (_, password_hash) = repo.get_password_hash(&usuario.correo).await.unwrap().unwrap();
        assert_eq!(password_hash, "new-hash");
    }

    #[tokio::test]
    #[ignore = "Requires a migrated database"]
    async fn test_expired_recovery_code_is_not_active() {
        let pool = test_support::pool().await;
        let usuario = test_support::usuario(&pool).await;
        let repo = UsuarioRepository::new(&pool);

        repo.create_password_reset(usuario.id, "hash", in_minutes(-1))
            .await
            .unwrap();
        assert!(repo.active_password_reset(usuario.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires a migrated database"]
    async fn test_new_recovery_code_voids_older_one() {
        let pool = test_support::pool().await;
        let usuario = test_support::usuario(&pool).await;
        let repo = UsuarioRepository::new(&pool);

        let first = repo
            .create_password_reset(usuario.id, "first", in_minutes(30))
            .await
            .unwrap();
        let second = repo
            .create_password_reset(usuario.id, "second", in_minutes(30))
            .await
            .unwrap();

        let (active_id, _) = repo.active_password_reset(usuario.id).await.unwrap().unwrap();
        assert_eq!(active_id, second);
        assert!(matches!(
            repo.consume_password_reset(first, usuario.id, "new-hash").await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires a migrated database"]
    async fn test_wrong_guesses_void_recovery_code() {
        let pool = test_support::pool().await;
        let usuario = test_support::usuario(&pool).await;
        let repo = UsuarioRepository::new(&pool);

        let reset_id = repo
            .create_password_reset(usuario.id, "hash", in_minutes(30))
            .await
            .unwrap();

        for expected in 1..3 {
            assert_eq!(
                repo.record_failed_reset_attempt(reset_id, 3).await.unwrap(),
                Some(expected)
            );
            assert!(repo.active_password_reset(usuario.id).await.unwrap().is_some());
        }

        assert_eq!(repo.record_failed_reset_attempt(reset_id, 3).await.unwrap(), Some(3));
        assert!(repo.active_password_reset(usuario.id).await.unwrap().is_none());
        assert_eq!(repo.record_failed_reset_attempt(reset_id, 3).await.unwrap(), None);
    }
}
