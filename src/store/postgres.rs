/// Postgres-backed store.
///
/// Schema lives in `migrations/`. Session deletion for a user is also
/// enforced by the `ON DELETE CASCADE` on `sessions.user_id`, so account
/// deletion cannot leave live grants behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewUser, Session, SessionRecord, Store, StoreError, User};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        // 23505 = unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Duplicate;
        }
    }
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_digest, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_digest)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(User {
            id,
            email: user.email,
            name: user.name,
            password_digest: user.password_digest,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, email, name, password_digest FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, email, name, password_digest)| User {
            id,
            email,
            name,
            password_digest,
        }))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, email, name, password_digest FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, email, name, password_digest)| User {
            id,
            email,
            name,
            password_digest,
        }))
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            r#"
            UPDATE users SET name = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, email, name, password_digest
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, email, name, password_digest)| User {
            id,
            email,
            name,
            password_digest,
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        // Sessions cascade via the FK.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        refresh_token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, refresh_token_digest, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(refresh_token_digest)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Session {
            id,
            user_id,
            refresh_token_digest: refresh_token_digest.to_string(),
            expires_at,
        })
    }

    async fn find_session_by_digest(
        &self,
        digest: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                String,
                DateTime<Utc>,
                String,
                String,
                String,
            ),
        >(
            r#"
            SELECT s.id, s.user_id, s.refresh_token_digest, s.expires_at,
                   u.email, u.name, u.password_digest
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.refresh_token_digest = $1
            "#,
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(
            |(id, user_id, refresh_token_digest, expires_at, email, name, password_digest)| {
                SessionRecord {
                    session: Session {
                        id,
                        user_id,
                        refresh_token_digest,
                        expires_at,
                    },
                    user: User {
                        id: user_id,
                        email,
                        name,
                        password_digest,
                    },
                }
            },
        ))
    }

    async fn delete_sessions_by_digest(&self, digest: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_token_digest = $1")
            .bind(digest)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
