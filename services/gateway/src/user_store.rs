//! User accounts: registration and login lookups.
//!
//! Lives in the gateway rather than its own workspace crate since
//! register/login are ambient auth plumbing, not a named domain
//! component — grounded on `ledger_store`/`order_store`'s `sqlx` pool
//! and migration pattern.

use sqlx::PgPool;
use types::ids::UserId;
use types::prelude::User;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("login already taken")]
    UserExists,

    #[error("user not found")]
    UserNotFound,
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                uuid UUID PRIMARY KEY,
                login TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<UserId, UserStoreError> {
        let user = User::new(login, password_hash);

        let result = sqlx::query("INSERT INTO users (uuid, login, password_hash) VALUES ($1, $2, $3)")
            .bind(user.id.as_uuid())
            .bind(&user.login)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(user.id),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(UserStoreError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_login(&self, login: &str) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, (uuid::Uuid, String, String)>(
            "SELECT uuid, login, password_hash FROM users WHERE login = $1",
        )
        .bind(login.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        let (uuid, login, password_hash) = row.ok_or(UserStoreError::UserNotFound)?;
        Ok(User {
            id: UserId::from_uuid(uuid),
            login,
            password_hash,
        })
    }
}
