//! Database repository for identities and educator profiles.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};

const SELECT_USER: &str = r#"
    SELECT u.id, u.name, u.email, u.password_hash, u.role, e.id AS educator_id, e.nick_name
    FROM users u
    LEFT JOIN educators e ON e.user_id = u.id
"#;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert the user row and, when a nick name is given, its educator profile.
    ///
    /// Run this inside a transaction: a nick name clash fails after the user row is written.
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user_id: UserId = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.role)
        .fetch_one(&mut *self.db)
        .await?;

        if let Some(nick_name) = &request.nick_name {
            sqlx::query("INSERT INTO educators (user_id, nick_name) VALUES ($1, $2)")
                .bind(user_id)
                .bind(nick_name)
                .execute(&mut *self.db)
                .await?;
        }

        let query = format!("{SELECT_USER} WHERE u.id = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let query = format!("{SELECT_USER} WHERE u.id = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let query = format!("{SELECT_USER} WHERE u.email = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, password_hash), err)]
    pub async fn update_password_hash(&mut self, id: UserId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Educator profile and refresh session are removed by `ON DELETE CASCADE`
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}
