//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{AvatarRow, UserRow};
use crate::repo::{CreateAvatar, CreateUser, UserRepository};

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, phone_number, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, phone_number, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_phone(&self, phone_number: i64) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, phone_number, created_at, updated_at
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, phone_number, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create_with_avatar(
        &self,
        user: CreateUser,
        avatar: CreateAvatar,
    ) -> DbResult<UserRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, phone_number, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.phone_number)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO avatars (id, public_id, url, user_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&avatar.public_id)
        .bind(&avatar.url)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, name, email, password_hash, phone_number, created_at, updated_at
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DbError::NotFound)
    }

    async fn find_avatar(&self, user_id: Uuid) -> DbResult<Option<AvatarRow>> {
        let avatar = sqlx::query_as::<_, AvatarRow>(
            r#"
            SELECT id, public_id, url, user_id
            FROM avatars
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(avatar)
    }

    async fn attach_avatar(&self, user_id: Uuid, avatar: CreateAvatar) -> DbResult<AvatarRow> {
        let row = sqlx::query_as::<_, AvatarRow>(
            r#"
            INSERT INTO avatars (id, public_id, url, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, public_id, url, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&avatar.public_id)
        .bind(&avatar.url)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
