//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Avatar row from the database
#[derive(Debug, Clone, FromRow)]
pub struct AvatarRow {
    pub id: Uuid,
    pub public_id: String,
    pub url: String,
    pub user_id: Uuid,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> janus_types::UserId {
        janus_types::UserId(self.id)
    }
}
