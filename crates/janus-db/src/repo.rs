//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{AvatarRow, UserRow};

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<i64>,
}

/// Create avatar input
#[derive(Debug, Clone)]
pub struct CreateAvatar {
    pub public_id: String,
    pub url: String,
}

/// User repository trait
///
/// Multi-statement writes are exposed as named atomic operations;
/// implementations must roll back every write of an operation that
/// fails partway.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by phone number
    async fn find_by_phone(&self, phone_number: i64) -> DbResult<Option<UserRow>>;

    /// Insert a new user. A uniqueness conflict on email or phone
    /// surfaces as [`DbError::UniqueViolation`](crate::DbError).
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Insert a user and an avatar as one transactional unit; neither
    /// row exists if either write fails.
    async fn create_with_avatar(
        &self,
        user: CreateUser,
        avatar: CreateAvatar,
    ) -> DbResult<UserRow>;

    /// Replace a user's password hash
    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<UserRow>;

    /// Find a user's avatar
    async fn find_avatar(&self, user_id: Uuid) -> DbResult<Option<AvatarRow>>;

    /// Attach an avatar to an existing user
    async fn attach_avatar(&self, user_id: Uuid, avatar: CreateAvatar) -> DbResult<AvatarRow>;
}
