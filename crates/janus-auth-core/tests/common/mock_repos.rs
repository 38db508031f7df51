//! Mock repositories for testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use janus_db::{
    AvatarRow, CreateAvatar, CreateUser, DbError, DbResult, UserRepository, UserRow,
};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
    by_phone: Arc<DashMap<i64, Uuid>>,
    avatars: Arc<DashMap<Uuid, AvatarRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    #[allow(dead_code)]
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        if let Some(phone) = user.phone_number {
            self.by_phone.insert(phone, user.id);
        }
        self.users.insert(user.id, user);
    }

    /// Build a user row with the given email and password hash
    #[allow(dead_code)]
    pub fn test_user(email: &str, password_hash: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            phone_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Number of persisted users
    #[allow(dead_code)]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_phone(&self, phone_number: i64) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_phone
            .get(&phone_number)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        // The entry API makes the uniqueness backstop atomic, so racing
        // creates behave like a real unique constraint.
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(DbError::UniqueViolation("users_email_key".to_string()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(user.id);
            }
        }

        if let Some(phone) = user.phone_number {
            match self.by_phone.entry(phone) {
                Entry::Occupied(_) => {
                    self.by_email.remove(&user.email);
                    return Err(DbError::UniqueViolation(
                        "users_phone_number_key".to_string(),
                    ));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(user.id);
                }
            }
        }

        let row = UserRow {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(user.id, row.clone());
        Ok(row)
    }

    async fn create_with_avatar(
        &self,
        user: CreateUser,
        avatar: CreateAvatar,
    ) -> DbResult<UserRow> {
        let row = self.create(user).await?;
        self.avatars.insert(
            row.id,
            AvatarRow {
                id: Uuid::new_v4(),
                public_id: avatar.public_id,
                url: avatar.url,
                user_id: row.id,
            },
        );
        Ok(row)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<UserRow> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(user.value().clone())
    }

    async fn find_avatar(&self, user_id: Uuid) -> DbResult<Option<AvatarRow>> {
        Ok(self.avatars.get(&user_id).map(|r| r.value().clone()))
    }

    async fn attach_avatar(&self, user_id: Uuid, avatar: CreateAvatar) -> DbResult<AvatarRow> {
        let row = AvatarRow {
            id: Uuid::new_v4(),
            public_id: avatar.public_id,
            url: avatar.url,
            user_id,
        };
        self.avatars.insert(user_id, row.clone());
        Ok(row)
    }
}
