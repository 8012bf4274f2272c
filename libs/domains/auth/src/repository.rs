use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AuthError, AuthResult};
use crate::models::User;

/// Data access for local user records.
///
/// Email and username lookups are case-insensitive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> AuthResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    async fn get_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    async fn create(&self, user: User) -> AuthResult<User>;

    async fn update(&self, user: User) -> AuthResult<User>;

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool>;

    async fn exists_by_username(&self, username: &str) -> AuthResult<bool>;
}

/// Process-local store for tests and running without a database.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().await.values().find(|u| predicate(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self.find(|u| u.email.eq_ignore_ascii_case(email)).await)
    }

    async fn get_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self.find(|u| u.username.eq_ignore_ascii_case(username)).await)
    }

    async fn create(&self, user: User) -> AuthResult<User> {
        let mut users = self.users.write().await;
        let taken = users.values().any(|u| {
            u.email.eq_ignore_ascii_case(&user.email)
                || u.username.eq_ignore_ascii_case(&user.username)
        });
        if users.contains_key(&user.id) || taken {
            return Err(AuthError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> AuthResult<User> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user)
            }
            None => Err(AuthError::user_not_found()),
        }
    }

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    async fn exists_by_username(&self, username: &str) -> AuthResult<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookups_ignore_case() {
        let repo = InMemoryUserRepository::new();
        repo.create(User::new("kc-1", "Ada@Example.com", "Ada"))
            .await
            .unwrap();

        assert!(repo.exists_by_email("ada@example.com").await.unwrap());
        assert!(repo.exists_by_username("ADA").await.unwrap());
        assert!(repo.get_by_id("kc-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(User::new("kc-1", "ada@example.com", "ada"))
            .await
            .unwrap();

        let result = repo
            .create(User::new("kc-2", "ADA@example.com", "someone"))
            .await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.update(User::new("kc-1", "a@b.io", "a")).await;
        assert!(matches!(result, Err(AuthError::NotFound(_))));
    }
}
