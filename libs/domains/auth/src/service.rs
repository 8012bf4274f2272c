//! Auth Service - sign-in through the identity provider plus the local account rules

use std::sync::Arc;

use chrono::{Duration, Utc};
use contracts::identity::{TokenResponse, UserInfo};
use contracts::users::{
    AuthResult as AuthOutcome, CreateUserRequest, LoginResponse, UpdateProfileRequest, UserDto,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityProvider;
use crate::models::{DEFAULT_ROLE, User};
use crate::password::{hash_password, validate_password_strength, verify_password};
use crate::repository::UserRepository;

pub struct AuthService<R: UserRepository, P: IdentityProvider> {
    repository: Arc<R>,
    provider: Arc<P>,
}

impl<R: UserRepository, P: IdentityProvider> Clone for AuthService<R, P> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<R: UserRepository, P: IdentityProvider> AuthService<R, P> {
    pub fn new(repository: R, provider: P) -> Self {
        Self {
            repository: Arc::new(repository),
            provider: Arc::new(provider),
        }
    }

    async fn load(&self, user_id: &str) -> AuthResult<User> {
        self.repository
            .get_by_id(user_id)
            .await?
            .ok_or_else(AuthError::user_not_found)
    }

    fn login_response(tokens: TokenResponse, user: User) -> LoginResponse {
        LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
            require_password_change: user.require_password_change,
            user: user.into(),
        }
    }

    // Provider-delegated flow

    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> AuthResult<String> {
        self.provider.authorization_url(redirect_uri, state)
    }

    /// Completes the authorization code flow and syncs the local user from the
    /// provider's profile.
    #[instrument(skip(self, code))]
    pub async fn handle_callback(
        &self,
        code: &str,
        state: &str,
        redirect_uri: &str,
    ) -> AuthResult<LoginResponse> {
        let tokens = self.provider.exchange_code(code, redirect_uri).await?;
        let info = self.provider.user_info(&tokens.access_token).await?;

        // Local accounts are keyed by email; an empty one would match any other
        // provider account that also lacks an email.
        if info.email.trim().is_empty() {
            tracing::warn!(sub = %info.sub, "Identity provider profile has no email");
            return Err(AuthError::IdentityProvider(
                "Identity provider did not return an email address".to_string(),
            ));
        }

        let user = match self.repository.get_by_email(&info.email).await? {
            Some(mut existing) => {
                sync_from_provider(&mut existing, &info);
                existing.record_login();
                self.repository.update(existing).await?
            }
            None => {
                let mut user = user_from_provider(&info);
                user.record_login();
                let created = self.repository.create(user).await?;
                tracing::info!(user_id = %created.id, "Created user from identity provider");
                created
            }
        };

        Ok(Self::login_response(tokens, user))
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<LoginResponse> {
        let tokens = self.provider.refresh_token(refresh_token).await?;
        let info = self.provider.user_info(&tokens.access_token).await?;
        let user = self.load(&info.sub).await?;

        Ok(Self::login_response(tokens, user))
    }

    #[instrument(skip_all)]
    pub async fn validate_token(&self, token: &str) -> bool {
        self.provider.validate_token(token).await
    }

    #[instrument(skip_all)]
    pub async fn user_info(&self, access_token: &str) -> AuthResult<UserInfo> {
        self.provider.user_info(access_token).await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> AuthResult<UserDto> {
        self.load(user_id).await.map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileRequest,
    ) -> AuthResult<UserDto> {
        input.validate()?;

        let mut user = self.load(user_id).await?;
        user.apply_profile_update(input, user_id);

        let updated = self.repository.update(user).await?;
        Ok(updated.into())
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> AuthOutcome {
        if self.provider.revoke_token(refresh_token).await {
            AuthOutcome::ok("Logged out successfully")
        } else {
            AuthOutcome::failure("Failed to logout", Vec::new())
        }
    }

    pub fn logout_url(&self, redirect_uri: &str, id_token: &str) -> AuthResult<String> {
        self.provider.logout_url(redirect_uri, id_token)
    }

    // Local credentials

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: CreateUserRequest) -> AuthResult<UserDto> {
        input.validate()?;

        if self.repository.exists_by_email(&input.email).await? {
            return Err(AuthError::Conflict(format!(
                "User with email '{}' already exists",
                input.email
            )));
        }
        if self.repository.exists_by_username(&input.username).await? {
            return Err(AuthError::Conflict(format!(
                "User with username '{}' already exists",
                input.username
            )));
        }

        validate_password_strength(&input.password)?;
        let hash = hash_password(&input.password)?;

        let id = Uuid::now_v7().to_string();
        let mut user = User::new(id.clone(), input.email, input.username);
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.phone_number = input.phone_number.filter(|p| !p.is_empty());
        user.set_password_hash(hash);
        user.generate_email_verification_token();
        user.created_by = Some(id.clone());
        user.updated_by = Some(id);

        let created = self.repository.create(user).await?;
        tracing::info!(user_id = %created.id, "Registered user");
        Ok(created.into())
    }

    /// Lockout is checked before the password, so a locked account is rejected even
    /// with the right password.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AuthResult<UserDto> {
        let mut user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }
        if user.is_locked_out() {
            if let Some(until) = user.lockout_end {
                return Err(AuthError::AccountLocked(until));
            }
        }

        if !verify_password(password, &user.password_hash) {
            user.record_failed_login();
            let attempts = user.failed_login_attempts;
            self.repository.update(user).await?;
            tracing::warn!(attempts, "Failed login");
            return Err(AuthError::InvalidCredentials);
        }

        user.record_login();
        let updated = self.repository.update(user).await?;
        Ok(updated.into())
    }

    /// Returns the new reset token, or `None` when no account has this email.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<Option<String>> {
        let Some(mut user) = self.repository.get_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = user.generate_password_reset_token();
        self.repository.update(user).await?;
        Ok(Some(token))
    }

    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let mut user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if !user.is_password_reset_token_valid(token) {
            return Err(AuthError::InvalidResetToken);
        }

        validate_password_strength(new_password)?;
        user.set_password_hash(hash_password(new_password)?);
        user.clear_password_reset_token();
        user.reset_failed_login_attempts();

        self.repository.update(user).await?;
        Ok(())
    }
}

fn user_from_provider(info: &UserInfo) -> User {
    let username = if info.username.is_empty() {
        info.email.clone()
    } else {
        info.username.clone()
    };

    let mut user = User::new(info.sub.clone(), info.email.clone(), username);
    user.first_name = info.given_name.clone();
    user.last_name = info.family_name.clone();
    user.is_email_verified = info.email_verified;
    if !info.roles.is_empty() {
        user.roles = info.roles.clone();
    } else {
        user.roles = vec![DEFAULT_ROLE.to_string()];
    }
    user.created_by = Some(info.sub.clone());
    user.updated_by = Some(info.sub.clone());
    user
}

fn sync_from_provider(user: &mut User, info: &UserInfo) {
    user.first_name = info.given_name.clone();
    user.last_name = info.family_name.clone();
    if !info.username.is_empty() {
        user.username = info.username.clone();
    }
    user.is_email_verified = info.email_verified;
    if !info.roles.is_empty() {
        user.roles = info.roles.clone();
    }
    user.updated_by = Some(info.sub.clone());
    user.touch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MockIdentityProvider;
    use crate::models::MAX_FAILED_LOGIN_ATTEMPTS;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use std::collections::HashMap;

    const PASSWORD: &str = "Sup3r$ecret";

    fn tokens() -> TokenResponse {
        TokenResponse {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            id_token: Some("id".into()),
            token_type: "Bearer".into(),
            expires_in: 300,
            refresh_expires_in: 1800,
            scope: Some("openid profile email".into()),
        }
    }

    fn info(roles: &[&str]) -> UserInfo {
        UserInfo {
            sub: "kc-42".into(),
            email: "ada@example.com".into(),
            email_verified: true,
            username: "ada".into(),
            given_name: "Ada".into(),
            family_name: "Lovelace".into(),
            name: "Ada Lovelace".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            claims: HashMap::new(),
        }
    }

    fn provider_for_login(roles: &'static [&'static str]) -> MockIdentityProvider {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_exchange_code()
            .returning(|_, _| Ok(tokens()));
        provider
            .expect_user_info()
            .returning(move |_| Ok(info(roles)));
        provider
    }

    fn registration(email: &str, username: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            username: username.into(),
            password: PASSWORD.into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            phone_number: None,
        }
    }

    fn local_service() -> AuthService<InMemoryUserRepository, MockIdentityProvider> {
        AuthService::new(InMemoryUserRepository::new(), MockIdentityProvider::new())
    }

    #[tokio::test]
    async fn test_callback_creates_user_from_provider_profile() {
        let service = AuthService::new(InMemoryUserRepository::new(), provider_for_login(&[]));

        let before = Utc::now();
        let response = service.handle_callback("code", "state", "http://app/cb").await.unwrap();

        assert_eq!(response.access_token, "access");
        assert_eq!(response.refresh_token, "refresh");
        assert!(response.expires_at >= before + Duration::seconds(300));
        assert_eq!(response.user.id, "kc-42");
        assert_eq!(response.user.username, "ada");
        assert_eq!(response.user.full_name, "Ada Lovelace");
        assert!(response.user.email_confirmed);
        assert_eq!(response.user.roles, vec!["User"]);
        assert!(response.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_callback_updates_existing_user() {
        let repository = InMemoryUserRepository::new();
        let mut existing = User::new("kc-42", "ada@example.com", "old-name");
        existing.roles = vec!["Admin".into()];
        existing.failed_login_attempts = 3;
        repository.create(existing).await.unwrap();

        let service = AuthService::new(repository.clone(), provider_for_login(&[]));
        let response = service.handle_callback("code", "state", "http://app/cb").await.unwrap();

        assert_eq!(response.user.username, "ada");
        // Provider sent no roles, so the local ones stay.
        assert_eq!(response.user.roles, vec!["Admin"]);
        assert_eq!(response.user.failed_login_attempts, 0);

        let stored = repository.get_by_id("kc-42").await.unwrap().unwrap();
        assert_eq!(stored.updated_by.as_deref(), Some("kc-42"));
    }

    #[tokio::test]
    async fn test_callback_takes_provider_roles() {
        let repository = InMemoryUserRepository::new();
        repository
            .create(User::new("kc-42", "ada@example.com", "ada"))
            .await
            .unwrap();

        let service = AuthService::new(repository, provider_for_login(&["Admin", "User"]));
        let response = service.handle_callback("code", "state", "http://app/cb").await.unwrap();
        assert_eq!(response.user.roles, vec!["Admin", "User"]);
    }

    #[tokio::test]
    async fn test_callback_without_email_is_rejected() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_exchange_code()
            .returning(|_, _| Ok(tokens()));
        provider.expect_user_info().returning(|_| {
            Ok(UserInfo {
                sub: "kc-43".into(),
                email: String::new(),
                ..info(&[])
            })
        });

        let mut repository = MockUserRepository::new();
        repository.expect_get_by_email().never();
        repository.expect_create().never();

        let service = AuthService::new(repository, provider);
        let err = service.handle_callback("code", "s", "http://app/cb").await.unwrap_err();
        assert!(matches!(err, AuthError::IdentityProvider(_)));
        assert_eq!(err.to_string(), "Identity provider did not return an email address");
    }

    #[tokio::test]
    async fn test_callback_propagates_exchange_failure() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_exchange_code().returning(|_, _| {
            Err(AuthError::IdentityProvider(
                "Failed to exchange authorization code for token".into(),
            ))
        });
        provider.expect_user_info().never();

        let service = AuthService::new(MockUserRepository::new(), provider);
        let err = service.handle_callback("bad", "s", "http://app/cb").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to exchange authorization code for token");
    }

    #[tokio::test]
    async fn test_refresh_requires_local_user() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_refresh_token().returning(|_| Ok(tokens()));
        provider.expect_user_info().returning(|_| Ok(info(&[])));

        let mut repository = MockUserRepository::new();
        repository.expect_get_by_id().times(1).returning(|_| Ok(None));

        let service = AuthService::new(repository, provider);
        let err = service.refresh("refresh").await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn test_logout_reports_revocation_outcome() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_revoke_token().times(1).returning(|_| true);
        let service = AuthService::new(MockUserRepository::new(), provider);
        let outcome = service.logout("refresh").await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "Logged out successfully");

        let mut provider = MockIdentityProvider::new();
        provider.expect_revoke_token().times(1).returning(|_| false);
        let service = AuthService::new(MockUserRepository::new(), provider);
        let outcome = service.logout("refresh").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to logout");
    }

    #[tokio::test]
    async fn test_update_profile_sets_updated_by() {
        let service = local_service();
        let user = service.register(registration("g@example.com", "grace")).await.unwrap();

        let updated = service
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    time_zone: Some("Europe/Berlin".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.time_zone, "Europe/Berlin");
        assert_eq!(updated.first_name, "Grace");

        let err = service
            .update_profile("missing", UpdateProfileRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let service = local_service();
        service.register(registration("g@example.com", "grace")).await.unwrap();

        let err = service
            .register(registration("G@example.com", "someone-else"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let err = service
            .register(registration("other@example.com", "grace"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let service = local_service();
        let mut request = registration("g@example.com", "grace");
        request.password = "alllowercase1!".into();

        let err = service.register(request).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_locked_out_even_with_right_password() {
        let service = local_service();
        service.register(registration("g@example.com", "grace")).await.unwrap();

        for _ in 0..MAX_FAILED_LOGIN_ATTEMPTS {
            let err = service
                .verify_credentials("g@example.com", "wrong")
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        let err = service
            .verify_credentials("g@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked(_)));
    }

    #[tokio::test]
    async fn test_successful_login_resets_counter() {
        let service = local_service();
        service.register(registration("g@example.com", "grace")).await.unwrap();

        service.verify_credentials("g@example.com", "wrong").await.unwrap_err();
        let user = service.verify_credentials("g@example.com", PASSWORD).await.unwrap();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.last_login_at.is_some());

        let err = service.verify_credentials("nobody@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_account_is_disabled() {
        let repository = InMemoryUserRepository::new();
        let service = AuthService::new(repository.clone(), MockIdentityProvider::new());
        let user = service.register(registration("g@example.com", "grace")).await.unwrap();

        let mut stored = repository.get_by_id(&user.id).await.unwrap().unwrap();
        stored.is_active = false;
        repository.update(stored).await.unwrap();

        let err = service.verify_credentials("g@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let service = local_service();
        service.register(registration("g@example.com", "grace")).await.unwrap();

        assert!(service.request_password_reset("nobody@example.com").await.unwrap().is_none());
        let token = service
            .request_password_reset("g@example.com")
            .await
            .unwrap()
            .unwrap();

        let err = service
            .reset_password("g@example.com", "bogus", "N3w$ecret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
        service.reset_password("g@example.com", &token, "N3w$ecret").await.unwrap();

        service.verify_credentials("g@example.com", "N3w$ecret").await.unwrap();
        // Tokens are single use.
        assert!(service.reset_password("g@example.com", &token, "An0ther$1").await.is_err());
    }
}
