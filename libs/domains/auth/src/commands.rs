//! Commands and queries served by [`AuthService`].

use async_trait::async_trait;
use contracts::identity::UserInfo;
use contracts::users::{AuthResult as AuthOutcome, LoginResponse, UpdateProfileRequest, UserDto};
use contracts::{Handler, Request};

use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityProvider;
use crate::repository::UserRepository;
use crate::service::AuthService;

#[derive(Debug, Clone)]
pub struct GetAuthorizationUrlCommand {
    pub redirect_uri: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct HandleCallbackCommand {
    pub code: String,
    pub state: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenCommand {
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct ValidateTokenCommand {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct GetUserInfoCommand {
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct GetLogoutUrlCommand {
    pub redirect_uri: String,
    /// Empty when the client has no ID token to hint with
    pub id_token: String,
}

#[derive(Debug, Clone)]
pub struct LogoutCommand {
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct UpdateProfileCommand {
    pub user_id: String,
    pub request: UpdateProfileRequest,
}

#[derive(Debug, Clone)]
pub struct GetUserByIdQuery {
    pub user_id: String,
}

impl Request for GetAuthorizationUrlCommand {
    type Response = String;
}

impl Request for HandleCallbackCommand {
    type Response = LoginResponse;
}

impl Request for RefreshTokenCommand {
    type Response = LoginResponse;
}

impl Request for ValidateTokenCommand {
    type Response = bool;
}

impl Request for GetUserInfoCommand {
    type Response = UserInfo;
}

impl Request for GetLogoutUrlCommand {
    type Response = String;
}

impl Request for LogoutCommand {
    type Response = AuthOutcome;
}

impl Request for UpdateProfileCommand {
    type Response = UserDto;
}

impl Request for GetUserByIdQuery {
    type Response = UserDto;
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<GetAuthorizationUrlCommand>
    for AuthService<R, P>
{
    type Error = AuthError;

    async fn handle(&self, command: GetAuthorizationUrlCommand) -> AuthResult<String> {
        self.authorization_url(&command.redirect_uri, &command.state)
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<HandleCallbackCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: HandleCallbackCommand) -> AuthResult<LoginResponse> {
        self.handle_callback(&command.code, &command.state, &command.redirect_uri)
            .await
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<RefreshTokenCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: RefreshTokenCommand) -> AuthResult<LoginResponse> {
        self.refresh(&command.refresh_token).await
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<ValidateTokenCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: ValidateTokenCommand) -> AuthResult<bool> {
        Ok(self.validate_token(&command.token).await)
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<GetUserInfoCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: GetUserInfoCommand) -> AuthResult<UserInfo> {
        self.user_info(&command.access_token).await
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<GetLogoutUrlCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: GetLogoutUrlCommand) -> AuthResult<String> {
        self.logout_url(&command.redirect_uri, &command.id_token)
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<LogoutCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: LogoutCommand) -> AuthResult<AuthOutcome> {
        Ok(self.logout(&command.refresh_token).await)
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<UpdateProfileCommand> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, command: UpdateProfileCommand) -> AuthResult<UserDto> {
        self.update_profile(&command.user_id, command.request).await
    }
}

#[async_trait]
impl<R: UserRepository, P: IdentityProvider> Handler<GetUserByIdQuery> for AuthService<R, P> {
    type Error = AuthError;

    async fn handle(&self, query: GetUserByIdQuery) -> AuthResult<UserDto> {
        self.get_user(&query.user_id).await
    }
}
