//! HTTP handlers for the Auth API
//!
//! Sign-in is delegated to the identity provider. The password-based endpoints of the
//! previous API still answer, with 400 and a pointer to the OAuth2/OIDC flow.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::{get, post},
};
use axum_helpers::{
    CurrentUser, JwtAuth, ValidatedJson, jwt_auth_middleware,
    errors::responses::{
        BadGatewayResponse, BadRequestResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use contracts::Handler;
use contracts::identity::{TokenResponse, UserInfo};
use contracts::users::{AuthResult as AuthOutcome, LoginResponse, UpdateProfileRequest, UserDto};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::commands::{
    GetAuthorizationUrlCommand, GetLogoutUrlCommand, GetUserByIdQuery, GetUserInfoCommand,
    HandleCallbackCommand, LogoutCommand, RefreshTokenCommand, UpdateProfileCommand,
    ValidateTokenCommand,
};
use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityProvider;
use crate::repository::UserRepository;
use crate::service::AuthService;

#[derive(OpenApi)]
#[openapi(
    paths(
        login,
        callback,
        refresh,
        validate,
        user_info,
        get_profile,
        update_profile,
        logout,
        logout_url,
    ),
    components(
        schemas(
            LoginUrlResponse, ValidateTokenResponse, LogoutUrlResponse, LoginResponse,
            UserDto, UpdateProfileRequest, UserInfo, TokenResponse, AuthOutcome
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ConflictResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Sign-in through the identity provider")
    )
)]
pub struct ApiDoc;

/// Password-based endpoints answered with a pointer to the provider flow.
pub const LEGACY_ENDPOINTS: [(&str, &str); 10] = [
    ("/register", "User registration"),
    ("/login-legacy", "Login"),
    ("/forgot-password", "Password recovery"),
    ("/reset-password", "Password reset"),
    ("/change-password", "Password change"),
    ("/verify-email", "Email verification"),
    ("/resend-email-verification", "Email verification"),
    ("/two-factor/setup", "Two-factor authentication"),
    ("/two-factor/enable", "Two-factor authentication"),
    ("/two-factor/disable", "Two-factor authentication"),
];

type SharedService<R, P> = State<Arc<AuthService<R, P>>>;

/// `/profile` requires a bearer token; everything else is public.
pub fn router<R, P>(service: AuthService<R, P>, auth: JwtAuth) -> Router
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/login", get(login::<R, P>))
        .route("/callback", get(callback::<R, P>))
        .route("/refresh", post(refresh::<R, P>))
        .route("/validate", post(validate::<R, P>))
        .route("/userinfo", post(user_info::<R, P>))
        .route("/logout", post(logout::<R, P>))
        .route("/logout-url", get(logout_url::<R, P>))
        .with_state(shared_service.clone());

    let protected = Router::new()
        .route(
            "/profile",
            get(get_profile::<R, P>).put(update_profile::<R, P>),
        )
        .route_layer(middleware::from_fn_with_state(auth, jwt_auth_middleware))
        .with_state(shared_service);

    let legacy = LEGACY_ENDPOINTS
        .iter()
        .fold(Router::new(), |router, &(path, operation)| {
            router.route(
                path,
                post(move || async move { AuthError::LegacyEndpoint(operation) }),
            )
        });

    public.merge(protected).merge(legacy)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    pub redirect_uri: String,
    /// Opaque value echoed back on the callback; a random UUID when absent
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogoutUrlQuery {
    pub redirect_uri: String,
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginUrlResponse {
    pub login_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutUrlResponse {
    pub logout_url: String,
}

/// Authorization URL at the identity provider
#[utoipa::path(
    get,
    path = "/login",
    tag = "Auth",
    params(LoginQuery),
    responses(
        (status = 200, description = "Where to send the browser", body = LoginUrlResponse),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn login<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Query(query): Query<LoginQuery>,
) -> AuthResult<Json<LoginUrlResponse>> {
    let state = query
        .state
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let login_url = service
        .handle(GetAuthorizationUrlCommand {
            redirect_uri: query.redirect_uri,
            state,
        })
        .await?;
    Ok(Json(LoginUrlResponse { login_url }))
}

/// Authorization code callback
#[utoipa::path(
    get,
    path = "/callback",
    tag = "Auth",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, response = BadRequestResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn callback<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Query(query): Query<CallbackQuery>,
) -> AuthResult<Json<LoginResponse>> {
    let response = service
        .handle(HandleCallbackCommand {
            code: query.code,
            state: query.state,
            redirect_uri: query.redirect_uri,
        })
        .await?;
    Ok(Json(response))
}

/// Exchange a refresh token for new tokens
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    request_body(content = String, description = "Refresh token"),
    responses(
        (status = 200, description = "Refreshed", body = LoginResponse),
        (status = 404, response = NotFoundResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn refresh<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Json(refresh_token): Json<String>,
) -> AuthResult<Json<LoginResponse>> {
    let response = service.handle(RefreshTokenCommand { refresh_token }).await?;
    Ok(Json(response))
}

/// Introspect an access token
#[utoipa::path(
    post,
    path = "/validate",
    tag = "Auth",
    request_body(content = String, description = "Access token"),
    responses(
        (status = 200, description = "Whether the provider considers the token active", body = ValidateTokenResponse)
    )
)]
async fn validate<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Json(token): Json<String>,
) -> AuthResult<Json<ValidateTokenResponse>> {
    let valid = service.handle(ValidateTokenCommand { token }).await?;
    Ok(Json(ValidateTokenResponse { valid }))
}

/// Provider profile behind an access token
#[utoipa::path(
    post,
    path = "/userinfo",
    tag = "Auth",
    request_body(content = String, description = "Access token"),
    responses(
        (status = 200, description = "User info", body = UserInfo),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn user_info<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Json(access_token): Json<String>,
) -> AuthResult<Json<UserInfo>> {
    let info = service.handle(GetUserInfoCommand { access_token }).await?;
    Ok(Json(info))
}

/// Profile of the caller
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Profile", body = UserDto),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_profile<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    user: CurrentUser,
) -> AuthResult<Json<UserDto>> {
    let profile = service
        .handle(GetUserByIdQuery {
            user_id: user.id().to_string(),
        })
        .await?;
    Ok(Json(profile))
}

/// Update the caller's profile; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserDto),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_profile<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> AuthResult<Json<UserDto>> {
    let profile = service
        .handle(UpdateProfileCommand {
            user_id: user.id().to_string(),
            request,
        })
        .await?;
    Ok(Json(profile))
}

/// End the provider session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    request_body(content = String, description = "Refresh token"),
    responses(
        (status = 200, description = "Outcome of the provider logout", body = AuthOutcome)
    )
)]
async fn logout<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Json(refresh_token): Json<String>,
) -> AuthResult<Json<AuthOutcome>> {
    let outcome = service.handle(LogoutCommand { refresh_token }).await?;
    Ok(Json(outcome))
}

/// Provider logout URL for browser redirects
#[utoipa::path(
    get,
    path = "/logout-url",
    tag = "Auth",
    params(LogoutUrlQuery),
    responses(
        (status = 200, description = "Logout URL", body = LogoutUrlResponse)
    )
)]
async fn logout_url<R: UserRepository, P: IdentityProvider>(
    State(service): SharedService<R, P>,
    Query(query): Query<LogoutUrlQuery>,
) -> AuthResult<Json<LogoutUrlResponse>> {
    let logout_url = service
        .handle(GetLogoutUrlCommand {
            redirect_uri: query.redirect_uri,
            id_token: query.id_token.unwrap_or_default(),
        })
        .await?;
    Ok(Json(LogoutUrlResponse { logout_url }))
}
