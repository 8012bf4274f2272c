//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Auth API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auth API",
        version = "0.1.0",
        description = "Storefront sign-in through the OAuth2/OIDC identity provider, and user profiles",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development server")
    ),
    nest(
        (path = "/api/auth", api = domain_auth::ApiDoc)
    ),
    tags(
        (name = "Auth", description = "Sign-in through the identity provider")
    )
)]
pub struct ApiDoc;
