//! OpenAPI documentation for the edupress API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Security scheme for routes that need an access token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `/auth/login`, `/auth/signup` or `/auth/refresh`:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "edupress API",
        description = "Authentication and authorization for the edupress publishing platform"
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::refresh,
        api::handlers::users::get_me,
        api::handlers::users::delete_me,
        api::handlers::users::get_user,
        api::handlers::users::delete_user,
    ),
    components(
        schemas(
            api::models::auth::SignupRequest,
            api::models::auth::LoginRequest,
            api::models::auth::RefreshTokenRequest,
            api::models::auth::DeleteAccountRequest,
            api::models::auth::SignupResponse,
            api::models::auth::TokenPairResponse,
            api::models::auth::RefreshResponse,
            api::models::auth::DetailResponse,
            api::models::users::UserResponse,
            api::models::users::EducatorProfile,
            api::models::users::Role,
        )
    ),
    tags(
        (name = "authentication", description = "Signup, login, logout and token refresh"),
        (name = "users", description = "The authenticated user's own account"),
        (name = "admin", description = "User management (ADMIN role required)"),
    )
)]
pub struct ApiDoc;
