use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    api::extractors::Json,
    api::models::{
        auth::{DetailResponse, LoginRequest, RefreshResponse, RefreshTokenRequest, SignupRequest, SignupResponse, TokenPairResponse},
        users::{Role, UserResponse},
    },
    auth::session::Signup,
    errors::Error,
};

/// Unwrap a required body field, rejecting missing or empty values with 400
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::BadRequest {
            message: format!("{field} is required"),
        }),
    }
}

/// Create an educator account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input or ADMIN role requested", body = DetailResponse),
        (status = 409, description = "Email or nick name already taken", body = DetailResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), Error> {
    let role = match request.role.as_deref() {
        None | Some("") => Role::Educator,
        Some(role) => role.parse::<Role>().map_err(|message| Error::BadRequest { message })?,
    };

    let outcome = state
        .sessions
        .signup(Signup {
            name: required(request.name, "name")?,
            email: required(request.email, "email")?,
            password: required(request.password, "password")?,
            role,
            nick_name: request.nick_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: UserResponse::from(outcome.identity),
            access_token: outcome.access_token,
            refresh_token: outcome.refresh_token,
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 400, description = "Missing email or password", body = DetailResponse),
        (status = 401, description = "Invalid credentials", body = DetailResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenPairResponse>, Error> {
    let email = required(request.email, "email")?;
    let password = required(request.password, "password")?;

    let outcome = state.sessions.login(&email, &password).await?;

    Ok(Json(TokenPairResponse {
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// Revoke a refresh token. Succeeds whether or not the token was live.
#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshTokenRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Logged out", body = DetailResponse),
        (status = 400, description = "Missing refresh_token", body = DetailResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, Json(request): Json<RefreshTokenRequest>) -> Result<Json<DetailResponse>, Error> {
    let refresh_token = required(request.refresh_token, "refresh_token")?;

    state.sessions.logout(&refresh_token).await?;

    Ok(Json(DetailResponse { detail: "OK".to_string() }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshTokenRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Missing refresh_token", body = DetailResponse),
        (status = 401, description = "Refresh token invalid or expired", body = DetailResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshTokenRequest>) -> Result<Json<RefreshResponse>, Error> {
    let refresh_token = required(request.refresh_token, "refresh_token")?;

    let new_access_token = state.sessions.refresh(&refresh_token).await?;

    Ok(Json(RefreshResponse { new_access_token }))
}
