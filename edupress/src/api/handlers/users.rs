use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    api::{
        extractors::{Json, Path},
        handlers::auth::required,
        models::{
            auth::{DeleteAccountRequest, DetailResponse},
            users::UserResponse,
        },
    },
    auth::{current_user::CurrentUser, permissions},
    db::CredentialStore,
    errors::Error,
    types::{Operation, UserId},
};

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = DetailResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(CurrentUser(identity): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(identity))
}

/// Delete the authenticated user's account. Requires the current password.
#[utoipa::path(
    put,
    path = "/me/delete",
    request_body = DeleteAccountRequest,
    tag = "users",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Missing password", body = DetailResponse),
        (status = 401, description = "Not authenticated or wrong password", body = DetailResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<StatusCode, Error> {
    let password = required(request.password, "password")?;

    state.sessions.delete_account(&identity, &password).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Get a user by ID (admin only)
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not authenticated", body = DetailResponse),
        (status = 403, description = "Caller is not an admin", body = DetailResponse),
        (status = 404, description = "No such user", body = DetailResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, Error> {
    permissions::require_admin(&caller, Operation::ReadAll, "users")?;

    let identity = state.store.get_identity(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(identity)))
}

/// Delete a user by ID (admin only). Their refresh session goes with them.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated", body = DetailResponse),
        (status = 403, description = "Caller is not an admin", body = DetailResponse),
        (status = 404, description = "No such user", body = DetailResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, Error> {
    permissions::require_admin(&caller, Operation::DeleteAll, "users")?;

    if !state.store.delete_identity(id).await? {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{
        db::CredentialStore,
        errors::WWW_AUTHENTICATE_CHALLENGE,
        test_utils::{create_test_admin, create_test_educator, create_test_server},
    };
    use axum::http::{HeaderValue, StatusCode, header};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_get_me(pool: PgPool) {
        let (server, state) = create_test_server(pool);
        let identity = create_test_educator(&state, "ada").await;
        let token = state.tokens.issue(&identity).unwrap();

        let response = server.get("/me").authorization_bearer(&token).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], identity.id);
        assert_eq!(body["email"], identity.email);
        assert_eq!(body["educator"]["nick_name"], "ada");
    }

    #[sqlx::test]
    async fn test_me_requires_authentication(pool: PgPool) {
        let (server, _state) = create_test_server(pool);

        let response = server.get("/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            WWW_AUTHENTICATE_CHALLENGE
        );
        assert_eq!(
            response.json::<Value>(),
            json!({ "detail": "Authentication credentials were not provided" })
        );

        let response = server.get("/me").authorization_bearer("not-a-jwt").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>(), json!({ "detail": "Invalid or expired token" }));

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer a b"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>(), json!({ "detail": "Invalid Authorization header" }));
    }

    #[sqlx::test]
    async fn test_admin_routes_are_gated_by_role(pool: PgPool) {
        let (server, state) = create_test_server(pool);
        let educator = create_test_educator(&state, "ada").await;
        let admin = create_test_admin(&state).await;
        let educator_token = state.tokens.issue(&educator).unwrap();
        let admin_token = state.tokens.issue(&admin).unwrap();
        let path = format!("/admin/users/{}", educator.id);

        let response = server.get(&path).authorization_bearer(&educator_token).await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        server.get(&path).await.assert_status(StatusCode::UNAUTHORIZED);

        let response = server.get(&path).authorization_bearer(&admin_token).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["email"], educator.email);

        server
            .delete(&path)
            .authorization_bearer(&educator_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_non_numeric_user_id_is_bad_request(pool: PgPool) {
        let (server, state) = create_test_server(pool);
        let admin = create_test_admin(&state).await;
        let admin_token = state.tokens.issue(&admin).unwrap();

        let response = server.get("/admin/users/ada").authorization_bearer(&admin_token).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["detail"].is_string());
    }

    #[sqlx::test]
    async fn test_admin_delete_user(pool: PgPool) {
        let (server, state) = create_test_server(pool);
        let educator = create_test_educator(&state, "ada").await;
        let admin = create_test_admin(&state).await;
        let admin_token = state.tokens.issue(&admin).unwrap();
        let path = format!("/admin/users/{}", educator.id);

        server
            .delete(&path)
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(state.store.get_identity(educator.id).await.unwrap().is_none());

        let response = server.delete(&path).authorization_bearer(&admin_token).await;
        response.assert_status(StatusCode::NOT_FOUND);
        server
            .get(&path)
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_delete_me(pool: PgPool) {
        let (server, state) = create_test_server(pool);
        let response = server
            .post("/auth/signup")
            .json(&json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "password": "correct horse",
                "nick_name": "ada",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let access_token = body["access_token"].as_str().unwrap().to_string();
        let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

        server
            .put("/me/delete")
            .authorization_bearer(&access_token)
            .json(&json!({ "password": "wrong password" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .put("/me/delete")
            .authorization_bearer(&access_token)
            .json(&json!({ "password": "correct horse" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // The account and its refresh session are gone
        server
            .get("/me")
            .authorization_bearer(&access_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/auth/refresh")
            .json(&json!({ "refresh_token": refresh_token }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        assert!(
            state
                .store
                .get_credential_by_email("ada@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}
