//! # edupress: authentication and authorization for a social publishing API
//!
//! `edupress` is the auth core of a publishing platform where educators write publications and
//! commentaries and administrators manage users. It issues and verifies credentials, tracks
//! refresh sessions, and gates every other route on identity, role and ownership.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer.
//! Storage sits behind the [`db::AuthStore`] trait, implemented over PostgreSQL. Without an
//! external database URL the application starts an embedded PostgreSQL instance.
//!
//! ### Request Flow
//!
//! Requests to `/auth/*` drive the [`auth::session::SessionManager`] directly: signup and login
//! return an access token and a refresh token, refresh exchanges the latter for a new access
//! token, and logout revokes it.
//!
//! Every other route extracts an [`auth::current_user::AuthenticatedContext`] (or the stricter
//! [`auth::current_user::CurrentUser`]) from the `Authorization: Bearer` header. The extractor
//! verifies the access token with the [`auth::token::TokenCodec`] and resolves its subject
//! through the store. Handlers then apply the role and ownership checks in
//! [`auth::permissions`].
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): route handlers and request/response models
//! - **Auth layer** ([`auth`]): tokens, refresh sessions, password hashing, extractors, checks
//! - **Database layer** ([`db`]): the storage seam, its PostgreSQL backend, and the error taxonomy
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use edupress::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = edupress::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     edupress::telemetry::init_telemetry()?;
//!
//!     Application::new(config).await?.serve(std::future::pending()).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::models::users::Role,
    auth::{
        password::Argon2Params,
        refresh::RefreshSessionStore,
        session::{SessionManager, hash_password_blocking, normalize_email},
        token::TokenCodec,
    },
    config::{CorsOrigin, DatabaseConfig},
    db::{AuthStore, PostgresStore, embedded::EmbeddedDatabase, models::users::UserCreateDBRequest},
    errors::Error,
    openapi::ApiDoc,
    types::UserId,
};

/// Shared state for all request handlers.
///
/// - `config`: Application configuration
/// - `store`: Identity and refresh session storage
/// - `tokens`: Access token codec, holding the signing secret
/// - `sessions`: Signup/login/logout/refresh orchestration over `store` and `tokens`
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AuthStore>,
    pub tokens: TokenCodec,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the auth components together. Fails if no signing secret is configured.
    pub fn new(config: Config, store: Arc<dyn AuthStore>) -> Result<Self, Error> {
        let secret = config
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Internal {
                operation: "create token codec: secret_key is required".to_string(),
            })?;

        let tokens = TokenCodec::new(secret, config.access_token_lifetime());
        let refresh = RefreshSessionStore::new(store.clone(), config.refresh_session_lifetime());
        let sessions = SessionManager::new(store.clone(), tokens.clone(), refresh, config.auth.password.clone());

        Ok(Self {
            config,
            store,
            tokens,
            sessions,
        })
    }
}

/// Get the edupress database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin if no identity has `email`, otherwise resets the existing
/// admin's password. ADMIN identities cannot sign up, so this is the only way one comes to exist.
/// Fails if `email` already belongs to an identity that is not an admin.
///
/// Returns the user ID of the created or existing admin.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    store: &dyn AuthStore,
    name: &str,
    email: &str,
    password: &str,
    params: Argon2Params,
) -> anyhow::Result<UserId> {
    let email = normalize_email(email);
    let existing = store.get_credential_by_email(&email).await?;

    if let Some(existing) = &existing
        && existing.identity.role != Role::Admin
    {
        anyhow::bail!(
            "Initial admin email {email} belongs to user {} with role {}; refusing to reuse it for the admin account",
            existing.identity.id,
            existing.identity.role
        );
    }

    let password_hash = hash_password_blocking(password.to_string(), params)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    if let Some(existing) = existing {
        store.update_password_hash(existing.identity.id, &password_hash).await?;
        info!(user_id = existing.identity.id, "Initial admin user already exists; password updated");
        return Ok(existing.identity.id);
    }

    let created = store
        .create_identity(&UserCreateDBRequest {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::Admin,
            nick_name: None,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {e}"))?;

    info!(user_id = created.id, "Initial admin user created");
    Ok(created.id)
}

/// Connect to the configured database (starting the embedded one if needed) and run migrations
async fn setup_database(config: &Config) -> anyhow::Result<(Option<EmbeddedDatabase>, PgPool)> {
    let (embedded_db, database_url) = match &config.database {
        DatabaseConfig::Embedded { data_dir, persistent, .. } => {
            info!("Starting with embedded database (persistent: {})", persistent);
            if !persistent {
                info!("persistent=false: database will be ephemeral and data will be lost on shutdown");
            }
            let embedded_db = EmbeddedDatabase::start(data_dir.clone(), *persistent).await?;
            let url = embedded_db.connection_string().to_string();
            (Some(embedded_db), url)
        }
        DatabaseConfig::External { url, .. } => {
            info!("Using external database");
            (None, url.clone())
        }
    };

    let pool = connect_pool(config, &database_url).await?;
    migrator().run(&pool).await?;

    Ok((embedded_db, pool))
}

async fn connect_pool(config: &Config, database_url: &str) -> anyhow::Result<PgPool> {
    let settings = config.database.pool_settings();
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout((settings.idle_timeout_secs > 0).then(|| std::time::Duration::from_secs(settings.idle_timeout_secs)))
        .max_lifetime((settings.max_lifetime_secs > 0).then(|| std::time::Duration::from_secs(settings.max_lifetime_secs)))
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - Authentication routes (`/auth/*`)
/// - Self-service and admin routes (`/me`, `/admin/users/{id}`)
/// - Health check and OpenAPI documentation
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let auth_routes = Router::new()
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route("/auth/refresh", post(api::handlers::auth::refresh));

    let user_routes = Router::new()
        .route("/me", get(api::handlers::users::get_me))
        .route("/me/delete", put(api::handlers::users::delete_me))
        .route(
            "/admin/users/{id}",
            get(api::handlers::users::get_user).delete(api::handlers::users::delete_user),
        );

    let router = Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        );

    Ok(router)
}

/// Application lifecycle: [`Application::new`] prepares the database and router,
/// [`Application::serve`] handles requests until the shutdown signal resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    embedded_db: Option<EmbeddedDatabase>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool, or on the configured database when `pool` is
    /// `None`. Migrations run either way.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!(bind_address = %config.bind_address(), "Starting edupress");

        let (embedded_db, pool) = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                (None, pool)
            }
            None => setup_database(&config).await?,
        };
        let store: Arc<dyn AuthStore> = Arc::new(PostgresStore::new(pool.clone()));

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            create_initial_admin_user(
                store.as_ref(),
                &config.admin_name,
                email,
                password,
                config.auth.password.argon2_params(),
            )
            .await?;
        }

        let state = AppState::new(config.clone(), store)?;
        let router = build_router(state)?;

        Ok(Self {
            router,
            config,
            pool,
            embedded_db,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "edupress listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        if let Some(embedded_db) = self.embedded_db {
            embedded_db.stop().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auth::password::verify_password,
        db::CredentialStore,
        test_utils::{TEST_PASSWORD, create_test_config, create_test_educator, create_test_state, fast_argon2_params},
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[sqlx::test]
    async fn test_create_initial_admin_user_new_user(pool: PgPool) {
        let store = PostgresStore::new(pool);

        let user_id = create_initial_admin_user(&store, "Root", " Root@Example.com", "admin-password", fast_argon2_params())
            .await
            .unwrap();

        let credential = store.get_credential_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(credential.identity.id, user_id);
        assert_eq!(credential.identity.role, Role::Admin);
        assert!(credential.identity.educator.is_none());
        assert!(verify_password("admin-password", &credential.password_hash).unwrap());
    }

    #[sqlx::test]
    async fn test_create_initial_admin_user_existing_user(pool: PgPool) {
        let store = PostgresStore::new(pool);

        let first = create_initial_admin_user(&store, "Root", "root@example.com", "old-password", fast_argon2_params())
            .await
            .unwrap();
        let second = create_initial_admin_user(&store, "Root", "root@example.com", "new-password", fast_argon2_params())
            .await
            .unwrap();

        assert_eq!(first, second);
        let credential = store.get_credential(first).await.unwrap().unwrap();
        assert!(verify_password("new-password", &credential.password_hash).unwrap());
        assert!(!verify_password("old-password", &credential.password_hash).unwrap());
    }

    #[sqlx::test]
    async fn test_create_initial_admin_user_refuses_educator_email(pool: PgPool) {
        let state = create_test_state(pool);
        let educator = create_test_educator(&state, "boss").await;

        let err = create_initial_admin_user(
            state.store.as_ref(),
            "Root",
            "Boss@Example.com",
            "admin-password",
            fast_argon2_params(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("refusing to reuse it"));

        // The educator keeps their role and password
        let credential = state.store.get_credential(educator.id).await.unwrap().unwrap();
        assert_eq!(credential.identity.role, Role::Educator);
        assert!(verify_password(TEST_PASSWORD, &credential.password_hash).unwrap());
        assert!(!verify_password("admin-password", &credential.password_hash).unwrap());
    }

    #[sqlx::test]
    async fn test_application_refuses_educator_admin_email(pool: PgPool) {
        let state = create_test_state(pool.clone());
        create_test_educator(&state, "boss").await;

        let mut config = create_test_config();
        config.admin_email = Some("boss@example.com".to_string());
        config.admin_password = Some("admin-password".to_string());

        assert!(Application::new_with_pool(config, Some(pool)).await.is_err());
    }

    #[sqlx::test]
    async fn test_app_state_requires_secret(pool: PgPool) {
        let mut config = create_test_config();
        config.secret_key = None;

        assert!(AppState::new(config, Arc::new(PostgresStore::new(pool))).is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_application_integration(pool: PgPool) {
        let mut config = create_test_config();
        config.admin_email = Some("root@example.com".to_string());
        config.admin_password = Some("admin-password".to_string());

        let server = Application::new_with_pool(config, Some(pool))
            .await
            .unwrap()
            .into_test_server();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": "root@example.com", "password": "admin-password" }))
            .await;
        response.assert_status_ok();
        let access_token = response.json::<Value>()["access_token"].as_str().unwrap().to_string();

        let response = server.get("/me").authorization_bearer(&access_token).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["role"], "ADMIN");
    }

    #[sqlx::test]
    async fn test_openapi_json_endpoint(pool: PgPool) {
        let server = Application::new_with_pool(create_test_config(), Some(pool))
            .await
            .unwrap()
            .into_test_server();

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: Value = response.json();
        assert!(doc["paths"]["/auth/signup"].is_object());

        server.get("/docs").await.assert_status(StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_cors_preflight_allows_configured_origin(pool: PgPool) {
        let server = Application::new_with_pool(create_test_config(), Some(pool))
            .await
            .unwrap()
            .into_test_server();

        let response = server
            .method(Method::OPTIONS, "/auth/login")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:5173"))
            .add_header(header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
            .await;

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }
}
