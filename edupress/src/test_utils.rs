//! Shared fixtures for tests. Store-backed fixtures take the pool that `#[sqlx::test]` provides.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{
    AppState, Config,
    api::models::users::{Identity, Role},
    auth::password::{Argon2Params, hash_password},
    build_router,
    config::{DatabaseConfig, PasswordConfig, PoolSettings},
    db::{CredentialStore, PostgresStore, models::users::UserCreateDBRequest},
};

pub const TEST_PASSWORD: &str = "correct horse";

/// Cheap Argon2 settings; production defaults make every test slow
pub fn fast_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn fast_password_config() -> PasswordConfig {
    let params = fast_argon2_params();
    PasswordConfig {
        argon2_memory_kib: params.memory_kib,
        argon2_iterations: params.iterations,
        argon2_parallelism: params.parallelism,
        ..PasswordConfig::default()
    }
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-edupress".to_string()),
        database: DatabaseConfig::External {
            // Tests hand their own pool to the application
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                ..Default::default()
            },
        },
        ..Config::default()
    };
    config.auth.password = fast_password_config();
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::new(create_test_config(), Arc::new(PostgresStore::new(pool))).expect("Failed to create test state")
}

pub fn create_test_server(pool: PgPool) -> (TestServer, AppState) {
    let state = create_test_state(pool);
    let router = build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

async fn create_test_identity(state: &AppState, name: &str, role: Role, nick_name: Option<&str>) -> Identity {
    let password_hash = hash_password(TEST_PASSWORD, fast_argon2_params()).expect("Failed to hash password");
    state
        .store
        .create_identity(&UserCreateDBRequest {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash,
            role,
            nick_name: nick_name.map(str::to_string),
        })
        .await
        .expect("Failed to create test identity")
}

/// Create an educator whose email is `{nick_name}@example.com`
pub async fn create_test_educator(state: &AppState, nick_name: &str) -> Identity {
    create_test_identity(state, nick_name, Role::Educator, Some(nick_name)).await
}

pub async fn create_test_admin(state: &AppState) -> Identity {
    create_test_identity(state, "admin", Role::Admin, None).await
}
