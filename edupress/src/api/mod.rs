//! API layer for HTTP request handling and data models.
//!
//! - **[`extractors`]**: `Json` and `Path` extractors whose rejections render as `{"detail"}`
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/auth/*`): Signup, login, logout, access token refresh
//! - **Self-service** (`/me`, `/me/delete`): The caller's own account
//! - **Administration** (`/admin/users/{id}`): Admin-only user management
//!
//! All endpoints are documented with `utoipa`. The OpenAPI document is served at
//! `/api-docs/openapi.json` and rendered at `/docs`.

pub mod extractors;
pub mod handlers;
pub mod models;
