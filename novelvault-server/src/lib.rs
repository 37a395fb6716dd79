//! novelvault-server: HTTP server for the novel reading site
//!
//! JSON API, server-rendered pages and the sitemap, backed by Postgres.
//! Sessions are opaque tokens stored hashed; bookmark endpoints are rate
//! limited per user.

pub mod auth;
pub mod db;
pub mod http;
pub mod models;
pub mod pages;
pub mod rate_limit;
pub mod state;

pub use db::{create_pool, create_pool_with_options};
pub use http::{build_router, run_server, ApiError, ServerError};
pub use state::AppState;
