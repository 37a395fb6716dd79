//! Route handlers organized by resource

pub mod auth;
pub mod bookmarks;
pub mod chapters;
pub mod comments;
pub mod health;
pub mod history;
pub mod novels;
pub mod ratings;
pub mod rankings;
pub mod search;
pub mod sitemap;
pub mod users;
