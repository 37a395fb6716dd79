//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows these patterns:
//! - single-query lists (JOINs / correlated counts)
//! - ON CONFLICT upserts for repeatable actions
//! - transactions where a write spans several statements

pub mod bookmarks;
pub mod chapters;
pub mod comments;
pub mod genres;
pub mod history;
pub mod novels;
pub mod ratings;
pub mod sessions;
pub mod users;

pub use bookmarks::{BookmarkRepo, BookmarkView};
pub use chapters::{Chapter, ChapterNovel, ChapterRepo, ChapterSummary};
pub use comments::{Comment, CommentAuthor, CommentRepo, CommentTarget, CommentThread, UserComment};
pub use genres::{Genre, GenreRepo};
pub use history::{HistoryEntry, HistoryItem, HistoryRepo};
pub use novels::{HomeSections, NovelCard, NovelDetail, NovelRepo, Suggestion};
pub use ratings::{RatingOutcome, RatingRepo};
pub use sessions::{SessionRepo, SessionUser};
pub use users::{NewUser, Profile, User, UserCredentials, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A uniqueness rule the caller can act on
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Request is well-formed but inconsistent with stored data
    #[error("invalid: {message}")]
    Invalid { message: String },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Postgres `unique_violation`
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23505")
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
