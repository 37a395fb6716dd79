//! Fixtures for tests that run against `DATABASE_URL`.
//!
//! Every row gets a unique suffix so tests can share one database.

use sqlx::PgPool;
use uuid::Uuid;

use super::{create_pool, migrations};

pub(crate) async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool");
    migrations::run(&pool).await.expect("migrate");
    pool
}

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub(crate) async fn user(pool: &PgPool) -> i64 {
    let tag = suffix();
    sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'x') RETURNING user_id",
    )
    .bind(format!("u{tag}"))
    .bind(format!("{tag}@example.com"))
    .fetch_one(pool)
    .await
    .expect("insert user")
}

pub(crate) struct SeededNovel {
    pub novel_id: i64,
    pub slug: String,
    /// Chapter ids in chapter-number order, numbered from 1
    pub chapters: Vec<i64>,
}

pub(crate) async fn novel(pool: &PgPool, chapter_count: i32) -> SeededNovel {
    let slug = format!("novel-{}", suffix());
    let novel_id: i64 =
        sqlx::query_scalar("INSERT INTO novels (title, slug) VALUES ($1, $2) RETURNING novel_id")
            .bind(format!("Novel {slug}"))
            .bind(&slug)
            .fetch_one(pool)
            .await
            .expect("insert novel");

    let mut chapters = Vec::new();
    for number in 1..=chapter_count {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO chapters (novel_id, chapter_number, title) VALUES ($1, $2, $3) RETURNING chapter_id",
        )
        .bind(novel_id)
        .bind(number)
        .bind(format!("Chapter {number}"))
        .fetch_one(pool)
        .await
        .expect("insert chapter");
        chapters.push(id);
    }

    SeededNovel {
        novel_id,
        slug,
        chapters,
    }
}

/// Bearer token for a fresh one-day session
pub(crate) async fn session(pool: &PgPool, user_id: i64) -> String {
    let token = crate::auth::token::generate_token();
    super::SessionRepo::new(pool)
        .create(user_id, &crate::auth::hash_token(&token), chrono::Duration::days(1))
        .await
        .expect("session");
    token
}
