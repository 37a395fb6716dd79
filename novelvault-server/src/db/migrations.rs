//! Schema migrations, idempotent and run from code

use sqlx::PgPool;

/// Tables in dependency order
const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            avatar_url TEXT,
            bio TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            last_login TIMESTAMPTZ
        )
        "#,
    ),
    (
        "user_sessions",
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            id UUID PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "novels",
        r#"
        CREATE TABLE IF NOT EXISTS novels (
            novel_id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            author TEXT,
            description TEXT,
            cover_image_url TEXT,
            status TEXT NOT NULL DEFAULT 'ongoing',
            is_featured BOOLEAN NOT NULL DEFAULT FALSE,
            view_count BIGINT NOT NULL DEFAULT 0,
            average_rating DOUBLE PRECISION,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "chapters",
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            chapter_id BIGSERIAL PRIMARY KEY,
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            chapter_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            is_free BOOLEAN NOT NULL DEFAULT TRUE,
            view_count BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (novel_id, chapter_number)
        )
        "#,
    ),
    (
        "genres",
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            genre_id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "novel_genres",
        r#"
        CREATE TABLE IF NOT EXISTS novel_genres (
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            genre_id BIGINT NOT NULL REFERENCES genres(genre_id) ON DELETE CASCADE,
            PRIMARY KEY (novel_id, genre_id)
        )
        "#,
    ),
    (
        "tags",
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            tag_id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "novel_tags",
        r#"
        CREATE TABLE IF NOT EXISTS novel_tags (
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            tag_id BIGINT NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
            PRIMARY KEY (novel_id, tag_id)
        )
        "#,
    ),
    (
        "bookmarks",
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            bookmark_id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            chapter_id BIGINT REFERENCES chapters(chapter_id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, novel_id)
        )
        "#,
    ),
    (
        "ratings",
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            rating_id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            score SMALLINT NOT NULL CHECK (score BETWEEN 1 AND 5),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, novel_id)
        )
        "#,
    ),
    (
        "novel_comments",
        r#"
        CREATE TABLE IF NOT EXISTS novel_comments (
            comment_id BIGSERIAL PRIMARY KEY,
            novel_id BIGINT NOT NULL REFERENCES novels(novel_id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            parent_comment_id BIGINT REFERENCES novel_comments(comment_id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "chapter_comments",
        r#"
        CREATE TABLE IF NOT EXISTS chapter_comments (
            comment_id BIGSERIAL PRIMARY KEY,
            chapter_id BIGINT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            parent_comment_id BIGINT REFERENCES chapter_comments(comment_id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "reading_history",
        r#"
        CREATE TABLE IF NOT EXISTS reading_history (
            history_id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            chapter_id BIGINT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
            progress_percentage DOUBLE PRECISION NOT NULL DEFAULT 0,
            read_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, chapter_id)
        )
        "#,
    ),
    (
        "rate_limit_hits",
        r#"
        CREATE TABLE IF NOT EXISTS rate_limit_hits (
            id BIGSERIAL PRIMARY KEY,
            subject TEXT NOT NULL,
            hit_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username_lower ON users (LOWER(username))",
    "CREATE INDEX IF NOT EXISTS idx_user_sessions_expires ON user_sessions (expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_novels_created ON novels (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_novels_views ON novels (view_count DESC)",
    "CREATE INDEX IF NOT EXISTS idx_novels_status ON novels (LOWER(status))",
    "CREATE INDEX IF NOT EXISTS idx_chapters_novel ON chapters (novel_id, chapter_number)",
    "CREATE INDEX IF NOT EXISTS idx_novel_genres_genre ON novel_genres (genre_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookmarks_user ON bookmarks (user_id, updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_novel_comments_novel ON novel_comments (novel_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_novel_comments_user ON novel_comments (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_chapter_comments_chapter ON chapter_comments (chapter_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_reading_history_user ON reading_history (user_id, read_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_rate_limit_hits_subject ON rate_limit_hits (subject, hit_at)",
];

/// Create every table and index that does not exist yet
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for (name, ddl) in TABLES {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table = name, "table ready");
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    tracing::info!(tables = TABLES.len(), indexes = INDEXES.len(), "migrations complete");
    Ok(())
}

/// Table names in creation order
pub fn table_names() -> impl Iterator<Item = &'static str> {
    TABLES.iter().map(|(name, _)| *name)
}
