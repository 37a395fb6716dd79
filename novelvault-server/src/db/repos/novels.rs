//! Novel repository: home sections, browse candidates, detail, rankings,
//! search and view counting.

use chrono::{DateTime, Utc};
use novelvault_core::browse::{BrowseCandidate, BrowseQuery, BrowseSort, CANDIDATE_CAP};
use novelvault_core::ranking::{RankingCategory, SortKey, RANKING_LIMIT};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::chapters::ChapterSummary;
use super::genres::Genre;
use super::{escape_like, DbError};

/// Novels per home page section
pub const HOME_SECTION_SIZE: i64 = 6;

/// Maximum full search results
pub const SEARCH_LIMIT: i64 = 12;

/// Maximum search suggestions
pub const SUGGESTION_LIMIT: i64 = 6;

/// Card columns plus aggregate counts, shared by every list query
const CARD_SELECT: &str = r#"
    SELECT
        n.novel_id, n.title, n.author, n.cover_image_url, n.status,
        n.average_rating, n.slug, n.view_count, n.is_featured,
        n.created_at, n.updated_at,
        (SELECT COUNT(*) FROM chapters c WHERE c.novel_id = n.novel_id) AS total_chapters,
        (SELECT COUNT(*) FROM ratings r WHERE r.novel_id = n.novel_id) AS total_ratings,
        (SELECT COUNT(*) FROM bookmarks b WHERE b.novel_id = n.novel_id) AS total_bookmarks,
        (SELECT COUNT(*) FROM novel_comments nc WHERE nc.novel_id = n.novel_id) AS total_comments,
        COALESCE(
            (SELECT array_agg(g.name ORDER BY g.name)
             FROM novel_genres ng JOIN genres g ON g.genre_id = ng.genre_id
             WHERE ng.novel_id = n.novel_id),
            '{}'
        ) AS genres
    FROM novels n
"#;

/// A novel as shown in lists and grids
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NovelCard {
    pub novel_id: i64,
    pub title: String,
    pub author: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: String,
    pub average_rating: Option<f64>,
    pub slug: String,
    pub view_count: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_chapters: i64,
    pub total_ratings: i64,
    pub total_bookmarks: i64,
    pub total_comments: i64,
    pub genres: Vec<String>,
}

impl BrowseCandidate for NovelCard {
    fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(String::as_str).collect()
    }

    fn average_rating(&self) -> Option<f64> {
        self.average_rating
    }
}

/// Home page sections; a section whose query failed is empty
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeSections {
    pub featured: Vec<NovelCard>,
    pub newest: Vec<NovelCard>,
    pub popular: Vec<NovelCard>,
    pub completed: Vec<NovelCard>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
}

/// Full novel page payload
#[derive(Debug, Clone, Serialize)]
pub struct NovelDetail {
    pub novel_id: i64,
    pub title: String,
    pub slug: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub view_count: i64,
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub genres: Vec<Genre>,
    pub tags: Vec<Tag>,
    pub chapters: Vec<ChapterSummary>,
    pub ratings_count: i64,
    pub total_chapters: i64,
}

/// Novel columns behind the detail page
#[derive(Debug, FromRow)]
struct NovelHead {
    novel_id: i64,
    title: String,
    slug: String,
    author: Option<String>,
    description: Option<String>,
    cover_image_url: Option<String>,
    status: String,
    is_featured: bool,
    view_count: i64,
    average_rating: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ratings_count: i64,
}

/// Search-as-you-type entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Suggestion {
    pub novel_id: i64,
    pub title: String,
    pub slug: String,
}

/// Novel repository
pub struct NovelRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NovelRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The four home sections, queried concurrently.
    ///
    /// A failing section is logged and left empty so the page still renders.
    pub async fn home_sections(&self) -> HomeSections {
        let featured = format!(
            "{CARD_SELECT} WHERE n.is_featured ORDER BY n.novel_id LIMIT {HOME_SECTION_SIZE}"
        );
        let newest = format!(
            "{CARD_SELECT} ORDER BY n.created_at DESC, n.novel_id DESC LIMIT {HOME_SECTION_SIZE}"
        );
        let popular = format!(
            "{CARD_SELECT} ORDER BY n.view_count DESC, n.novel_id LIMIT {HOME_SECTION_SIZE}"
        );
        let completed = format!(
            "{CARD_SELECT} WHERE LOWER(n.status) = 'completed' ORDER BY n.novel_id LIMIT {HOME_SECTION_SIZE}"
        );

        let (featured, newest, popular, completed) = tokio::join!(
            self.section("featured", &featured),
            self.section("newest", &newest),
            self.section("popular", &popular),
            self.section("completed", &completed),
        );

        HomeSections {
            featured,
            newest,
            popular,
            completed,
        }
    }

    async fn section(&self, name: &'static str, sql: &str) -> Vec<NovelCard> {
        match sqlx::query_as::<_, NovelCard>(sql).fetch_all(self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(section = name, error = %e, "home section query failed");
                Vec::new()
            }
        }
    }

    /// Candidate rows for a browse query.
    ///
    /// Filters status and featured in SQL, keeps novels carrying at least one
    /// requested genre, orders by the sort key and caps the result. The
    /// all-genres filter and the rating sort happen in memory.
    pub async fn browse_candidates(&self, query: &BrowseQuery) -> Result<Vec<NovelCard>, DbError> {
        let order = match query.sort {
            BrowseSort::Newest => "n.created_at DESC, n.novel_id DESC",
            BrowseSort::Popular => "n.view_count DESC, n.novel_id",
            BrowseSort::Rating => "n.novel_id",
        };
        let sql = format!(
            r#"{CARD_SELECT}
            WHERE ($1::text IS NULL OR LOWER(n.status) = $1)
              AND (NOT $2 OR n.is_featured)
              AND (cardinality($3::text[]) = 0 OR EXISTS (
                    SELECT 1 FROM novel_genres ng JOIN genres g ON g.genre_id = ng.genre_id
                    WHERE ng.novel_id = n.novel_id AND g.name = ANY($3)))
            ORDER BY {order}
            LIMIT $4"#
        );

        let rows = sqlx::query_as::<_, NovelCard>(&sql)
            .bind(query.status.as_deref())
            .bind(query.featured)
            .bind(&query.genres)
            .bind(CANDIDATE_CAP)
            .fetch_all(self.pool)
            .await?;

        tracing::debug!(candidates = rows.len(), sort = query.sort.as_str(), "browse candidates");
        Ok(rows)
    }

    /// Novel page by slug with genres, tags and the ordered chapter list
    pub async fn get_by_slug(&self, slug: &str) -> Result<NovelDetail, DbError> {
        let head = sqlx::query_as::<_, NovelHead>(
            r#"
            SELECT
                n.novel_id, n.title, n.slug, n.author, n.description, n.cover_image_url,
                n.status, n.is_featured, n.view_count, n.average_rating,
                n.created_at, n.updated_at,
                (SELECT COUNT(*) FROM ratings r WHERE r.novel_id = n.novel_id) AS ratings_count
            FROM novels n
            WHERE n.slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("novel", slug))?;

        let novel_id = head.novel_id;

        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.genre_id, g.name
            FROM novel_genres ng JOIN genres g ON g.genre_id = ng.genre_id
            WHERE ng.novel_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(novel_id)
        .fetch_all(self.pool)
        .await?;

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.tag_id, t.name
            FROM novel_tags nt JOIN tags t ON t.tag_id = nt.tag_id
            WHERE nt.novel_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(novel_id)
        .fetch_all(self.pool)
        .await?;

        let chapters = super::ChapterRepo::new(self.pool).list_for_novel(novel_id).await?;

        Ok(NovelDetail {
            novel_id,
            title: head.title,
            slug: head.slug,
            author: head.author,
            description: head.description,
            cover_image_url: head.cover_image_url,
            status: head.status,
            is_featured: head.is_featured,
            view_count: head.view_count,
            average_rating: head.average_rating,
            created_at: head.created_at,
            updated_at: head.updated_at,
            genres,
            tags,
            total_chapters: chapters.len() as i64,
            chapters,
            ratings_count: head.ratings_count,
        })
    }

    pub async fn exists(&self, novel_id: i64) -> Result<bool, DbError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM novels WHERE novel_id = $1)")
            .bind(novel_id)
            .fetch_one(self.pool)
            .await?;
        Ok(found)
    }

    /// Top novels for a ranking category.
    ///
    /// ORDER BY is generated from the category's sort keys; nullable keys
    /// sort last and ties break on ascending novel id.
    pub async fn rankings(&self, category: RankingCategory) -> Result<Vec<NovelCard>, DbError> {
        let filter = if category.excludes_unrated() {
            "WHERE n.average_rating IS NOT NULL"
        } else {
            ""
        };
        let sql = format!(
            "{CARD_SELECT} {filter} ORDER BY {} LIMIT $1",
            ranking_order(category)
        );

        let rows = sqlx::query_as::<_, NovelCard>(&sql)
            .bind(RANKING_LIMIT)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Case-insensitive match on title, author or description, most viewed first
    pub async fn search(&self, q: &str) -> Result<Vec<NovelCard>, DbError> {
        let sql = format!(
            r#"{CARD_SELECT}
            WHERE n.title ILIKE $1 OR n.author ILIKE $1 OR n.description ILIKE $1
            ORDER BY n.view_count DESC, n.novel_id
            LIMIT $2"#
        );
        let rows = sqlx::query_as::<_, NovelCard>(&sql)
            .bind(format!("%{}%", escape_like(q)))
            .bind(SEARCH_LIMIT)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Title matches for search-as-you-type
    pub async fn suggestions(&self, q: &str) -> Result<Vec<Suggestion>, DbError> {
        let rows = sqlx::query_as::<_, Suggestion>(
            r#"
            SELECT novel_id, title, slug
            FROM novels
            WHERE title ILIKE $1
            ORDER BY view_count DESC, novel_id
            LIMIT $2
            "#,
        )
        .bind(format!("%{}%", escape_like(q)))
        .bind(SUGGESTION_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM novels")
            .fetch_one(self.pool)
            .await?;
        Ok(n)
    }

    /// Every slug, for the sitemap
    pub async fn all_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs = sqlx::query_scalar("SELECT slug FROM novels ORDER BY novel_id")
            .fetch_all(self.pool)
            .await?;
        Ok(slugs)
    }
}

fn sort_key_column(key: SortKey) -> &'static str {
    match key {
        SortKey::ViewCount => "n.view_count",
        SortKey::AverageRating => "n.average_rating",
        SortKey::CommentCount => "total_comments",
        SortKey::BookmarkCount => "total_bookmarks",
    }
}

/// ORDER BY clause for a ranking category
pub fn ranking_order(category: RankingCategory) -> String {
    let mut parts: Vec<String> = category
        .sort_keys()
        .iter()
        .map(|key| {
            let nulls = if key.nullable() { " NULLS LAST" } else { "" };
            format!("{} DESC{}", sort_key_column(*key), nulls)
        })
        .collect();
    parts.push("n.novel_id ASC".to_string());
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_views_then_rating() {
        assert_eq!(
            ranking_order(RankingCategory::Rank),
            "n.view_count DESC, n.average_rating DESC NULLS LAST, n.novel_id ASC"
        );
    }

    #[test]
    fn count_categories_use_aggregates() {
        assert_eq!(
            ranking_order(RankingCategory::Comments),
            "total_comments DESC, n.novel_id ASC"
        );
        assert_eq!(
            ranking_order(RankingCategory::Bookmarks),
            "total_bookmarks DESC, n.novel_id ASC"
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rankings_exclude_unrated() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let rows = NovelRepo::new(&pool)
            .rankings(RankingCategory::Rating)
            .await
            .expect("rankings");
        assert!(rows.iter().all(|n| n.average_rating.is_some()));
        assert!(rows.len() as i64 <= RANKING_LIMIT);
    }
}
