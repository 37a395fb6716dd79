//! Comment repository for novel and chapter discussion threads.
//!
//! Both kinds share one shape: a top-level comment with one level of
//! replies. Threads list newest first, replies oldest first.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::{CommentBody, Paginated, Pagination};

/// What a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Novel(i64),
    Chapter(i64),
}

impl CommentTarget {
    fn table(self) -> &'static str {
        match self {
            Self::Novel(_) => "novel_comments",
            Self::Chapter(_) => "chapter_comments",
        }
    }

    fn key_column(self) -> &'static str {
        match self {
            Self::Novel(_) => "novel_id",
            Self::Chapter(_) => "chapter_id",
        }
    }

    fn parent_table(self) -> &'static str {
        match self {
            Self::Novel(_) => "novels",
            Self::Chapter(_) => "chapters",
        }
    }

    fn resource(self) -> &'static str {
        match self {
            Self::Novel(_) => "novel",
            Self::Chapter(_) => "chapter",
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Novel(id) | Self::Chapter(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentAuthor {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CommentAuthor {
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub comment_id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub user: CommentAuthor,
}

/// A top-level comment and its replies
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
    pub reply_count: usize,
}

/// One of a user's novel comments, with where it was posted
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserComment {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub comment: Comment,
    pub novel_id: i64,
    pub novel_title: String,
    pub novel_slug: String,
}

#[derive(Debug, FromRow)]
struct UserCommentRow {
    #[sqlx(flatten)]
    item: UserComment,
    total: i64,
}

/// Where a would-be parent comment lives: its target id and its own parent
type ParentRef = (i64, Option<i64>);

/// A parent must sit on the same target and be top-level itself, so every
/// reply stays visible under a thread.
pub fn check_parent(target: CommentTarget, parent: i64, found: Option<ParentRef>) -> Result<(), DbError> {
    match found {
        Some((target_id, None)) if target_id == target.id() => Ok(()),
        Some((target_id, Some(_))) if target_id == target.id() => Err(DbError::invalid(format!(
            "parent comment {parent} is a reply; reply to the top-level comment instead"
        ))),
        _ => Err(DbError::invalid(format!(
            "parent comment {parent} does not belong to this {}",
            target.resource()
        ))),
    }
}

fn select_sql(target: CommentTarget) -> String {
    format!(
        r#"
        SELECT c.comment_id, c.parent_comment_id, c.content, c.created_at, c.updated_at,
               u.user_id, u.username, u.display_name, u.avatar_url
        FROM {table} c
        JOIN users u ON u.user_id = c.user_id
        "#,
        table = target.table()
    )
}

/// Group replies under their threads, preserving both orders
pub fn assemble_threads(top_level: Vec<Comment>, replies: Vec<Comment>) -> Vec<CommentThread> {
    let mut by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.parent_comment_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.comment_id).unwrap_or_default();
            CommentThread {
                reply_count: replies.len(),
                comment,
                replies,
            }
        })
        .collect()
}

pub struct CommentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Top-level comments, newest first, each with its replies
    pub async fn threads(&self, target: CommentTarget) -> Result<Vec<CommentThread>, DbError> {
        let top_sql = format!(
            "{} WHERE c.{} = $1 AND c.parent_comment_id IS NULL ORDER BY c.created_at DESC, c.comment_id DESC",
            select_sql(target),
            target.key_column()
        );
        let top_level = sqlx::query_as::<_, Comment>(&top_sql)
            .bind(target.id())
            .fetch_all(self.pool)
            .await?;

        if top_level.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = top_level.iter().map(|c| c.comment_id).collect();
        let reply_sql = format!(
            "{} WHERE c.parent_comment_id = ANY($1) ORDER BY c.created_at ASC, c.comment_id ASC",
            select_sql(target)
        );
        let replies = sqlx::query_as::<_, Comment>(&reply_sql)
            .bind(&ids)
            .fetch_all(self.pool)
            .await?;

        Ok(assemble_threads(top_level, replies))
    }

    /// Post a comment or reply.
    ///
    /// The target must exist (not found otherwise). A parent comment must
    /// be a top-level comment on the same target (invalid otherwise).
    pub async fn create(
        &self,
        target: CommentTarget,
        user_id: i64,
        body: &CommentBody,
        parent_comment_id: Option<i64>,
    ) -> Result<CommentThread, DbError> {
        let exists_sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            target.parent_table(),
            target.key_column()
        );
        let exists: bool = sqlx::query_scalar(&exists_sql)
            .bind(target.id())
            .fetch_one(self.pool)
            .await?;
        if !exists {
            return Err(DbError::not_found(target.resource(), target.id()));
        }

        if let Some(parent) = parent_comment_id {
            let parent_sql = format!(
                "SELECT {}, parent_comment_id FROM {} WHERE comment_id = $1",
                target.key_column(),
                target.table()
            );
            let found: Option<ParentRef> = sqlx::query_as(&parent_sql)
                .bind(parent)
                .fetch_optional(self.pool)
                .await?;
            check_parent(target, parent, found)?;
        }

        let insert_sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO {table} ({key}, user_id, parent_comment_id, content)
                VALUES ($1, $2, $3, $4)
                RETURNING comment_id, parent_comment_id, content, created_at, updated_at, user_id
            )
            SELECT i.comment_id, i.parent_comment_id, i.content, i.created_at, i.updated_at,
                   u.user_id, u.username, u.display_name, u.avatar_url
            FROM inserted i
            JOIN users u ON u.user_id = i.user_id
            "#,
            table = target.table(),
            key = target.key_column()
        );
        let comment = sqlx::query_as::<_, Comment>(&insert_sql)
            .bind(target.id())
            .bind(user_id)
            .bind(parent_comment_id)
            .bind(body.as_str())
            .fetch_one(self.pool)
            .await?;

        tracing::info!(
            comment_id = comment.comment_id,
            target = target.resource(),
            target_id = target.id(),
            "comment posted"
        );

        Ok(CommentThread {
            comment,
            replies: Vec::new(),
            reply_count: 0,
        })
    }

    /// A user's novel comments, newest first
    pub async fn by_user(&self, user_id: i64, page: Pagination) -> Result<Paginated<UserComment>, DbError> {
        let rows = sqlx::query_as::<_, UserCommentRow>(
            r#"
            SELECT c.comment_id, c.parent_comment_id, c.content, c.created_at, c.updated_at,
                   u.user_id, u.username, u.display_name, u.avatar_url,
                   n.novel_id, n.title AS novel_title, n.slug AS novel_slug,
                   COUNT(*) OVER() AS total
            FROM novel_comments c
            JOIN users u ON u.user_id = c.user_id
            JOIN novels n ON n.novel_id = c.novel_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.comment_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = rows.first().map_or(0, |r| r.total);
        let items = rows.into_iter().map(|r| r.item).collect();

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn comment(id: i64, parent: Option<i64>) -> Comment {
        Comment {
            comment_id: id,
            parent_comment_id: parent,
            content: format!("comment {id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user: CommentAuthor {
                user_id: 1,
                username: "reader".into(),
                display_name: None,
                avatar_url: None,
            },
        }
    }

    #[test]
    fn replies_grouped_under_parents() {
        let threads = assemble_threads(
            vec![comment(3, None), comment(1, None)],
            vec![comment(4, Some(1)), comment(5, Some(3)), comment(6, Some(1))],
        );
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.comment_id, 3);
        assert_eq!(threads[0].reply_count, 1);
        let ids: Vec<_> = threads[1].replies.iter().map(|c| c.comment_id).collect();
        assert_eq!(ids, vec![4, 6]);
    }

    #[test]
    fn target_tables() {
        assert_eq!(CommentTarget::Novel(1).table(), "novel_comments");
        assert_eq!(CommentTarget::Chapter(1).key_column(), "chapter_id");
    }

    #[test]
    fn thread_serializes_flat() {
        let thread = assemble_threads(vec![comment(1, None)], vec![]).remove(0);
        let json = serde_json::to_value(&thread).unwrap();
        assert_eq!(json["comment_id"], 1);
        assert_eq!(json["reply_count"], 0);
        assert_eq!(json["user"]["username"], "reader");
    }

    #[test]
    fn parent_must_be_top_level_on_same_target() {
        let target = CommentTarget::Novel(7);
        assert!(check_parent(target, 1, Some((7, None))).is_ok());

        let nested = check_parent(target, 2, Some((7, Some(1)))).unwrap_err();
        assert!(matches!(nested, DbError::Invalid { .. }));
        assert!(nested.to_string().contains("is a reply"));

        let elsewhere = check_parent(target, 3, Some((8, None))).unwrap_err();
        assert!(elsewhere.to_string().contains("does not belong to this novel"));

        let missing = check_parent(CommentTarget::Chapter(7), 4, None).unwrap_err();
        assert!(missing.to_string().contains("does not belong to this chapter"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn replies_stay_one_level_deep() {
        let pool = testing::pool().await;
        let user = testing::user(&pool).await;
        let novel = testing::novel(&pool, 0).await;
        let target = CommentTarget::Novel(novel.novel_id);
        let repo = CommentRepo::new(&pool);
        let body = |text: &str| CommentBody::new(text).unwrap();

        let top = repo.create(target, user, &body("first"), None).await.expect("top");
        let top_id = top.comment.comment_id;
        let reply = repo
            .create(target, user, &body("reply"), Some(top_id))
            .await
            .expect("reply");
        let reply_id = reply.comment.comment_id;

        let err = repo
            .create(target, user, &body("nested"), Some(reply_id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid { .. }));

        let threads = repo.threads(target).await.expect("threads");
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.comment_id, top_id);
        let reply_ids: Vec<i64> = threads[0].replies.iter().map(|c| c.comment_id).collect();
        assert_eq!(reply_ids, vec![reply_id]);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn parent_from_another_target_is_rejected() {
        let pool = testing::pool().await;
        let user = testing::user(&pool).await;
        let first = testing::novel(&pool, 1).await;
        let second = testing::novel(&pool, 0).await;
        let repo = CommentRepo::new(&pool);
        let body = CommentBody::new("hello").unwrap();

        let other = repo
            .create(CommentTarget::Novel(first.novel_id), user, &body, None)
            .await
            .expect("comment on first novel");
        let err = repo
            .create(
                CommentTarget::Novel(second.novel_id),
                user,
                &body,
                Some(other.comment.comment_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid { .. }));

        let err = repo
            .create(CommentTarget::Chapter(i64::MAX), user, &body, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
