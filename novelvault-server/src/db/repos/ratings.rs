//! Rating repository: upsert a score and refresh the novel average

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::{round_average, Score};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Rating {
    pub rating_id: i64,
    pub user_id: i64,
    pub novel_id: i64,
    pub score: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub rating: Rating,
    /// New novel average, two decimals
    pub average_rating: f64,
    pub total_ratings: i64,
}

pub struct RatingRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save a user's score and recompute the average, atomically.
    ///
    /// The novel row is locked first so concurrent ratings of the same novel
    /// recompute one after another.
    pub async fn rate(&self, user_id: i64, novel_id: i64, score: Score) -> Result<RatingOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT novel_id FROM novels WHERE novel_id = $1 FOR UPDATE")
                .bind(novel_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(DbError::not_found("novel", novel_id));
        }

        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, novel_id, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, novel_id) DO UPDATE
            SET score = EXCLUDED.score, updated_at = NOW()
            RETURNING rating_id, user_id, novel_id, score, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(novel_id)
        .bind(score.get())
        .fetch_one(&mut *tx)
        .await?;

        let (avg, total): (Option<f64>, i64) = sqlx::query_as(
            "SELECT AVG(score)::float8, COUNT(*) FROM ratings WHERE novel_id = $1",
        )
        .bind(novel_id)
        .fetch_one(&mut *tx)
        .await?;
        let average_rating = round_average(avg.unwrap_or(0.0));

        sqlx::query("UPDATE novels SET average_rating = $2, updated_at = NOW() WHERE novel_id = $1")
            .bind(novel_id)
            .bind(average_rating)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(user_id, novel_id, score = score.get(), average_rating, "rating saved");

        Ok(RatingOutcome {
            rating,
            average_rating,
            total_ratings: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    async fn stored_average(pool: &PgPool, novel_id: i64) -> Option<f64> {
        sqlx::query_scalar("SELECT average_rating FROM novels WHERE novel_id = $1")
            .bind(novel_id)
            .fetch_one(pool)
            .await
            .expect("average")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rating_recomputes_rounded_average() {
        let pool = testing::pool().await;
        let novel = testing::novel(&pool, 0).await;
        let repo = RatingRepo::new(&pool);
        let (a, b, c) = (
            testing::user(&pool).await,
            testing::user(&pool).await,
            testing::user(&pool).await,
        );

        repo.rate(a, novel.novel_id, Score::new(5).unwrap()).await.expect("rate a");
        repo.rate(b, novel.novel_id, Score::new(4).unwrap()).await.expect("rate b");
        let outcome = repo.rate(c, novel.novel_id, Score::new(4).unwrap()).await.expect("rate c");
        assert_eq!(outcome.average_rating, 4.33);
        assert_eq!(outcome.total_ratings, 3);
        assert_eq!(stored_average(&pool, novel.novel_id).await, Some(4.33));

        // re-rating replaces the earlier score
        let outcome = repo.rate(a, novel.novel_id, Score::new(1).unwrap()).await.expect("re-rate");
        assert_eq!(outcome.rating.score, 1);
        assert_eq!(outcome.total_ratings, 3);
        assert_eq!(outcome.average_rating, 3.0);
        assert_eq!(stored_average(&pool, novel.novel_id).await, Some(3.0));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rating_unknown_novel_is_not_found() {
        let pool = testing::pool().await;
        let user = testing::user(&pool).await;
        let err = RatingRepo::new(&pool)
            .rate(user, i64::MAX, Score::new(3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
