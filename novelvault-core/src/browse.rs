//! Catalog browsing: filter parsing, genre AND-filtering, null-safe rating
//! sort and page slicing over a bounded candidate set.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

/// Upper bound on rows fetched before in-memory filtering
pub const CANDIDATE_CAP: i64 = 1000;

/// Default novels per browse page
pub const DEFAULT_LIMIT: u32 = 18;

/// Maximum novels per browse page
pub const MAX_LIMIT: u32 = 100;

/// Browse sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseSort {
    #[default]
    Newest,
    Popular,
    Rating,
}

impl BrowseSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Popular => "popular",
            Self::Rating => "rating",
        }
    }
}

impl FromStr for BrowseSort {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `newest`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "popular" => Self::Popular,
            "rating" => Self::Rating,
            _ => Self::Newest,
        })
    }
}

/// Parsed browse filters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseQuery {
    /// Requested genres; a novel must carry all of them
    pub genres: Vec<String>,
    /// Status filter, lowercased; `None` means all
    pub status: Option<String>,
    pub sort: BrowseSort,
    pub featured: bool,
    /// 1-indexed page
    pub page: u32,
    pub limit: u32,
}

impl Default for BrowseQuery {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            status: None,
            sort: BrowseSort::Newest,
            featured: false,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl BrowseQuery {
    /// Build from raw query-string values.
    ///
    /// - `genre` is comma separated, blanks dropped
    /// - `status` of `all` (any case) means no filter
    /// - `featured` only counts when exactly `true`
    /// - page is at least 1, limit is clamped to 1..=100
    pub fn from_params(
        genre: Option<&str>,
        status: Option<&str>,
        sort: Option<&str>,
        featured: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Self {
        let genres = genre
            .map(|g| {
                g.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let status = status
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != "all");

        let sort = sort
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            genres,
            status,
            sort,
            featured: featured == Some("true"),
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// What the in-memory pass needs to know about a candidate row
pub trait BrowseCandidate {
    fn genre_names(&self) -> Vec<&str>;
    fn average_rating(&self) -> Option<f64>;
}

/// One page of browse results
#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage<T> {
    pub novels: Vec<T>,
    /// Matches across all pages
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> BrowsePage<T> {
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.limit as usize) as u32
        }
    }
}

/// Compare two optional ratings: higher first, `None` after every rating.
pub fn rating_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Stable sort by rating, highest first, unrated last.
pub fn sort_by_rating_nulls_last<T: BrowseCandidate>(items: &mut [T]) {
    items.sort_by(|a, b| rating_desc_nulls_last(a.average_rating(), b.average_rating()));
}

/// Apply the in-memory part of a browse query to SQL candidates.
///
/// Candidates arrive already filtered by status/featured, prefiltered to
/// novels having at least one requested genre, and ordered by the sort key
/// (except `rating`, which is ordered here).
pub fn apply<T: BrowseCandidate>(query: &BrowseQuery, mut candidates: Vec<T>) -> BrowsePage<T> {
    if !query.genres.is_empty() {
        candidates.retain(|novel| {
            let names = novel.genre_names();
            query.genres.iter().all(|g| names.contains(&g.as_str()))
        });
    }

    if query.sort == BrowseSort::Rating {
        sort_by_rating_nulls_last(&mut candidates);
    }

    let total = candidates.len();
    let novels = candidates
        .into_iter()
        .skip(query.offset())
        .take(query.limit as usize)
        .collect();

    tracing::debug!(total, page = query.page, "browse filtered");

    BrowsePage {
        novels,
        total,
        page: query.page,
        limit: query.limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        genres: Vec<&'static str>,
        rating: Option<f64>,
    }

    impl BrowseCandidate for Row {
        fn genre_names(&self) -> Vec<&str> {
            self.genres.clone()
        }

        fn average_rating(&self) -> Option<f64> {
            self.rating
        }
    }

    fn row(id: i64, genres: &[&'static str], rating: Option<f64>) -> Row {
        Row {
            id,
            genres: genres.to_vec(),
            rating,
        }
    }

    fn ids(page: &BrowsePage<Row>) -> Vec<i64> {
        page.novels.iter().map(|r| r.id).collect()
    }

    #[test]
    fn parses_params() {
        let q = BrowseQuery::from_params(
            Some("Fantasy, Action,,"),
            Some("Completed"),
            Some("rating"),
            Some("true"),
            Some(0),
            Some(500),
        );
        assert_eq!(q.genres, vec!["Fantasy", "Action"]);
        assert_eq!(q.status.as_deref(), Some("completed"));
        assert_eq!(q.sort, BrowseSort::Rating);
        assert!(q.featured);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, MAX_LIMIT);
    }

    #[test]
    fn defaults_when_absent() {
        let q = BrowseQuery::from_params(None, Some("all"), Some("bogus"), Some("yes"), None, None);
        assert_eq!(q, BrowseQuery::default());
    }

    #[test]
    fn genre_filter_requires_all() {
        let q = BrowseQuery::from_params(Some("Fantasy,Action"), None, None, None, None, None);
        let rows = vec![
            row(1, &["Fantasy"], None),
            row(2, &["Fantasy", "Action"], None),
            row(3, &["Action", "Romance", "Fantasy"], None),
        ];
        let page = apply(&q, rows);
        assert_eq!(ids(&page), vec![2, 3]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn rating_sort_puts_unrated_last_and_is_stable() {
        let q = BrowseQuery {
            sort: BrowseSort::Rating,
            ..BrowseQuery::default()
        };
        let rows = vec![
            row(1, &[], None),
            row(2, &[], Some(3.5)),
            row(3, &[], Some(4.75)),
            row(4, &[], None),
            row(5, &[], Some(3.5)),
        ];
        let page = apply(&q, rows);
        assert_eq!(ids(&page), vec![3, 2, 5, 1, 4]);
    }

    #[test]
    fn non_rating_sort_keeps_sql_order() {
        let q = BrowseQuery::default();
        let rows = vec![row(9, &[], None), row(1, &[], Some(5.0))];
        assert_eq!(ids(&apply(&q, rows)), vec![9, 1]);
    }

    #[test]
    fn paginates_after_filtering() {
        let q = BrowseQuery {
            page: 2,
            limit: 2,
            ..BrowseQuery::default()
        };
        let rows = (1..=5).map(|i| row(i, &[], None)).collect();
        let page = apply(&q, rows);
        assert_eq!(ids(&page), vec![3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn page_past_end_is_empty() {
        let q = BrowseQuery {
            page: 4,
            limit: 2,
            ..BrowseQuery::default()
        };
        let rows = (1..=5).map(|i| row(i, &[], None)).collect();
        let page = apply(&q, rows);
        assert!(page.novels.is_empty());
        assert_eq!(page.total, 5);
    }
}
