//! Ranking categories and their sort composition.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// Number of novels shown on a ranking page
pub const RANKING_LIMIT: i64 = 20;

/// A column a ranking sorts on, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ViewCount,
    AverageRating,
    CommentCount,
    BookmarkCount,
}

impl SortKey {
    /// Whether NULL values can occur and must sort last
    pub fn nullable(self) -> bool {
        matches!(self, SortKey::AverageRating)
    }
}

/// Ranking tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingCategory {
    #[default]
    Rank,
    Rating,
    Reads,
    Comments,
    Bookmarks,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 5] = [
        RankingCategory::Rank,
        RankingCategory::Rating,
        RankingCategory::Reads,
        RankingCategory::Comments,
        RankingCategory::Bookmarks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Rating => "rating",
            Self::Reads => "reads",
            Self::Comments => "comments",
            Self::Bookmarks => "bookmarks",
        }
    }

    /// Sort keys in priority order. Ties after these break on novel id.
    pub fn sort_keys(self) -> &'static [SortKey] {
        match self {
            Self::Rank => &[SortKey::ViewCount, SortKey::AverageRating],
            Self::Rating => &[SortKey::AverageRating],
            Self::Reads => &[SortKey::ViewCount],
            Self::Comments => &[SortKey::CommentCount],
            Self::Bookmarks => &[SortKey::BookmarkCount],
        }
    }

    /// Unrated novels are left out of the rating ranking entirely
    pub fn excludes_unrated(self) -> bool {
        matches!(self, Self::Rating)
    }

    /// Short tab label
    pub fn label(self) -> &'static str {
        match self {
            Self::Rank => "Rank",
            Self::Rating => "Rating",
            Self::Reads => "Reads",
            Self::Comments => "Comments",
            Self::Bookmarks => "Bookmarks",
        }
    }

    /// One-line tab hint
    pub fn tab_hint(self) -> &'static str {
        match self {
            Self::Rank => "Overall ranking",
            Self::Rating => "Users' votes",
            Self::Reads => "Chapter visits",
            Self::Comments => "Discussion",
            Self::Bookmarks => "Most bookmarked",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Rank => "Overall Ranking",
            Self::Rating => "Rating Ranking",
            Self::Reads => "Most Read",
            Self::Comments => "Most Discussed",
            Self::Bookmarks => "Most Bookmarked",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Rank => {
                "The ranking is based on the combination of increasing reads of a book and the average user rating score."
            }
            Self::Rating => "Novels ranked by average user rating scores.",
            Self::Reads => "Novels ranked by total chapter visits.",
            Self::Comments => "Novels ranked by number of comments.",
            Self::Bookmarks => "Novels ranked by number of times bookmarked.",
        }
    }

    /// Label of the stat shown next to each ranked novel, if any
    pub fn stat_label(self) -> Option<&'static str> {
        match self {
            Self::Rank => None,
            Self::Rating => Some("Rating"),
            Self::Reads => Some("Views"),
            Self::Comments => Some("Comments"),
            Self::Bookmarks => Some("Bookmarks"),
        }
    }
}

impl fmt::Display for RankingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::unknown_category(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_categories() {
        for category in RankingCategory::ALL {
            assert_eq!(category.as_str().parse::<RankingCategory>().unwrap(), category);
        }
    }

    #[test]
    fn rejects_unknown_category() {
        let err = "weekly".parse::<RankingCategory>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownCategory { .. }));
        assert!("Rank".parse::<RankingCategory>().is_err());
    }

    #[test]
    fn rank_sorts_views_then_rating() {
        assert_eq!(
            RankingCategory::Rank.sort_keys(),
            &[SortKey::ViewCount, SortKey::AverageRating]
        );
    }

    #[test]
    fn only_rating_excludes_unrated() {
        let excluded: Vec<_> = RankingCategory::ALL
            .into_iter()
            .filter(|c| c.excludes_unrated())
            .collect();
        assert_eq!(excluded, vec![RankingCategory::Rating]);
    }

    #[test]
    fn rating_key_is_nullable() {
        assert!(SortKey::AverageRating.nullable());
        assert!(!SortKey::ViewCount.nullable());
    }
}
