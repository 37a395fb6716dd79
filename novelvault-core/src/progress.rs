//! Reading progress for bookmarks and the library page.

use serde::Serialize;

/// Percentage of a novel read, given the saved chapter's number and the
/// novel's chapter count.
///
/// A missing or non-positive chapter number counts as 0. A novel with no
/// chapters always reports 0. The result is not capped at 100: a chapter
/// number above the chapter count is reported as computed.
pub fn reading_progress(current_chapter: Option<i32>, total_chapters: i64) -> u32 {
    if total_chapters <= 0 {
        return 0;
    }
    let current = current_chapter.unwrap_or(0).max(0);
    // `as` saturates on overflow
    (f64::from(current) / total_chapters as f64 * 100.0).round() as u32
}

/// Progress snapshot attached to bookmark responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingProgress {
    pub current_chapter: i32,
    pub total_chapters: i64,
    pub progress: u32,
}

impl ReadingProgress {
    pub fn new(current_chapter: Option<i32>, total_chapters: i64) -> Self {
        Self {
            current_chapter: current_chapter.unwrap_or(0).max(0),
            total_chapters: total_chapters.max(0),
            progress: reading_progress(current_chapter, total_chapters),
        }
    }

    /// Unrounded percentage with one decimal, for display
    pub fn display_percent(&self) -> String {
        if self.total_chapters == 0 {
            return "0.0".to_string();
        }
        format!(
            "{:.1}",
            f64::from(self.current_chapter) / self.total_chapters as f64 * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_zero() {
        assert_eq!(reading_progress(Some(5), 0), 0);
        assert_eq!(reading_progress(None, 0), 0);
    }

    #[test]
    fn no_saved_chapter_is_zero() {
        assert_eq!(reading_progress(None, 10), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(reading_progress(Some(1), 3), 33);
        assert_eq!(reading_progress(Some(2), 3), 67);
        assert_eq!(reading_progress(Some(1), 8), 13);
        assert_eq!(reading_progress(Some(10), 10), 100);
    }

    #[test]
    fn chapter_beyond_count_is_not_capped() {
        assert_eq!(reading_progress(Some(12), 10), 120);
    }

    #[test]
    fn negative_chapter_counts_as_zero() {
        assert_eq!(reading_progress(Some(-3), 10), 0);
    }

    #[test]
    fn display_percent_keeps_one_decimal() {
        let p = ReadingProgress::new(Some(1), 3);
        assert_eq!(p.display_percent(), "33.3");
        assert_eq!(p.progress, 33);

        let empty = ReadingProgress::new(Some(4), 0);
        assert_eq!(empty.display_percent(), "0.0");
    }
}
