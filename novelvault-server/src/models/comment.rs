//! Comment body validation

use super::ValidationError;

/// Maximum comment length in characters
pub const MAX_COMMENT_LEN: usize = 5000;

/// Trimmed, non-empty comment text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        if trimmed.chars().count() > MAX_COMMENT_LEN {
            return Err(ValidationError::TooLong {
                field: "content",
                max: MAX_COMMENT_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(CommentBody::new("  great chapter \n").unwrap().as_str(), "great chapter");
        assert!(matches!(
            CommentBody::new(" \t "),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn length_counts_characters() {
        assert!(CommentBody::new(&"é".repeat(MAX_COMMENT_LEN)).is_ok());
        assert!(matches!(
            CommentBody::new(&"a".repeat(MAX_COMMENT_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
