//! Profile update fields

use super::ValidationError;

const MAX_DISPLAY_NAME_LEN: usize = 50;
const MAX_BIO_LEN: usize = 1000;
const MAX_AVATAR_URL_LEN: usize = 500;

/// Validated profile update
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Display name is required; blank bio or avatar clear the field
    pub fn new(
        display_name: Option<&str>,
        bio: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let display_name = display_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::Missing { field: "displayName" })?;
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "displayName",
                max: MAX_DISPLAY_NAME_LEN,
            });
        }

        let bio = bio.map(str::trim).filter(|s| !s.is_empty());
        if bio.is_some_and(|b| b.chars().count() > MAX_BIO_LEN) {
            return Err(ValidationError::TooLong {
                field: "bio",
                max: MAX_BIO_LEN,
            });
        }

        let avatar_url = avatar_url.map(str::trim).filter(|s| !s.is_empty());
        if let Some(url) = avatar_url {
            if url.len() > MAX_AVATAR_URL_LEN {
                return Err(ValidationError::TooLong {
                    field: "avatarUrl",
                    max: MAX_AVATAR_URL_LEN,
                });
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidFormat {
                    field: "avatarUrl",
                    reason: "must be an http(s) URL",
                });
            }
        }

        Ok(Self {
            display_name: display_name.to_owned(),
            bio: bio.map(str::to_owned),
            avatar_url: avatar_url.map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_required() {
        assert_eq!(
            ProfileUpdate::new(None, Some("bio"), None).unwrap_err(),
            ValidationError::Missing { field: "displayName" }
        );
        assert!(ProfileUpdate::new(Some("   "), None, None).is_err());
    }

    #[test]
    fn blanks_clear_optional_fields() {
        let update = ProfileUpdate::new(Some(" Ann "), Some(""), Some("  ")).unwrap();
        assert_eq!(update.display_name, "Ann");
        assert_eq!(update.bio, None);
        assert_eq!(update.avatar_url, None);
    }

    #[test]
    fn avatar_must_be_http() {
        assert!(ProfileUpdate::new(Some("Ann"), None, Some("javascript:alert(1)")).is_err());
        assert!(ProfileUpdate::new(Some("Ann"), None, Some("https://cdn.example/a.png")).is_ok());
    }
}
