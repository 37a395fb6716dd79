//! Account fields accepted at registration and login

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Letters, digits, underscore and dash, 3 to 30 characters
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("invalid email regex")
});

/// Characters a password may contain; letter and digit presence is checked separately
static PASSWORD_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,}$").expect("invalid password regex"));

const MAX_PASSWORD_LEN: usize = 128;

/// Validated username, original case preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Missing { field: "username" });
        }
        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "must be 3-30 characters long and can only contain letters, numbers, underscores, and dashes",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address, stored lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Missing { field: "email" });
        }
        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "invalid email format",
            });
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Password that meets the strength rules. Never logged or serialized.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// At least 8 characters from `[A-Za-z0-9@$!%*#?&]`, with at least one
    /// letter and one digit
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Missing { field: "password" });
        }
        if s.len() > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }
        let has_letter = s.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = s.chars().any(|c| c.is_ascii_digit());
        if !PASSWORD_CHARSET_RE.is_match(s) || !has_letter || !has_digit {
            return Err(ValidationError::InvalidFormat {
                field: "password",
                reason: "must be at least 8 characters long and contain at least one letter and one number",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(Username::new("reader_01").is_ok());
        assert!(Username::new("a-b").is_ok());
        assert!(Username::new("ab").is_err());
        assert!(Username::new("has space").is_err());
        assert!(Username::new(&"x".repeat(31)).is_err());
        assert_eq!(
            Username::new("").unwrap_err(),
            ValidationError::Missing { field: "username" }
        );
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(Email::new(" Reader@Example.COM ").unwrap().as_str(), "reader@example.com");
        assert!(Email::new("no-at-sign.com").is_err());
        assert!(Email::new("a@b.c").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(Password::new("abcdefg1").is_ok());
        assert!(Password::new("p@ssw0rd!").is_ok());
        assert!(Password::new("abcdefgh").is_err());
        assert!(Password::new("12345678").is_err());
        assert!(Password::new("abc1").is_err());
        assert!(Password::new("abcdefg1 ").is_err());
    }

    #[test]
    fn password_debug_is_masked() {
        let p = Password::new("abcdefg1").unwrap();
        assert_eq!(format!("{:?}", p), "Password(***)");
    }
}
