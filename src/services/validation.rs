use regex::Regex;
use std::sync::OnceLock;

use crate::auth::AuthError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 254;
const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 100_000;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("Invalid email regex")
    })
}

/// Trims surrounding whitespace; case is preserved.
pub fn validate_email(email: &str) -> Result<String, AuthError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(AuthError::validation("Email cannot be empty"));
    }

    if trimmed.len() > MAX_EMAIL_LEN || !email_regex().is_match(trimmed) {
        return Err(AuthError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_username(username: &str) -> Result<String, AuthError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AuthError::validation("Username cannot be empty"));
    }

    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::validation(format!(
            "Username must be {MAX_USERNAME_LEN} characters or less"
        )));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(AuthError::validation(
            "Username can only contain letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "Password must be {MAX_PASSWORD_LEN} characters or less"
        )));
    }

    Ok(())
}

pub fn validate_blog_title(title: &str) -> Result<String, AuthError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AuthError::validation("Title cannot be empty"));
    }

    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AuthError::validation(format!(
            "Title must be {MAX_TITLE_LEN} characters or less"
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_blog_content(content: &str) -> Result<(), AuthError> {
    if content.trim().is_empty() {
        return Err(AuthError::validation("Content cannot be empty"));
    }

    if content.len() > MAX_CONTENT_LEN {
        return Err(AuthError::validation("Content is too long"));
    }

    Ok(())
}

pub fn validate_id(id: i32, resource: &str) -> Result<i32, AuthError> {
    if id <= 0 {
        return Err(AuthError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("a@x.com").unwrap(), "a@x.com");
        assert_eq!(validate_email("  Mixed.Case@Example.org ").unwrap(), "Mixed.Case@Example.org");
        assert!(validate_email("first+tag@sub.domain.io").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username(" alice ").unwrap(), "alice");
        assert!(validate_username("bob_the-2nd.x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_blog_fields() {
        assert_eq!(validate_blog_title("  Hello ").unwrap(), "Hello");
        assert!(validate_blog_title("   ").is_err());
        assert!(validate_blog_title(&"t".repeat(201)).is_err());

        assert!(validate_blog_content("Some text").is_ok());
        assert!(validate_blog_content("\n\t ").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "blog").is_ok());
        assert!(matches!(validate_id(0, "blog"), Err(AuthError::Validation(_))));
        assert!(validate_id(-5, "user").is_err());
    }
}
