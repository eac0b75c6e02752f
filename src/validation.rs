//! Field rules shared by the web forms and the command line.
//!
//! Each validator returns a field name to message map; empty means valid.
//! Lengths are counted in characters on the trimmed value, since that is what
//! gets stored.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub type FieldErrors = HashMap<String, String>;

pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const TITLE_MAX: usize = 200;
pub const PROFILE_MAX: usize = 1000;

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

pub fn validate_registration(username: &str, password: &str) -> FieldErrors {
    let mut errors = HashMap::new();

    if username.trim().is_empty() {
        errors.insert("username".to_string(), "Username is required".to_string());
    } else if char_len(username) > USERNAME_MAX {
        errors.insert(
            "username".to_string(),
            format!("Username must be at most {USERNAME_MAX} characters"),
        );
    }

    // passwords are stored as typed, so no trimming here
    if password.chars().count() < PASSWORD_MIN {
        errors.insert(
            "password".to_string(),
            format!("Password must be at least {PASSWORD_MIN} characters"),
        );
    }

    errors
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.insert("title".to_string(), "Title is required".to_string());
    } else if char_len(title) > TITLE_MAX {
        errors.insert(
            "title".to_string(),
            format!("Title must be at most {TITLE_MAX} characters"),
        );
    }
}

pub fn validate_tip(title: &str, content: &str) -> FieldErrors {
    let mut errors = HashMap::new();
    check_title(title, &mut errors);

    if content.trim().is_empty() {
        errors.insert("content".to_string(), "Content is required".to_string());
    }

    errors
}

pub fn validate_plan(title: &str) -> FieldErrors {
    let mut errors = HashMap::new();
    check_title(title, &mut errors);
    errors
}

pub fn validate_profile(profile: &str) -> FieldErrors {
    let mut errors = HashMap::new();
    if char_len(profile) > PROFILE_MAX {
        errors.insert(
            "profile".to_string(),
            format!("Profile must be at most {PROFILE_MAX} characters"),
        );
    }
    errors
}

/// Parse an RFC 3339 timestamp and re-render it in UTC, so stored values sort
/// chronologically. `None` when absent or unparseable.
pub fn normalize_timestamp(raw: Option<&str>) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw?.trim()).ok()?;
    Some(parsed.with_timezone(&Utc).to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_rules() {
        assert!(validate_registration("maya", "sunscreen").is_empty());

        let errors = validate_registration("  ", "abc");
        assert_eq!(errors.get("username").map(String::as_str), Some("Username is required"));
        assert!(errors.contains_key("password"));

        let errors = validate_registration(&"u".repeat(USERNAME_MAX + 1), "sunscreen");
        assert!(errors.contains_key("username"));
        assert!(validate_registration(&"u".repeat(USERNAME_MAX), "sunscreen").is_empty());
    }

    #[test]
    fn title_limit_applies_to_trimmed_value() {
        let exact = "a".repeat(TITLE_MAX);
        assert!(validate_plan(&exact).is_empty());
        assert!(validate_plan(&format!("  {exact}  ")).is_empty());
        assert!(validate_plan(&"a".repeat(TITLE_MAX + 1)).contains_key("title"));
    }

    #[test]
    fn tip_needs_title_and_content() {
        assert!(validate_tip("Double cleanse", "Oil first").is_empty());
        let errors = validate_tip("", " ");
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("content"));
    }

    #[test]
    fn profile_limit_ignores_surrounding_whitespace() {
        let exact = "p".repeat(PROFILE_MAX);
        assert!(validate_profile(&format!("{exact}\n\n")).is_empty());
        assert!(validate_profile(&"p".repeat(PROFILE_MAX + 1)).contains_key("profile"));
    }

    #[test]
    fn timestamps_are_normalized_to_utc() {
        assert_eq!(
            normalize_timestamp(Some("2024-02-01T02:00:00+02:00")).as_deref(),
            Some("2024-02-01T00:00:00+00:00")
        );
        assert_eq!(normalize_timestamp(Some("garbage")), None);
        assert_eq!(normalize_timestamp(None), None);
    }
}
