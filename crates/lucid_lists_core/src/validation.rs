//! crates/lucid_lists_core/src/validation.rs
//!
//! Input checks applied before anything is written.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::DEFAULT_COLOR;
use crate::ports::{PortError, PortResult};

static COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static color regex"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex")
});

pub const MAX_NAME_LEN: usize = 255;

/// Checks that `value` is within `min..=max` characters and not blank.
pub fn require_length(field: &str, value: &str, min: usize, max: usize) -> PortResult<()> {
    let len = value.chars().count();
    if value.trim().is_empty() || len < min || len > max {
        return Err(PortError::BadRequest(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Names and titles of every entity.
pub fn validate_name(field: &str, value: String) -> PortResult<String> {
    require_length(field, &value, 1, MAX_NAME_LEN)?;
    Ok(value)
}

pub fn validate_color(value: String) -> PortResult<String> {
    if !COLOR_REGEX.is_match(&value) {
        return Err(PortError::BadRequest(format!(
            "color must be a #RRGGBB hex value, got '{value}'"
        )));
    }
    Ok(value)
}

/// Creation-time color: missing or empty means white.
pub fn color_or_default(value: Option<String>) -> PortResult<String> {
    match value {
        Some(color) if !color.is_empty() => validate_color(color),
        _ => Ok(DEFAULT_COLOR.to_string()),
    }
}

pub fn validate_email(value: &str) -> PortResult<()> {
    if !EMAIL_REGEX.is_match(value) {
        return Err(PortError::BadRequest("invalid email address".to_string()));
    }
    Ok(())
}

/// Parses an optional enum string, falling back to `default` when absent.
pub fn parse_or<T>(value: Option<&str>, default: T) -> PortResult<T>
where
    T: std::str::FromStr<Err = PortError>,
{
    value.map_or(Ok(default), str::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;

    #[test]
    fn colors_must_be_six_digit_hex() {
        assert!(validate_color("#1a2B3c".into()).is_ok());
        assert!(validate_color("#FFF".into()).is_err());
        assert!(validate_color("red".into()).is_err());
    }

    #[test]
    fn empty_color_falls_back_to_white() {
        assert_eq!(color_or_default(Some(String::new())).unwrap(), "#FFFFFF");
        assert_eq!(color_or_default(None).unwrap(), "#FFFFFF");
        assert_eq!(color_or_default(Some("#000000".into())).unwrap(), "#000000");
    }

    #[test]
    fn names_reject_blank_and_overlong_values() {
        assert!(validate_name("name", "   ".into()).is_err());
        assert!(validate_name("name", "x".repeat(256)).is_err());
        assert!(validate_name("name", "Roadmap".into()).is_ok());
    }

    #[test]
    fn emails_need_a_domain() {
        assert!(validate_email("a@b.io").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("not an email").is_err());
    }

    #[test]
    fn parse_or_uses_default_only_when_absent() {
        assert_eq!(parse_or(None, TaskStatus::Todo).unwrap(), TaskStatus::Todo);
        assert_eq!(
            parse_or(Some("completed"), TaskStatus::Todo).unwrap(),
            TaskStatus::Completed
        );
        assert!(parse_or(Some("nope"), TaskStatus::Todo).is_err());
    }
}
