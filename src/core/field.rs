//! Raw parameter coercion and text matching

use crate::core::error::ValidationError;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

/// Coerce a query-string value into a boolean
///
/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`, ignoring
/// case and surrounding whitespace.
pub fn parse_bool(field: &str, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, raw, "a boolean")),
    }
}

/// Coerce a query-string value into an integer type
pub fn parse_int<T: FromStr>(field: &str, raw: &str) -> Result<T, ValidationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(field, raw, "an integer"))
}

pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|_| invalid(field, raw, "a UUID"))
}

/// Case-insensitive substring containment
pub fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive equality
pub fn iexact(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Extract the year from a release date of the form `YYYY`, `YYYY-MM` or
/// `YYYY-MM-DD`
pub fn release_year(date: &str) -> Option<i32> {
    static RELEASE_DATE: OnceLock<Regex> = OnceLock::new();
    let regex = RELEASE_DATE
        .get_or_init(|| Regex::new(r"^(\d{4})(?:-(\d{2}))?(?:-(\d{2}))?$").unwrap());
    regex
        .captures(date.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

fn invalid(field: &str, raw: &str, expected: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        assert!(parse_bool("public", "true").unwrap());
        assert!(parse_bool("public", "TRUE").unwrap());
        assert!(parse_bool("public", " 1 ").unwrap());
        assert!(!parse_bool("public", "false").unwrap());
        assert!(!parse_bool("public", "off").unwrap());
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        let err = parse_bool("public", "notabool").unwrap_err();
        match err {
            ValidationError::InvalidValue { field, value, .. } => {
                assert_eq!(field, "public");
                assert_eq!(value, "notabool");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<i32>("release_year", "1999").unwrap(), 1999);
        assert_eq!(parse_int::<i32>("release_year", "-5").unwrap(), -5);
        assert!(parse_int::<u32>("num_tracks", "-5").is_err());
        assert!(parse_int::<i32>("release_year", "nineteen").is_err());
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid("playlist", &id.to_string()).unwrap(), id);
        assert!(parse_uuid("playlist", "nope").is_err());
    }

    #[test]
    fn test_icontains() {
        assert!(icontains("Late Night __FILTER__ Mix", "__filter__"));
        assert!(icontains("abc", ""));
        assert!(!icontains("abc", "abcd"));
    }

    #[test]
    fn test_release_year_precisions() {
        assert_eq!(release_year("1997"), Some(1997));
        assert_eq!(release_year("1997-05"), Some(1997));
        assert_eq!(release_year("1997-05-21"), Some(1997));
        assert_eq!(release_year("May 1997"), None);
        assert_eq!(release_year(""), None);
    }
}
