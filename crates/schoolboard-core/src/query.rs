//! Lenient deserializers for query strings.
//!
//! Query parameters arrive as strings. A value that is empty or does not
//! parse is treated as absent rather than rejecting the request, so a bad
//! `?priority=whatever` simply does not filter.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Parses an optional string with [`FromStr`], discarding failures.
pub fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<T>().ok()))
}

/// Accepts `true/false`, `1/0` and `yes/no` (case-insensitive).
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_bool(&s)))
}

/// Trims the value; blank strings become `None`.
pub fn trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Wraps a search term for `ILIKE`, escaping the wildcard characters the
/// user typed with Postgres' default backslash escape.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "lenient_option")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "trimmed_string")]
        search: Option<String>,
    }

    #[test]
    fn test_valid_values() {
        let q: Query =
            serde_json::from_str(r#"{"count":"5","flag":"TRUE","search":" maths "}"#).unwrap();
        assert_eq!(q.count, Some(5));
        assert_eq!(q.flag, Some(true));
        assert_eq!(q.search.as_deref(), Some("maths"));
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let q: Query =
            serde_json::from_str(r#"{"count":"five","flag":"maybe","search":"   "}"#).unwrap();
        assert_eq!(q.count, None);
        assert_eq!(q.flag, None);
        assert_eq!(q.search, None);
    }

    #[test]
    fn test_missing_values() {
        let q: Query = serde_json::from_str("{}").unwrap();
        assert!(q.count.is_none() && q.flag.is_none() && q.search.is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("maths"), "%maths%");
        assert_eq!(like_pattern("100%_sure"), "%100\\%\\_sure%");
    }
}
