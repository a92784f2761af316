use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not parse list entry '{entry}': {reason}")]
pub struct ListParseError {
    pub entry: String,
    pub reason: String,
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a comma-separated list, e.g. `"REDIRECT, EMBEDDED"`. Blank entries are skipped.
///
/// Returns `Ok(None)` if no value was given, so callers can fall back to their own defaults.
pub fn parse_list<T>(value: Option<String>) -> Result<Option<Vec<T>>, ListParseError>
where
    T: FromStr,
    T::Err: ToString,
{
    let value = match value {
        Some(v) => v,
        None => return Ok(None),
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| ListParseError { entry: s.to_string(), reason: e.to_string() }))
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("TRUE".into()), false));
        assert!(parse_boolean_flag(Some(" yes ".into()), false));
        assert!(!parse_boolean_flag(Some("0".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn lists() {
        let parsed = parse_list::<u16>(Some("1, 2,,3 ".into())).unwrap();
        assert_eq!(parsed, Some(vec![1, 2, 3]));
        assert_eq!(parse_list::<u16>(None).unwrap(), None);
        let err = parse_list::<u16>(Some("1,x".into())).unwrap_err();
        assert_eq!(err.entry, "x");
    }
}
