use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

/// Converts an ISO-8601 time duration such as `PT1H2M3S` into whole seconds.
///
/// Only the hour, minute and second components are understood. A string that does not start
/// with `PT` yields `None`, and a bare `PT` is zero.
pub fn parse_iso8601_duration(duration: &str) -> Option<i32> {
    let captures = DURATION_REGEX.captures(duration)?;
    let component = |index: usize| -> i32 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .unwrap_or(0)
    };

    Some(component(1) * 3600 + component(2) * 60 + component(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_component() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("PT2H"), Some(7200));
        assert_eq!(parse_iso8601_duration("PT10M"), Some(600));
    }

    #[test]
    fn bare_prefix_is_zero() {
        assert_eq!(parse_iso8601_duration("PT"), Some(0));
    }

    #[test]
    fn non_duration_is_none() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("4 minutes"), None);
    }
}
