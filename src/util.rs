//! Small string helpers shared by the line-oriented parsers.

/// ASCII case-insensitive prefix test.
pub(crate) fn starts_with_nocase(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// The part of `s` before the first `delimiter`, or all of it.
pub(crate) fn value_before(s: &str, delimiter: char) -> &str {
    s.split(delimiter).next().unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_nocase() {
        assert!(starts_with_nocase("Description: x", "desc"));
        assert!(starts_with_nocase("URL: x", "url"));
        assert!(!starts_with_nocase("de", "desc"));
        assert!(!starts_with_nocase("maintainer", "pack"));
    }

    #[test]
    fn test_value_before() {
        assert_eq!(value_before("1.0 # note", '#'), "1.0 ");
        assert_eq!(value_before("plain", '#'), "plain");
        assert_eq!(value_before("", '#'), "");
    }
}
