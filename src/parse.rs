//! Decoding of `show configuration ... | display set relative` output.
//!
//! A resource parser walks the relative lines of its object and dispatches
//! on prefixes, most specific first, consuming each matched keyword in place
//! so nested keywords can be matched against the remainder. Lines no parser
//! recognises are ignored; devices running newer releases may return
//! statements the resource does not model.

use std::str::FromStr;

use crate::error::ProviderError;
use crate::render::SET;

const CONFIG_OUTPUT_START: &str = "<configuration-output>";
const CONFIG_OUTPUT_END: &str = "</configuration-output>";

/// Iterate the statements of a relative show output with `set ` removed.
///
/// Envelope start markers are skipped, the end marker stops iteration and
/// blank lines are dropped.
pub fn relative_lines(show: &str) -> impl Iterator<Item = &str> {
    show.lines()
        .filter(|line| !line.contains(CONFIG_OUTPUT_START))
        .take_while(|line| !line.contains(CONFIG_OUTPUT_END))
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(SET).unwrap_or(line)
        })
        .filter(|line| !line.is_empty())
}

/// Whether a show output carries no configuration at all.
pub fn is_empty_output(show: &str) -> bool {
    relative_lines(show).next().is_none()
}

/// Consume `prefix` from the front of `line`, returning whether it matched.
pub fn cut_prefix(line: &mut &str, prefix: &str) -> bool {
    match line.strip_prefix(prefix) {
        Some(rest) => {
            *line = rest;
            true
        }
        None => false,
    }
}

/// Remove surrounding double quotes.
pub fn trim_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

/// Convert a numeric token, keeping the token in the error.
pub fn parse_int<T>(token: &str) -> Result<T, ProviderError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    token
        .parse::<T>()
        .map_err(|source| ProviderError::parse_int(token, source))
}

/// Split a line into its first word (quotes kept) and the rest.
///
/// Quoted words may contain spaces: `"a b" password "c"` splits into
/// `"a b"` and `password "c"`.
pub fn split_word(line: &str) -> (&str, &str) {
    let end = if line.starts_with('"') {
        line[1..].find('"').map(|i| i + 2).unwrap_or(line.len())
    } else {
        line.find(' ').unwrap_or(line.len())
    };
    let (word, rest) = line.split_at(end);
    (word, rest.trim_start())
}

/// Find the entry keyed by `key`, appending `new(key)` on first sight.
///
/// Repeated named blocks are spread over several lines; this keeps them in
/// the order they are first encountered while later lines fill them in.
pub fn named_entry<'a, T>(
    items: &'a mut Vec<T>,
    key: &str,
    key_of: impl Fn(&T) -> &str,
    new: impl FnOnce(&str) -> T,
) -> &'a mut T {
    let index = match items.iter().position(|item| key_of(item) == key) {
        Some(index) => index,
        None => {
            items.push(new(key));
            items.len() - 1
        }
    };
    &mut items[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_lines_envelope() {
        let show = "\n<configuration-output>\nset dynamic-db\nset \"65000 65001\"\n\n</configuration-output>\nset ignored\n";
        let lines: Vec<_> = relative_lines(show).collect();
        assert_eq!(lines, vec!["dynamic-db", "\"65000 65001\""]);
    }

    #[test]
    fn test_relative_lines_without_envelope() {
        let show = "set filter-specific\r\nset then discard\r\n";
        let lines: Vec<_> = relative_lines(show).collect();
        assert_eq!(lines, vec!["filter-specific", "then discard"]);
    }

    #[test]
    fn test_is_empty_output() {
        assert!(is_empty_output(""));
        assert!(is_empty_output("\n\n"));
        assert!(is_empty_output("<configuration-output>\n</configuration-output>\n"));
        assert!(!is_empty_output("set policy-options as-path test \"65000\"\n"));
    }

    #[test]
    fn test_cut_prefix_consumes() {
        let mut line = "if-exceeding burst-size-limit 1m";
        assert!(!cut_prefix(&mut line, "then "));
        assert_eq!(line, "if-exceeding burst-size-limit 1m");
        assert!(cut_prefix(&mut line, "if-exceeding "));
        assert!(cut_prefix(&mut line, "burst-size-limit "));
        assert_eq!(line, "1m");
    }

    #[test]
    fn test_parse_int_error_keeps_token() {
        assert_eq!(parse_int::<u32>("30").unwrap(), 30);
        let err = parse_int::<u32>("3O").unwrap_err();
        assert!(matches!(err, ProviderError::ParseInt { ref value, .. } if value == "3O"));
    }

    #[test]
    fn test_split_word() {
        assert_eq!(
            split_word("\"ftp://h/p a\" password \"x\""),
            ("\"ftp://h/p a\"", "password \"x\"")
        );
        assert_eq!(split_word("ts1 local-ip 10.0.0.0/24"), ("ts1", "local-ip 10.0.0.0/24"));
        assert_eq!(split_word("alone"), ("alone", ""));
        assert_eq!(split_word("\"unterminated"), ("\"unterminated", ""));
    }

    #[test]
    fn test_named_entry_keeps_first_encounter_order() {
        let mut items: Vec<(String, u32)> = Vec::new();
        named_entry(&mut items, "b", |i| i.0.as_str(), |k| (k.to_string(), 0)).1 += 1;
        named_entry(&mut items, "a", |i| i.0.as_str(), |k| (k.to_string(), 0)).1 += 1;
        named_entry(&mut items, "b", |i| i.0.as_str(), |k| (k.to_string(), 0)).1 += 1;
        assert_eq!(items, vec![("b".to_string(), 2), ("a".to_string(), 1)]);
    }
}
