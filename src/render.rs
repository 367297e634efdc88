//! Rendering of Junos `set`/`delete` statements.
//!
//! Every resource renders against a fixed object path. Lines come out in the
//! order they are pushed, which is the order attributes are declared in; some
//! Junos statements rely on an earlier line creating the named container.

/// Keyword prefix of a configuration statement.
pub const SET: &str = "set ";
/// Keyword prefix of a removal statement.
pub const DELETE: &str = "delete ";

/// Wrap a value in double quotes.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

/// An ordered batch of statements rooted at one object path.
///
/// ```
/// use junos_provider::render::{quoted, ConfigLines};
///
/// let mut lines = ConfigLines::new("policy-options as-path test");
/// lines.set_flag(false, "dynamic-db");
/// lines.set(quoted("65000 65001"));
/// assert_eq!(
///     lines.into_lines(),
///     vec![r#"set policy-options as-path test "65000 65001""#.to_string()]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLines {
    set_prefix: String,
    lines: Vec<String>,
}

impl ConfigLines {
    /// Start a batch for the object at `path`.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            set_prefix: format!("{}{} ", SET, path.as_ref()),
            lines: Vec::new(),
        }
    }

    /// Emit `set <path> <suffix>`.
    pub fn set(&mut self, suffix: impl AsRef<str>) {
        self.lines.push(format!("{}{}", self.set_prefix, suffix.as_ref()));
    }

    /// Emit `set <path> <keyword>` when `enabled`.
    pub fn set_flag(&mut self, enabled: bool, keyword: &str) {
        if enabled {
            self.set(keyword);
        }
    }

    /// Emit `set <path> <keyword> <value>` when `value` is not empty.
    pub fn set_value(&mut self, keyword: &str, value: &str) {
        if !value.is_empty() {
            self.set(format!("{} {}", keyword, value));
        }
    }

    /// Emit `set <path> <keyword> <value>` for a present number.
    pub fn set_number<T: std::fmt::Display>(&mut self, keyword: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(format!("{} {}", keyword, v));
        }
    }

    /// Number of lines rendered so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line was rendered.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consume the batch.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Render `delete <path>`.
pub fn delete_line(path: &str) -> String {
    format!("{}{}", DELETE, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_push_order() {
        let mut lines = ConfigLines::new("firewall policer p1");
        lines.set_flag(true, "filter-specific");
        lines.set_value("if-exceeding bandwidth-limit", "10m");
        lines.set_value("if-exceeding burst-size-limit", "1m");
        assert_eq!(
            lines.into_lines(),
            vec![
                "set firewall policer p1 filter-specific",
                "set firewall policer p1 if-exceeding bandwidth-limit 10m",
                "set firewall policer p1 if-exceeding burst-size-limit 1m",
            ]
        );
    }

    #[test]
    fn test_empty_values_render_nothing() {
        let mut lines = ConfigLines::new("firewall policer p1");
        lines.set_flag(false, "filter-specific");
        lines.set_value("then forwarding-class", "");
        lines.set_number::<u32>("if-exceeding bandwidth-percent", None);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_zero_number_is_rendered() {
        let mut lines = ConfigLines::new(r#"event-options destinations "x""#);
        lines.set_number("transfer-delay", Some(0u32));
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines.into_lines()[0],
            r#"set event-options destinations "x" transfer-delay 0"#
        );
    }

    #[test]
    fn test_delete_line() {
        assert_eq!(
            delete_line(r#"event-options destinations "x""#),
            r#"delete event-options destinations "x""#
        );
    }
}
