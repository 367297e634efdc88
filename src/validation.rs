//! Schema validation run before any device session is opened.
//!
//! Resource state arrives as `serde_json::Value`; this module checks it
//! against a [`Schema`] and reports every problem as a [`Diagnostic`]. Besides
//! types, required attributes and block cardinality it enforces the
//! constraints Junos statements impose on their arguments: mutually
//! exclusive fields, keyword-only values and integer ranges.
//!
//! # Example
//!
//! ```
//! use junos_provider::schema::{Attribute, Schema};
//! use junos_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "df_bit",
//!         Attribute::optional_string().with_valid_values(["clear", "copy", "set"]),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "vpn1", "df_bit": "copy"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "vpn1", "df_bit": "keep"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("df_bit".to_string()));
//! ```

use serde_json::Value;

use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut walker = Walker {
        root: value,
        diagnostics: &mut diagnostics,
    };
    walker.block(&schema.block, value, "");
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Whether a value counts as configured: null, empty strings, `false` and
/// empty lists are the zero values of an unset attribute.
pub fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

/// Resolve an absolute dotted path (`ike.identity_local`, `rule.0.name`).
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

struct Walker<'a> {
    root: &'a Value,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Walker<'_> {
    fn block(&mut self, block: &Block, value: &Value, path: &str) {
        let obj = match value {
            Value::Object(map) => map,
            Value::Null => return,
            _ => {
                let diag = Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)));
                self.diagnostics.push(if path.is_empty() {
                    diag
                } else {
                    diag.with_attribute(path)
                });
                return;
            }
        };

        for (name, attr) in &block.attributes {
            let attr_path = join_path(path, name);
            self.attribute(attr, obj.get(name), &attr_path);
        }

        for (name, nested) in &block.blocks {
            let block_path = join_path(path, name);
            let block_value = obj.get(name);
            if let Some(v) = block_value.filter(|v| is_set(v)) {
                self.conflicts(&nested.conflicts_with, v, &block_path);
            }
            self.nested(nested, block_value, &block_path);
        }
    }

    fn attribute(&mut self, attr: &Attribute, value: Option<&Value>, path: &str) {
        if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
            return;
        }

        let value = match value {
            None | Some(Value::Null) => {
                if attr.flags.required {
                    self.diagnostics.push(
                        Diagnostic::error(format!("Missing required attribute '{}'", path))
                            .with_detail("This attribute is required and must be provided")
                            .with_attribute(path),
                    );
                }
                return;
            }
            Some(v) => v,
        };

        if !self.attribute_type(&attr.attr_type, value, path) {
            return;
        }
        if is_set(value) {
            self.conflicts(&attr.conflicts_with, value, path);
        }

        if let (false, Some(s)) = (attr.valid_values.is_empty(), value.as_str()) {
            if !s.is_empty() && !attr.valid_values.iter().any(|v| v == s) {
                self.diagnostics.push(
                    Diagnostic::error(format!("Invalid value '{}' for attribute '{}'", s, path))
                        .with_detail(format!("Expected one of: {}", attr.valid_values.join(", ")))
                        .with_attribute(path),
                );
            }
        }

        if let (Some((min, max)), Some(n)) = (attr.int_range, value.as_i64()) {
            if n < min || n > max {
                self.diagnostics.push(
                    Diagnostic::error(format!("Value {} out of range for attribute '{}'", n, path))
                        .with_detail(format!("Expected a value between {} and {}", min, max))
                        .with_attribute(path),
                );
            }
        }
    }

    /// Returns false when a type error was reported.
    fn attribute_type(&mut self, attr_type: &AttributeType, value: &Value, path: &str) -> bool {
        let ok = match attr_type {
            AttributeType::String => value.is_string(),
            AttributeType::Int64 => value.is_i64() || value.is_u64(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List(element_type) => match value.as_array() {
                Some(items) => {
                    let before = self.diagnostics.len();
                    for (i, item) in items.iter().enumerate() {
                        self.attribute_type(element_type, item, &format!("{}.{}", path, i));
                    }
                    return self.diagnostics.len() == before;
                }
                None => false,
            },
        };
        if !ok {
            self.diagnostics.push(type_error(path, type_name(attr_type), value));
        }
        ok
    }

    fn conflicts(&mut self, conflicts_with: &[String], value: &Value, path: &str) {
        debug_assert!(is_set(value));
        for other in conflicts_with {
            if lookup(self.root, other).is_some_and(is_set) {
                self.diagnostics.push(
                    Diagnostic::error(format!("'{}' conflicts with '{}'", path, other))
                        .with_detail("Only one of these attributes can be set")
                        .with_attribute(path),
                );
            }
        }
    }

    fn nested(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &str) {
        match (nested.nesting_mode, value) {
            (_, None | Some(Value::Null)) => {
                if nested.min_items > 0 {
                    self.diagnostics.push(
                        Diagnostic::error(format!(
                            "Block '{}' requires at least {} item(s)",
                            path, nested.min_items
                        ))
                        .with_attribute(path),
                    );
                }
            }
            (BlockNestingMode::Single, Some(v)) => self.block(&nested.block, v, path),
            (BlockNestingMode::List, Some(Value::Array(items))) => {
                let len = items.len() as u32;
                if len < nested.min_items {
                    self.diagnostics.push(
                        Diagnostic::error(format!(
                            "Block '{}' requires at least {} item(s), got {}",
                            path, nested.min_items, len
                        ))
                        .with_attribute(path),
                    );
                }
                if nested.max_items > 0 && len > nested.max_items {
                    self.diagnostics.push(
                        Diagnostic::error(format!(
                            "Block '{}' allows at most {} item(s), got {}",
                            path, nested.max_items, len
                        ))
                        .with_attribute(path),
                    );
                }
                for (i, item) in items.iter().enumerate() {
                    self.block(&nested.block, item, &format!("{}.{}", path, i));
                }
            }
            (BlockNestingMode::List, Some(v)) => {
                self.diagnostics.push(
                    Diagnostic::error(format!("Expected list for block '{}'", path))
                        .with_detail(format!("Got {}", value_type_name(v)))
                        .with_attribute(path),
                );
            }
        }
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn type_name(attr_type: &AttributeType) -> &'static str {
    match attr_type {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
