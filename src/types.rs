//! Result types shared by the orchestrator and the provider surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{Diagnostic, Schema};

/// A change to a single top-level attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Compare prior and proposed state attribute by attribute.
    ///
    /// Updates are full replacements of the object's statements, so the
    /// plan only needs to know which attributes differ and whether one of
    /// them is the identity.
    pub fn diff(schema: &Schema, prior: Option<&Value>, proposed: Value) -> Self {
        let Some(prior) = prior.filter(|p| !p.is_null()) else {
            let changes = object_keys(&proposed)
                .filter(|key| *key != "id")
                .map(|key| AttributeChange::new(key, None, proposed.get(key).cloned()))
                .collect();
            return Self {
                planned_state: proposed,
                changes,
                requires_replace: false,
            };
        };

        if proposed.is_null() {
            let changes = object_keys(prior)
                .filter(|key| *key != "id")
                .filter(|key| normalized(prior.get(*key)).is_some())
                .map(|key| AttributeChange::new(key, prior.get(key).cloned(), None))
                .collect();
            return Self {
                planned_state: Value::Null,
                changes,
                requires_replace: false,
            };
        }

        let mut keys: Vec<&str> = object_keys(prior).chain(object_keys(&proposed)).collect();
        keys.sort_unstable();
        keys.dedup();

        let changes: Vec<AttributeChange> = keys
            .into_iter()
            .filter(|key| *key != "id")
            .filter(|key| normalized(prior.get(*key)) != normalized(proposed.get(*key)))
            .map(|key| {
                AttributeChange::new(key, prior.get(key).cloned(), proposed.get(key).cloned())
            })
            .collect();
        let requires_replace = schema
            .force_new_attributes()
            .any(|name| changes.iter().any(|c| c.path == name));

        let mut planned_state = proposed;
        if let (Some(id), Value::Object(map)) = (prior.get("id"), &mut planned_state) {
            if !requires_replace {
                map.insert("id".to_string(), id.clone());
            }
        }
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

fn object_keys(value: &Value) -> impl Iterator<Item = &str> {
    value
        .as_object()
        .into_iter()
        .flat_map(|map| map.keys().map(String::as_str))
}

// Absent and null are the same thing in state.
fn normalized(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// A successful operation and the warnings it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    /// The operation's result.
    pub value: T,
    /// Non-fatal diagnostics (commit warnings).
    pub warnings: Vec<Diagnostic>,
}

impl<T> Applied<T> {
    /// A result without warnings.
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// A result with warnings.
    pub fn with_warnings(value: T, warnings: Vec<Diagnostic>) -> Self {
        Self { value, warnings }
    }

    /// Transform the value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the registered resource type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("dynamic_db", Attribute::optional_bool())
    }

    #[test]
    fn test_plan_create_lists_attributes() {
        let plan = PlanResult::diff(&schema(), None, json!({"name": "test", "path": "65000"}));
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.before.is_none()));
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_plan_update_in_place_keeps_id() {
        let prior = json!({"id": "test", "name": "test", "path": "65000", "dynamic_db": false});
        let plan = PlanResult::diff(
            &schema(),
            Some(&prior),
            json!({"name": "test", "path": "65001", "dynamic_db": false}),
        );
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "path");
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["id"], "test");
    }

    #[test]
    fn test_plan_rename_requires_replace() {
        let prior = json!({"id": "a", "name": "a", "path": "65000"});
        let plan = PlanResult::diff(&schema(), Some(&prior), json!({"name": "b", "path": "65000"}));
        assert!(plan.requires_replace);
        assert!(plan.planned_state.get("id").is_none());
    }

    #[test]
    fn test_plan_delete_does_not_replace() {
        let prior = json!({"id": "a", "name": "a", "path": "65000", "dynamic_db": null});
        let plan = PlanResult::diff(&schema(), Some(&prior), Value::Null);
        assert!(!plan.requires_replace);
        assert!(plan.planned_state.is_null());
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_plan_null_equals_absent() {
        let prior = json!({"id": "a", "name": "a", "path": null});
        let plan = PlanResult::diff(&schema(), Some(&prior), json!({"name": "a"}));
        assert!(plan.changes.is_empty());
        assert_eq!(plan, PlanResult::no_change(json!({"id": "a", "name": "a"})));
    }

    #[test]
    fn test_applied_map_keeps_warnings() {
        let applied = Applied::with_warnings(1, vec![Diagnostic::warning("w")]).map(|v| v + 1);
        assert_eq!(applied.value, 2);
        assert_eq!(applied.warnings.len(), 1);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("junos_firewall_policer", json!({"id": "p1"}));
        assert_eq!(imported.resource_type, "junos_firewall_policer");
        assert_eq!(imported.state["id"], "p1");
    }
}
