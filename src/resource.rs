//! The resource descriptor trait.
//!
//! A descriptor is everything that differs between two resource types: the
//! object path, how options become `set` lines and how relative show output
//! becomes options again. The lifecycle around it is shared and lives in
//! [`crate::crud`].

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProviderError;
use crate::render::delete_line;
use crate::schema::Schema;

/// A Junos configuration object managed as one resource.
///
/// `Options` is the typed in-memory form of the object. It doubles as the
/// resource state through serde, so it must accept the state JSON produced
/// from it (the extra `id` key is ignored).
pub trait Resource: Send + Sync + 'static {
    /// Typed options of one object.
    type Options: Serialize + DeserializeOwned + Default + Clone + Debug + PartialEq + Send + Sync;

    /// Resource type name, e.g. `junos_policyoptions_as_path`.
    const TYPE_NAME: &'static str;

    /// Human label used in messages, e.g. `policy-options as-path`.
    const LABEL: &'static str;

    /// Schema used for validation and planning.
    fn schema() -> Schema;

    /// Identity of the object (the resource id).
    fn id(options: &Self::Options) -> String;

    /// Configuration path of the object with the given id.
    fn config_path(id: &str) -> String;

    /// Render the `set` lines creating the object.
    fn render(options: &Self::Options) -> Vec<String>;

    /// Render the lines removing the object.
    fn render_delete(id: &str) -> Vec<String> {
        vec![delete_line(&Self::config_path(id))]
    }

    /// Parse `display set relative` output of the object.
    fn parse(id: &str, show: &str) -> Result<Self::Options, ProviderError>;

    /// Checks the schema cannot express.
    fn validate(options: &Self::Options) -> Result<(), ProviderError> {
        let _ = options;
        Ok(())
    }
}

/// Map options to state JSON, adding the `id` key.
pub fn to_state<R: Resource>(options: &R::Options) -> Result<serde_json::Value, ProviderError> {
    let mut state = serde_json::to_value(options)?;
    if let serde_json::Value::Object(map) = &mut state {
        map.insert("id".to_string(), serde_json::Value::String(R::id(options)));
    }
    Ok(state)
}

/// Map state JSON to options.
///
/// Nulls are dropped first so unset attributes fall back to their zero value.
pub fn from_state<R: Resource>(mut state: serde_json::Value) -> Result<R::Options, ProviderError> {
    strip_nulls(&mut state);
    Ok(serde_json::from_value(state)?)
}

fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Describe the object for messages: `<label> <id>`.
pub fn describe<R: Resource>(id: &str) -> String {
    format!("{} {}", R::LABEL, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{AsPath, AsPathOptions, EventDestination};
    use serde_json::json;

    #[test]
    fn test_state_carries_id() {
        let options = AsPathOptions {
            name: "test".to_string(),
            dynamic_db: true,
            ..Default::default()
        };
        let state = to_state::<AsPath>(&options).unwrap();
        assert_eq!(state["id"], "test");
        assert_eq!(from_state::<AsPath>(state).unwrap(), options);
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let options = from_state::<EventDestination>(json!({
            "name": "x",
            "transfer_delay": null,
            "archive_site": [{"url": "ftp://a/", "password": null}]
        }))
        .unwrap();
        assert_eq!(options.transfer_delay, None);
        assert_eq!(options.archive_site[0].password, "");
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let err = from_state::<AsPath>(json!({"name": "x", "dynamic_db": "yes"})).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe::<AsPath>("test"), "policy-options as-path test");
        assert_eq!(
            EventDestination::render_delete("x"),
            vec![r#"delete event-options destinations "x""#]
        );
    }
}
