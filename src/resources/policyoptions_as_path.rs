use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::parse::{relative_lines, trim_quotes};
use crate::render::{quoted, ConfigLines};
use crate::resource::Resource;
use crate::schema::{Attribute, Schema};

/// `policy-options as-path <name>`
pub struct AsPath;

/// Options of an AS path regular expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsPathOptions {
    /// AS path name.
    pub name: String,
    /// Regular expression, quoted on the device.
    pub path: String,
    /// Take the expression from the dynamic database.
    pub dynamic_db: bool,
}

impl Resource for AsPath {
    type Options = AsPathOptions;

    const TYPE_NAME: &'static str = "junos_policyoptions_as_path";
    const LABEL: &'static str = "policy-options as-path";

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Name of the AS path"),
            )
            .with_attribute(
                "path",
                Attribute::optional_string().with_description("Regular expression for the AS path"),
            )
            .with_attribute("dynamic_db", Attribute::optional_bool())
    }

    fn id(options: &AsPathOptions) -> String {
        options.name.clone()
    }

    fn config_path(id: &str) -> String {
        format!("policy-options as-path {}", id)
    }

    fn render(options: &AsPathOptions) -> Vec<String> {
        let mut lines = ConfigLines::new(Self::config_path(&options.name));
        lines.set_flag(options.dynamic_db, "dynamic-db");
        if !options.path.is_empty() {
            lines.set(quoted(&options.path));
        }
        lines.into_lines()
    }

    fn parse(id: &str, show: &str) -> Result<AsPathOptions, ProviderError> {
        let mut options = AsPathOptions {
            name: id.to_string(),
            ..Default::default()
        };
        for item in relative_lines(show) {
            match item {
                "dynamic-db" => options.dynamic_db = true,
                _ => options.path = trim_quotes(item).to_string(),
            }
        }
        Ok(options)
    }

    fn validate(options: &AsPathOptions) -> Result<(), ProviderError> {
        if options.path.is_empty() && !options.dynamic_db {
            return Err(ProviderError::Validation(format!(
                "one of path or dynamic_db must be set on {} {}",
                Self::LABEL,
                options.name
            )));
        }
        Ok(())
    }
}
