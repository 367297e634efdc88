use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::parse::{cut_prefix, relative_lines, trim_quotes};
use crate::render::{quoted, ConfigLines};
use crate::resource::Resource;
use crate::schema::{Attribute, Schema};

/// `policy-options community <name>`
pub struct Community;

/// Options of a BGP community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityOptions {
    /// Community name.
    pub name: String,
    /// Community members, in device order.
    pub members: Vec<String>,
    /// Invert the result of the match.
    pub invert_match: bool,
    /// Take the members from the dynamic database.
    pub dynamic_db: bool,
}

impl Resource for Community {
    type Options = CommunityOptions;

    const TYPE_NAME: &'static str = "junos_policyoptions_community";
    const LABEL: &'static str = "policy-options community";

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("members", Attribute::optional_string_list())
            .with_attribute("invert_match", Attribute::optional_bool())
            .with_attribute("dynamic_db", Attribute::optional_bool())
    }

    fn id(options: &CommunityOptions) -> String {
        options.name.clone()
    }

    fn config_path(id: &str) -> String {
        format!("policy-options community {}", id)
    }

    fn render(options: &CommunityOptions) -> Vec<String> {
        let mut lines = ConfigLines::new(Self::config_path(&options.name));
        lines.set_flag(options.dynamic_db, "dynamic-db");
        lines.set_flag(options.invert_match, "invert-match");
        for member in &options.members {
            lines.set(format!("members {}", quoted(member)));
        }
        lines.into_lines()
    }

    fn parse(id: &str, show: &str) -> Result<CommunityOptions, ProviderError> {
        let mut options = CommunityOptions {
            name: id.to_string(),
            ..Default::default()
        };
        for mut item in relative_lines(show) {
            match item {
                "dynamic-db" => options.dynamic_db = true,
                "invert-match" => options.invert_match = true,
                _ => {
                    if cut_prefix(&mut item, "members ") {
                        options.members.push(trim_quotes(item).to_string());
                    }
                }
            }
        }
        Ok(options)
    }

    fn validate(options: &CommunityOptions) -> Result<(), ProviderError> {
        if options.members.is_empty() && !options.dynamic_db {
            return Err(ProviderError::Validation(format!(
                "one of members or dynamic_db must be set on {} {}",
                Self::LABEL,
                options.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_members_in_order() {
        let options = CommunityOptions {
            name: "customers".to_string(),
            members: vec!["65000:100".to_string(), "^65001:.*$".to_string()],
            invert_match: true,
            dynamic_db: false,
        };
        assert_eq!(
            Community::render(&options),
            vec![
                "set policy-options community customers invert-match",
                r#"set policy-options community customers members "65000:100""#,
                r#"set policy-options community customers members "^65001:.*$""#,
            ]
        );
    }

    #[test]
    fn test_parse_skips_unknown_lines() {
        let show = "set invert-match\nset members 65000:100\nset members \"^65001:.*$\"\nset future-knob\n";
        let parsed = Community::parse("customers", show).unwrap();
        assert_eq!(parsed.members, vec!["65000:100", "^65001:.*$"]);
        assert!(parsed.invert_match);
        assert!(!parsed.dynamic_db);
    }
}
