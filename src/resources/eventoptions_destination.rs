use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::jdecode;
use crate::parse::{cut_prefix, named_entry, parse_int, relative_lines, split_word, trim_quotes};
use crate::render::{quoted, ConfigLines};
use crate::resource::Resource;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// `event-options destinations "<name>"`
pub struct EventDestination;

/// Options of an event-options archive destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDestinationOptions {
    /// Destination name.
    pub name: String,
    /// Archive sites, in device order.
    pub archive_site: Vec<ArchiveSite>,
    /// Delay before transferring files, in seconds. Zero is a valid delay.
    pub transfer_delay: Option<u32>,
}

/// One `archive-sites` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSite {
    /// URL of the site.
    pub url: String,
    /// Plain-text password of the site.
    pub password: String,
}

impl Resource for EventDestination {
    type Options = EventDestinationOptions;

    const TYPE_NAME: &'static str = "junos_eventoptions_destination";
    const LABEL: &'static str = "event-options destinations";

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_block(
                "archive_site",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("url", Attribute::required_string())
                        .with_attribute("password", Attribute::optional_string().sensitive()),
                )
                .with_min_items(1),
            )
            .with_attribute(
                "transfer_delay",
                Attribute::optional_int64().with_int_range(0, i64::from(u32::MAX)),
            )
    }

    fn id(options: &EventDestinationOptions) -> String {
        options.name.clone()
    }

    fn config_path(id: &str) -> String {
        format!("event-options destinations {}", quoted(id))
    }

    fn render(options: &EventDestinationOptions) -> Vec<String> {
        let mut lines = ConfigLines::new(Self::config_path(&options.name));
        for site in &options.archive_site {
            let url = quoted(&site.url);
            lines.set(format!("archive-sites {}", url));
            if !site.password.is_empty() {
                lines.set(format!("archive-sites {} password {}", url, quoted(&site.password)));
            }
        }
        lines.set_number("transfer-delay", options.transfer_delay);
        lines.into_lines()
    }

    fn parse(id: &str, show: &str) -> Result<EventDestinationOptions, ProviderError> {
        let mut options = EventDestinationOptions {
            name: id.to_string(),
            ..Default::default()
        };
        for mut item in relative_lines(show) {
            if cut_prefix(&mut item, "archive-sites ") {
                let (url, mut rest) = split_word(item);
                let site = named_entry(
                    &mut options.archive_site,
                    trim_quotes(url),
                    |site| site.url.as_str(),
                    |url| ArchiveSite {
                        url: url.to_string(),
                        ..Default::default()
                    },
                );
                if cut_prefix(&mut rest, "password ") {
                    let password = trim_quotes(rest);
                    site.password = if jdecode::is_encoded(password) {
                        jdecode::decode(password)?
                    } else {
                        password.to_string()
                    };
                }
            } else if cut_prefix(&mut item, "transfer-delay ") {
                options.transfer_delay = Some(parse_int(item)?);
            }
        }
        Ok(options)
    }

    fn validate(options: &EventDestinationOptions) -> Result<(), ProviderError> {
        let mut seen = HashSet::new();
        for site in &options.archive_site {
            if !seen.insert(site.url.as_str()) {
                return Err(ProviderError::Validation(format!(
                    "multiple archive_site blocks with the same url '{}'",
                    site.url
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> EventDestinationOptions {
        EventDestinationOptions {
            name: "x".to_string(),
            archive_site: vec![
                ArchiveSite {
                    url: "ftp://192.0.2.10/logs".to_string(),
                    password: "secret".to_string(),
                },
                ArchiveSite {
                    url: "scp://user@192.0.2.11:/var/tmp".to_string(),
                    password: String::new(),
                },
            ],
            transfer_delay: Some(0),
        }
    }

    #[test]
    fn test_path_quotes_name() {
        assert_eq!(
            EventDestination::render_delete("x"),
            vec![r#"delete event-options destinations "x""#]
        );
    }

    #[test]
    fn test_render() {
        assert_eq!(
            EventDestination::render(&destination()),
            vec![
                r#"set event-options destinations "x" archive-sites "ftp://192.0.2.10/logs""#,
                r#"set event-options destinations "x" archive-sites "ftp://192.0.2.10/logs" password "secret""#,
                r#"set event-options destinations "x" archive-sites "scp://user@192.0.2.11:/var/tmp""#,
                r#"set event-options destinations "x" transfer-delay 0"#,
            ]
        );
    }

    #[test]
    fn test_parse_merges_sites_by_url() {
        let show = "\
<configuration-output>
set archive-sites \"ftp://192.0.2.10/logs\"
set archive-sites \"scp://user@192.0.2.11:/var/tmp\"
set archive-sites \"ftp://192.0.2.10/logs\" password \"secret\"
set transfer-delay 0
</configuration-output>
";
        assert_eq!(EventDestination::parse("x", show).unwrap(), destination());
    }

    #[test]
    fn test_parse_decodes_password() {
        let show = "set archive-sites \"ftp://192.0.2.10/logs\" password \"$9$HmQntpBEhrtuRSylXx\"\n";
        let parsed = EventDestination::parse("x", show).unwrap();
        assert_eq!(parsed.archive_site[0].password, "secret");

        let show = "set archive-sites \"ftp://192.0.2.10/logs\" password \"$9$\"\n";
        assert!(matches!(
            EventDestination::parse("x", show),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_duplicate_urls_rejected() {
        let mut options = destination();
        options.archive_site[1].url = options.archive_site[0].url.clone();
        assert!(matches!(
            EventDestination::validate(&options),
            Err(ProviderError::Validation(_))
        ));
        assert!(EventDestination::validate(&destination()).is_ok());
    }
}
