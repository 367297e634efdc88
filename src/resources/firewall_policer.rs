use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::parse::{cut_prefix, parse_int, relative_lines};
use crate::render::ConfigLines;
use crate::resource::Resource;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// `firewall policer <name>`
pub struct FirewallPolicer;

/// Options of a firewall policer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicerOptions {
    /// Policer name.
    pub name: String,
    /// Instantiate a separate policer per filter term.
    pub filter_specific: bool,
    /// Policer uses logical interface bandwidth.
    pub logical_bandwidth_policer: bool,
    /// Policer is a logical interface policer.
    pub logical_interface_policer: bool,
    /// Policer is a physical interface policer.
    pub physical_interface_policer: bool,
    /// Share bandwidth across the bundle members.
    pub shared_bandwidth_policer: bool,
    /// Bandwidth based thresholds.
    pub if_exceeding: Option<IfExceeding>,
    /// Packet rate based thresholds.
    pub if_exceeding_pps: Option<IfExceedingPps>,
    /// Action taken on out-of-profile traffic.
    pub then: Option<PolicerThen>,
}

/// `if-exceeding` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfExceeding {
    /// Bandwidth limit in bits per second (`10m`, `1g`...).
    pub bandwidth_limit: String,
    /// Bandwidth limit as a percentage of the interface speed.
    pub bandwidth_percent: Option<u32>,
    /// Burst size limit in bytes.
    pub burst_size_limit: String,
}

/// `if-exceeding-pps` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfExceedingPps {
    /// Packets per second.
    pub pps_limit: String,
    /// Burst size in packets.
    pub packet_burst: String,
}

/// `then` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicerThen {
    /// Drop the traffic.
    pub discard: bool,
    /// Reclassify into this forwarding class.
    pub forwarding_class: String,
    /// Set the packet loss priority.
    pub loss_priority: String,
    /// Mark the traffic out of profile.
    pub out_of_profile: bool,
}

const LOSS_PRIORITIES: [&str; 4] = ["high", "low", "medium-high", "medium-low"];

impl Resource for FirewallPolicer {
    type Options = PolicerOptions;

    const TYPE_NAME: &'static str = "junos_firewall_policer";
    const LABEL: &'static str = "firewall policer";

    fn schema() -> Schema {
        let if_exceeding = Block::new()
            .with_attribute(
                "bandwidth_limit",
                Attribute::optional_string().with_conflicts(["if_exceeding.bandwidth_percent"]),
            )
            .with_attribute(
                "bandwidth_percent",
                Attribute::optional_int64()
                    .with_int_range(1, 100)
                    .with_conflicts(["if_exceeding.bandwidth_limit"]),
            )
            .with_attribute("burst_size_limit", Attribute::required_string());
        let if_exceeding_pps = Block::new()
            .with_attribute("pps_limit", Attribute::required_string())
            .with_attribute("packet_burst", Attribute::required_string());
        let then = Block::new()
            .with_attribute(
                "discard",
                Attribute::optional_bool()
                    .with_conflicts(["then.forwarding_class", "then.loss_priority"]),
            )
            .with_attribute("forwarding_class", Attribute::optional_string())
            .with_attribute(
                "loss_priority",
                Attribute::optional_string().with_valid_values(LOSS_PRIORITIES),
            )
            .with_attribute("out_of_profile", Attribute::optional_bool());

        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("filter_specific", Attribute::optional_bool())
            .with_attribute("logical_bandwidth_policer", Attribute::optional_bool())
            .with_attribute("logical_interface_policer", Attribute::optional_bool())
            .with_attribute("physical_interface_policer", Attribute::optional_bool())
            .with_attribute("shared_bandwidth_policer", Attribute::optional_bool())
            .with_block(
                "if_exceeding",
                NestedBlock::single(if_exceeding).with_conflicts(["if_exceeding_pps"]),
            )
            .with_block(
                "if_exceeding_pps",
                NestedBlock::single(if_exceeding_pps).with_conflicts(["if_exceeding"]),
            )
            .with_block("then", NestedBlock::single(then))
    }

    fn id(options: &PolicerOptions) -> String {
        options.name.clone()
    }

    fn config_path(id: &str) -> String {
        format!("firewall policer {}", id)
    }

    fn render(options: &PolicerOptions) -> Vec<String> {
        let mut lines = ConfigLines::new(Self::config_path(&options.name));
        lines.set_flag(options.filter_specific, "filter-specific");
        if let Some(limits) = &options.if_exceeding {
            lines.set_value("if-exceeding bandwidth-limit", &limits.bandwidth_limit);
            lines.set_number("if-exceeding bandwidth-percent", limits.bandwidth_percent);
            lines.set_value("if-exceeding burst-size-limit", &limits.burst_size_limit);
        }
        if let Some(limits) = &options.if_exceeding_pps {
            lines.set_value("if-exceeding-pps pps-limit", &limits.pps_limit);
            lines.set_value("if-exceeding-pps packet-burst", &limits.packet_burst);
        }
        lines.set_flag(options.logical_bandwidth_policer, "logical-bandwidth-policer");
        lines.set_flag(options.logical_interface_policer, "logical-interface-policer");
        lines.set_flag(options.physical_interface_policer, "physical-interface-policer");
        lines.set_flag(options.shared_bandwidth_policer, "shared-bandwidth-policer");
        if let Some(then) = &options.then {
            lines.set_flag(then.discard, "then discard");
            lines.set_value("then forwarding-class", &then.forwarding_class);
            lines.set_value("then loss-priority", &then.loss_priority);
            lines.set_flag(then.out_of_profile, "then out-of-profile");
        }
        lines.into_lines()
    }

    fn parse(id: &str, show: &str) -> Result<PolicerOptions, ProviderError> {
        let mut options = PolicerOptions {
            name: id.to_string(),
            ..Default::default()
        };
        for mut item in relative_lines(show) {
            if cut_prefix(&mut item, "if-exceeding-pps ") {
                let limits = options.if_exceeding_pps.get_or_insert_with(Default::default);
                if cut_prefix(&mut item, "pps-limit ") {
                    limits.pps_limit = item.to_string();
                } else if cut_prefix(&mut item, "packet-burst ") {
                    limits.packet_burst = item.to_string();
                }
            } else if cut_prefix(&mut item, "if-exceeding ") {
                let limits = options.if_exceeding.get_or_insert_with(Default::default);
                if cut_prefix(&mut item, "bandwidth-limit ") {
                    limits.bandwidth_limit = item.to_string();
                } else if cut_prefix(&mut item, "bandwidth-percent ") {
                    limits.bandwidth_percent = Some(parse_int(item)?);
                } else if cut_prefix(&mut item, "burst-size-limit ") {
                    limits.burst_size_limit = item.to_string();
                }
            } else if cut_prefix(&mut item, "then ") {
                let then = options.then.get_or_insert_with(Default::default);
                match item {
                    "discard" => then.discard = true,
                    "out-of-profile" => then.out_of_profile = true,
                    _ => {
                        if cut_prefix(&mut item, "forwarding-class ") {
                            then.forwarding_class = item.to_string();
                        } else if cut_prefix(&mut item, "loss-priority ") {
                            then.loss_priority = item.to_string();
                        }
                    }
                }
            } else {
                match item {
                    "filter-specific" => options.filter_specific = true,
                    "logical-bandwidth-policer" => options.logical_bandwidth_policer = true,
                    "logical-interface-policer" => options.logical_interface_policer = true,
                    "physical-interface-policer" => options.physical_interface_policer = true,
                    "shared-bandwidth-policer" => options.shared_bandwidth_policer = true,
                    _ => {}
                }
            }
        }
        Ok(options)
    }

    fn validate(options: &PolicerOptions) -> Result<(), ProviderError> {
        if options.if_exceeding.is_none() && options.if_exceeding_pps.is_none() {
            return Err(ProviderError::Validation(format!(
                "one of if_exceeding or if_exceeding_pps must be set on {} {}",
                Self::LABEL,
                options.name
            )));
        }
        if options.then.as_ref() == Some(&PolicerThen::default()) {
            return Err(ProviderError::Validation(format!(
                "then block of {} {} needs at least one action",
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
    use crate::validation::validate;
    use serde_json::json;

    fn full_policer() -> PolicerOptions {
        PolicerOptions {
            name: "p1".to_string(),
            filter_specific: true,
            shared_bandwidth_policer: true,
            if_exceeding: Some(IfExceeding {
                bandwidth_percent: Some(20),
                burst_size_limit: "15k".to_string(),
                ..Default::default()
            }),
            then: Some(PolicerThen {
                forwarding_class: "best-effort".to_string(),
                loss_priority: "high".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_burst_only() {
        let options = PolicerOptions {
            name: "p1".to_string(),
            if_exceeding: Some(IfExceeding {
                burst_size_limit: "1m".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            FirewallPolicer::render(&options),
            vec!["set firewall policer p1 if-exceeding burst-size-limit 1m"]
        );
    }

    #[test]
    fn test_render_full() {
        assert_eq!(
            FirewallPolicer::render(&full_policer()),
            vec![
                "set firewall policer p1 filter-specific",
                "set firewall policer p1 if-exceeding bandwidth-percent 20",
                "set firewall policer p1 if-exceeding burst-size-limit 15k",
                "set firewall policer p1 shared-bandwidth-policer",
                "set firewall policer p1 then forwarding-class best-effort",
                "set firewall policer p1 then loss-priority high",
            ]
        );
    }

    #[test]
    fn test_parse_nested_blocks() {
        let show = "\
set filter-specific
set if-exceeding bandwidth-percent 20
set if-exceeding burst-size-limit 15k
set shared-bandwidth-policer
set then forwarding-class best-effort
set then loss-priority high
";
        assert_eq!(FirewallPolicer::parse("p1", show).unwrap(), full_policer());
    }

    #[test]
    fn test_parse_pps_block() {
        let show = "set if-exceeding-pps pps-limit 10k\nset if-exceeding-pps packet-burst 100\nset then discard\n";
        let parsed = FirewallPolicer::parse("p2", show).unwrap();
        assert!(parsed.if_exceeding.is_none());
        assert_eq!(
            parsed.if_exceeding_pps,
            Some(IfExceedingPps {
                pps_limit: "10k".to_string(),
                packet_burst: "100".to_string(),
            })
        );
        assert!(parsed.then.unwrap().discard);
    }

    #[test]
    fn test_parse_bad_percent() {
        let show = "set if-exceeding bandwidth-percent twenty\n";
        let err = FirewallPolicer::parse("p1", show).unwrap_err();
        assert!(err.to_string().contains("'twenty'"));
    }

    #[test]
    fn test_schema_rejects_both_thresholds() {
        let state = json!({
            "name": "p1",
            "if_exceeding": {"burst_size_limit": "1m"},
            "if_exceeding_pps": {"pps_limit": "10k", "packet_burst": "100"}
        });
        let diagnostics = validate(&FirewallPolicer::schema(), &state);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.summary.contains("conflicts with")));
    }

    #[test]
    fn test_empty_then_rejected() {
        let mut options = full_policer();
        options.then = Some(PolicerThen::default());
        let err = FirewallPolicer::validate(&options).unwrap_err();
        assert!(err.to_string().contains("needs at least one action"));

        options.then = Some(PolicerThen {
            out_of_profile: true,
            ..Default::default()
        });
        assert!(FirewallPolicer::validate(&options).is_ok());
    }

    #[test]
    fn test_schema_percent_range() {
        let state = json!({
            "name": "p1",
            "if_exceeding": {"bandwidth_percent": 150, "burst_size_limit": "1m"}
        });
        let diagnostics = validate(&FirewallPolicer::schema(), &state);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("out of range"));
    }
}
