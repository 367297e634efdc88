use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::parse::{cut_prefix, named_entry, relative_lines, split_word};
use crate::render::ConfigLines;
use crate::resource::Resource;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// `security ipsec vpn <name>`
pub struct IpsecVpn;

/// Options of an IPsec VPN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsecVpnOptions {
    /// VPN name.
    pub name: String,
    /// Tunnel interface bound to the VPN.
    pub bind_interface: String,
    /// Copy the outer DSCP field to the inner header.
    pub copy_outer_dscp: bool,
    /// Don't-fragment bit handling: `clear`, `copy` or `set`.
    pub df_bit: String,
    /// `immediately` or `on-traffic`.
    pub establish_tunnels: String,
    /// IKE keyed VPN settings.
    pub ike: Option<VpnIke>,
    /// Traffic selectors, in device order.
    pub traffic_selector: Vec<TrafficSelector>,
    /// Dead peer monitoring.
    pub vpn_monitor: Option<VpnMonitor>,
}

/// `ike` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnIke {
    /// IKE gateway name.
    pub gateway: String,
    /// IPsec policy name.
    pub policy: String,
    /// Local proxy identity prefix.
    pub identity_local: String,
    /// Remote proxy identity prefix.
    pub identity_remote: String,
    /// Proxy identity service.
    pub identity_service: String,
}

/// `traffic-selector <name>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficSelector {
    /// Selector name.
    pub name: String,
    /// Local prefix.
    pub local_ip: String,
    /// Remote prefix.
    pub remote_ip: String,
}

/// `vpn-monitor` block. All fields may be empty: the bare statement
/// enables monitoring with device defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnMonitor {
    /// Address pinged through the tunnel.
    pub destination_ip: String,
    /// Only monitor when there is no traffic.
    pub optimized: bool,
    /// Source interface of the pings.
    pub source_interface: String,
}

const IDENTITY_PATHS: [&str; 3] = [
    "ike.identity_local",
    "ike.identity_remote",
    "ike.identity_service",
];

impl Resource for IpsecVpn {
    type Options = IpsecVpnOptions;

    const TYPE_NAME: &'static str = "junos_security_ipsec_vpn";
    const LABEL: &'static str = "security ipsec vpn";

    fn schema() -> Schema {
        let identity = || Attribute::optional_string().with_conflicts(["traffic_selector"]);
        let ike = Block::new()
            .with_attribute("gateway", Attribute::required_string())
            .with_attribute("policy", Attribute::optional_string())
            .with_attribute("identity_local", identity())
            .with_attribute("identity_remote", identity())
            .with_attribute("identity_service", identity());
        let traffic_selector = Block::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("local_ip", Attribute::required_string())
            .with_attribute("remote_ip", Attribute::required_string());
        let vpn_monitor = Block::new()
            .with_attribute("destination_ip", Attribute::optional_string())
            .with_attribute("optimized", Attribute::optional_bool())
            .with_attribute("source_interface", Attribute::optional_string());

        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("bind_interface", Attribute::optional_string())
            .with_attribute("copy_outer_dscp", Attribute::optional_bool())
            .with_attribute(
                "df_bit",
                Attribute::optional_string().with_valid_values(["clear", "copy", "set"]),
            )
            .with_attribute(
                "establish_tunnels",
                Attribute::optional_string().with_valid_values(["immediately", "on-traffic"]),
            )
            .with_block("ike", NestedBlock::single(ike).with_min_items(1))
            .with_block(
                "traffic_selector",
                NestedBlock::list(traffic_selector).with_conflicts(IDENTITY_PATHS),
            )
            .with_block("vpn_monitor", NestedBlock::single(vpn_monitor))
    }

    fn id(options: &IpsecVpnOptions) -> String {
        options.name.clone()
    }

    fn config_path(id: &str) -> String {
        format!("security ipsec vpn {}", id)
    }

    fn render(options: &IpsecVpnOptions) -> Vec<String> {
        let mut lines = ConfigLines::new(Self::config_path(&options.name));
        lines.set_value("bind-interface", &options.bind_interface);
        lines.set_flag(options.copy_outer_dscp, "copy-outer-dscp");
        lines.set_value("df-bit", &options.df_bit);
        lines.set_value("establish-tunnels", &options.establish_tunnels);
        if let Some(ike) = &options.ike {
            lines.set_value("ike gateway", &ike.gateway);
            lines.set_value("ike ipsec-policy", &ike.policy);
            lines.set_value("ike proxy-identity local", &ike.identity_local);
            lines.set_value("ike proxy-identity remote", &ike.identity_remote);
            lines.set_value("ike proxy-identity service", &ike.identity_service);
        }
        for selector in &options.traffic_selector {
            let prefix = format!("traffic-selector {}", selector.name);
            lines.set_value(&format!("{} local-ip", prefix), &selector.local_ip);
            lines.set_value(&format!("{} remote-ip", prefix), &selector.remote_ip);
        }
        if let Some(monitor) = &options.vpn_monitor {
            if *monitor == VpnMonitor::default() {
                lines.set("vpn-monitor");
            }
            lines.set_value("vpn-monitor destination-ip", &monitor.destination_ip);
            lines.set_flag(monitor.optimized, "vpn-monitor optimized");
            lines.set_value("vpn-monitor source-interface", &monitor.source_interface);
        }
        lines.into_lines()
    }

    fn parse(id: &str, show: &str) -> Result<IpsecVpnOptions, ProviderError> {
        let mut options = IpsecVpnOptions {
            name: id.to_string(),
            ..Default::default()
        };
        for mut item in relative_lines(show) {
            if cut_prefix(&mut item, "ike ") {
                let ike = options.ike.get_or_insert_with(Default::default);
                if cut_prefix(&mut item, "gateway ") {
                    ike.gateway = item.to_string();
                } else if cut_prefix(&mut item, "ipsec-policy ") {
                    ike.policy = item.to_string();
                } else if cut_prefix(&mut item, "proxy-identity local ") {
                    ike.identity_local = item.to_string();
                } else if cut_prefix(&mut item, "proxy-identity remote ") {
                    ike.identity_remote = item.to_string();
                } else if cut_prefix(&mut item, "proxy-identity service ") {
                    ike.identity_service = item.to_string();
                }
            } else if cut_prefix(&mut item, "traffic-selector ") {
                let (name, mut rest) = split_word(item);
                let selector = named_entry(
                    &mut options.traffic_selector,
                    name,
                    |ts| ts.name.as_str(),
                    |name| TrafficSelector {
                        name: name.to_string(),
                        ..Default::default()
                    },
                );
                if cut_prefix(&mut rest, "local-ip ") {
                    selector.local_ip = rest.to_string();
                } else if cut_prefix(&mut rest, "remote-ip ") {
                    selector.remote_ip = rest.to_string();
                }
            } else if item == "vpn-monitor" || cut_prefix(&mut item, "vpn-monitor ") {
                let monitor = options.vpn_monitor.get_or_insert_with(Default::default);
                if item == "optimized" {
                    monitor.optimized = true;
                } else if cut_prefix(&mut item, "destination-ip ") {
                    monitor.destination_ip = item.to_string();
                } else if cut_prefix(&mut item, "source-interface ") {
                    monitor.source_interface = item.to_string();
                }
            } else if cut_prefix(&mut item, "bind-interface ") {
                options.bind_interface = item.to_string();
            } else if cut_prefix(&mut item, "df-bit ") {
                options.df_bit = item.to_string();
            } else if cut_prefix(&mut item, "establish-tunnels ") {
                options.establish_tunnels = item.to_string();
            } else if item == "copy-outer-dscp" {
                options.copy_outer_dscp = true;
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use serde_json::json;

    fn vpn() -> IpsecVpnOptions {
        IpsecVpnOptions {
            name: "vpn1".to_string(),
            bind_interface: "st0.1".to_string(),
            df_bit: "clear".to_string(),
            establish_tunnels: "immediately".to_string(),
            ike: Some(VpnIke {
                gateway: "gw1".to_string(),
                policy: "ipsec-pol".to_string(),
                ..Default::default()
            }),
            traffic_selector: vec![
                TrafficSelector {
                    name: "ts2".to_string(),
                    local_ip: "10.0.2.0/24".to_string(),
                    remote_ip: "10.1.2.0/24".to_string(),
                },
                TrafficSelector {
                    name: "ts1".to_string(),
                    local_ip: "10.0.1.0/24".to_string(),
                    remote_ip: "10.1.1.0/24".to_string(),
                },
            ],
            vpn_monitor: Some(VpnMonitor::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(
            IpsecVpn::render(&vpn()),
            vec![
                "set security ipsec vpn vpn1 bind-interface st0.1",
                "set security ipsec vpn vpn1 df-bit clear",
                "set security ipsec vpn vpn1 establish-tunnels immediately",
                "set security ipsec vpn vpn1 ike gateway gw1",
                "set security ipsec vpn vpn1 ike ipsec-policy ipsec-pol",
                "set security ipsec vpn vpn1 traffic-selector ts2 local-ip 10.0.2.0/24",
                "set security ipsec vpn vpn1 traffic-selector ts2 remote-ip 10.1.2.0/24",
                "set security ipsec vpn vpn1 traffic-selector ts1 local-ip 10.0.1.0/24",
                "set security ipsec vpn vpn1 traffic-selector ts1 remote-ip 10.1.1.0/24",
                "set security ipsec vpn vpn1 vpn-monitor",
            ]
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let lines = IpsecVpn::render(&vpn());
        let prefix = "set security ipsec vpn vpn1 ";
        let show: String = lines
            .iter()
            .map(|l| format!("set {}\n", l.strip_prefix(prefix).unwrap()))
            .collect();
        assert_eq!(IpsecVpn::parse("vpn1", &show).unwrap(), vpn());
    }

    #[test]
    fn test_parse_monitor_fields() {
        let show = "set vpn-monitor optimized\nset vpn-monitor source-interface st0.1\nset copy-outer-dscp\n";
        let parsed = IpsecVpn::parse("vpn1", show).unwrap();
        assert!(parsed.copy_outer_dscp);
        assert_eq!(
            parsed.vpn_monitor,
            Some(VpnMonitor {
                optimized: true,
                source_interface: "st0.1".to_string(),
                ..Default::default()
            })
        );
        assert!(parsed.ike.is_none());
    }

    #[test]
    fn test_schema_selector_conflicts_with_identity() {
        let state = json!({
            "name": "vpn1",
            "ike": {"gateway": "gw1", "identity_local": "10.0.0.0/24"},
            "traffic_selector": [{"name": "ts1", "local_ip": "10.0.1.0/24", "remote_ip": "10.1.1.0/24"}]
        });
        let diagnostics = validate(&IpsecVpn::schema(), &state);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.summary.contains("conflicts with")));
    }

    #[test]
    fn test_schema_requires_ike_and_checks_keywords() {
        let diagnostics = validate(&IpsecVpn::schema(), &json!({"name": "vpn1"}));
        assert_eq!(diagnostics.len(), 1);

        let state = json!({"name": "vpn1", "ike": {"gateway": "gw1"}, "df_bit": "keep"});
        let diagnostics = validate(&IpsecVpn::schema(), &state);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("df_bit".to_string()));
    }
}
