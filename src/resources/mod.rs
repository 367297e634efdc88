//! Resource descriptors.
//!
//! Each module maps one Junos configuration object onto typed options: the
//! statements it renders, how relative show output is folded back into the
//! options, and the schema checked before any lock is taken.

mod eventoptions_destination;
mod firewall_policer;
mod policyoptions_as_path;
mod policyoptions_community;
mod security_ipsec_vpn;

pub use eventoptions_destination::{ArchiveSite, EventDestination, EventDestinationOptions};
pub use firewall_policer::{
    FirewallPolicer, IfExceeding, IfExceedingPps, PolicerOptions, PolicerThen,
};
pub use policyoptions_as_path::{AsPath, AsPathOptions};
pub use policyoptions_community::{Community, CommunityOptions};
pub use security_ipsec_vpn::{
    IpsecVpn, IpsecVpnOptions, TrafficSelector, VpnIke, VpnMonitor,
};
