//! OpenAPI endpoints used by the resource wrappers

use crate::endpoint::Endpoint;
use crate::version::ApiVersion;

pub const SESSIONS: Endpoint = Endpoint::new("1.0.0/sessions", ApiVersion::new(33, 0));
pub const SESSIONS_PROVIDER: Endpoint =
    Endpoint::new("1.0.0/sessions/provider", ApiVersion::new(33, 0));

pub const ORGS: Endpoint = Endpoint::new("1.0.0/orgs/", ApiVersion::new(33, 0));
pub const ROLES: Endpoint = Endpoint::new("1.0.0/roles/", ApiVersion::new(31, 0));
pub const CATALOGS: Endpoint = Endpoint::new("1.0.0/catalogs/", ApiVersion::new(37, 0));

pub const IP_SPACES: Endpoint = Endpoint::new("1.0.0/ipSpaces/", ApiVersion::new(37, 1));
pub const EDGE_BGP_CONFIG: Endpoint = Endpoint::new(
    "1.0.0/edgeGateways/{}/routing/bgp",
    ApiVersion::new(35, 0),
);
pub const APP_PORT_PROFILES: Endpoint =
    Endpoint::new("1.0.0/applicationPortProfiles/", ApiVersion::new(34, 0));
pub const FIREWALL_GROUPS: Endpoint =
    Endpoint::new("1.0.0/firewallGroups/", ApiVersion::new(34, 0));
pub const ORG_VDC_NETWORKS: Endpoint =
    Endpoint::new("1.0.0/orgVdcNetworks/", ApiVersion::new(32, 0));
