//! Typed resource handles built on the generic CRUD engine
//!
//! Each module pairs a wire type (`*Data`, the [`InnerEntity`]) with a
//! handle (the [`OuterEntity`]) that keeps the client it was loaded with.
//! Handles are values: `update` and `refresh` return a new handle and leave
//! the old one untouched.
//!
//! Fields the wire types do not model are kept in an `extra` map so a
//! read-modify-update cycle sends back everything the server returned.
//!
//! [`InnerEntity`]: crate::InnerEntity
//! [`OuterEntity`]: crate::OuterEntity

use thiserror::Error;

pub mod app_port_profile;
pub mod catalog;
pub mod edge_bgp;
pub mod firewall_group;
pub mod ip_space;
pub mod org;
pub mod org_vdc_network;
pub mod role;

pub use app_port_profile::{AppPort, AppPortProfile, AppPortProfileData, PortProfileScope, PortProtocol};
pub use catalog::{Catalog, CatalogData};
pub use edge_bgp::{BgpGracefulRestart, EdgeBgpConfig, EdgeBgpConfigData};
pub use firewall_group::{FirewallGroup, FirewallGroupData, FirewallGroupType};
pub use ip_space::{IpRange, IpSpace, IpSpaceData, IpSpaceType};
pub use org::{Org, OrgData};
pub use org_vdc_network::{ConnectionType, OrgVdcNetwork, OrgVdcNetworkData, OrgVdcNetworkType, Subnet};
pub use role::{Role, RoleData};

/// A string that does not name any variant of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Extra JSON fields preserved across read-modify-update
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// The id of a loaded handle, or `InvalidParameters` when it has none
pub(crate) fn require_id<'a>(
    operation: crate::Operation,
    entity: &str,
    id: Option<&'a str>,
) -> crate::Result<&'a str> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or_else(|| crate::VcdError::invalid(operation, entity, "entity has no id"))
}

/// `InvalidParameters` unless `name` has visible characters
pub(crate) fn require_name(operation: crate::Operation, entity: &str, name: &str) -> crate::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::VcdError::invalid(operation, entity, "name must not be empty"));
    }
    Ok(())
}
