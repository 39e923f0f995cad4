//! Org VDC networks (`1.0.0/orgVdcNetworks`)
//!
//! Deleting a network right after the VMs or edge attachments using it were
//! removed often fails with a "busy" error while VCD finishes the previous
//! operation. [`OrgVdcNetwork::delete`] retries those failures with the
//! client's busy retry settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ExtraFields, UnknownVariant, require_id, require_name};
use crate::client::VcdClient;
use crate::crud::{
    CrudConfig, InnerEntity, OuterEntity, create_outer_entity, delete_entity_by_id_with_retry,
    get_all_outer_entities, get_outer_entity, get_outer_entity_by_name, update_outer_entity,
};
use crate::endpoints;
use crate::error::{Operation, Result, VcdError};
use crate::query::{Filter, QueryParams};
use crate::retry::BusyRetryPolicy;
use crate::task::EntityRef;

const LABEL: &str = "Org VDC Network";

/// How a network reaches the outside world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgVdcNetworkType {
    NatRouted,
    Isolated,
    Direct,
    DirectUplink,
    Opaque,
}

impl OrgVdcNetworkType {
    pub const ALL: [OrgVdcNetworkType; 5] = [
        OrgVdcNetworkType::NatRouted,
        OrgVdcNetworkType::Isolated,
        OrgVdcNetworkType::Direct,
        OrgVdcNetworkType::DirectUplink,
        OrgVdcNetworkType::Opaque,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrgVdcNetworkType::NatRouted => "NAT_ROUTED",
            OrgVdcNetworkType::Isolated => "ISOLATED",
            OrgVdcNetworkType::Direct => "DIRECT",
            OrgVdcNetworkType::DirectUplink => "DIRECT_UPLINK",
            OrgVdcNetworkType::Opaque => "OPAQUE",
        }
    }
}

impl fmt::Display for OrgVdcNetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgVdcNetworkType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "network type",
                value: s.to_string(),
                expected: "NAT_ROUTED, ISOLATED, DIRECT, DIRECT_UPLINK, OPAQUE",
            })
    }
}

/// Interface type of a routed network on its edge gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Internal,
    Subinterface,
    Distributed,
    NonDistributed,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 4] = [
        ConnectionType::Internal,
        ConnectionType::Subinterface,
        ConnectionType::Distributed,
        ConnectionType::NonDistributed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::Internal => "INTERNAL",
            ConnectionType::Subinterface => "SUBINTERFACE",
            ConnectionType::Distributed => "DISTRIBUTED",
            ConnectionType::NonDistributed => "NON_DISTRIBUTED",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "connection type",
                value: s.to_string(),
                expected: "INTERNAL, SUBINTERFACE, DISTRIBUTED, NON_DISTRIBUTED",
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRange {
    pub start_address: String,
    pub end_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRanges {
    #[serde(default)]
    pub values: Vec<AddressRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub gateway: String,
    pub prefix_length: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_server1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_server2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_suffix: Option<String>,
    /// Static pool handed out to VMs
    #[serde(default)]
    pub ip_ranges: AddressRanges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Subnet {
    #[must_use]
    pub fn new(gateway: impl Into<String>, prefix_length: u8) -> Self {
        Self {
            gateway: gateway.into(),
            prefix_length,
            enabled: Some(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pool(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ip_ranges.values.push(AddressRange {
            start_address: start.into(),
            end_address: end.into(),
        });
        self
    }

    #[must_use]
    pub fn with_dns(mut self, primary: impl Into<String>, secondary: Option<String>) -> Self {
        self.dns_server1 = Some(primary.into());
        self.dns_server2 = secondary;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnets {
    #[serde(default)]
    pub values: Vec<Subnet>,
}

/// Uplink of a routed network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnection {
    pub router_ref: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgVdcNetworkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<OrgVdcNetworkType>,
    /// VDC or VDC group the network lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<NetworkConnection>,
    #[serde(default)]
    pub subnets: Subnets,
    /// Server-side realization state, read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl OrgVdcNetworkData {
    /// An isolated network in `vdc`
    #[must_use]
    pub fn isolated(name: impl Into<String>, vdc: EntityRef, subnet: Subnet) -> Self {
        Self {
            name: name.into(),
            network_type: Some(OrgVdcNetworkType::Isolated),
            owner_ref: Some(vdc),
            subnets: Subnets { values: vec![subnet] },
            ..Self::default()
        }
    }

    /// A network routed through the edge gateway `edge`
    #[must_use]
    pub fn routed(name: impl Into<String>, vdc: EntityRef, edge: EntityRef, subnet: Subnet) -> Self {
        Self {
            name: name.into(),
            network_type: Some(OrgVdcNetworkType::NatRouted),
            owner_ref: Some(vdc),
            connection: Some(NetworkConnection {
                router_ref: edge,
                connection_type: Some(ConnectionType::Internal),
            }),
            subnets: Subnets { values: vec![subnet] },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self, operation: Operation) -> Result<()> {
        require_name(operation, LABEL, &self.name)?;
        if self.subnets.values.is_empty() {
            return Err(VcdError::invalid(operation, LABEL, "at least one subnet is required"));
        }
        Ok(())
    }
}

impl InnerEntity for OrgVdcNetworkData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct OrgVdcNetwork {
    client: VcdClient,
    data: OrgVdcNetworkData,
}

impl OuterEntity for OrgVdcNetwork {
    type Inner = OrgVdcNetworkData;

    fn wrap(client: VcdClient, inner: OrgVdcNetworkData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &OrgVdcNetworkData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::ORG_VDC_NETWORKS, LABEL)
}

impl OrgVdcNetwork {
    pub async fn create(client: &VcdClient, data: &OrgVdcNetworkData) -> Result<Self> {
        data.validate(Operation::Create)?;
        create_outer_entity(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    pub async fn get_by_name(client: &VcdClient, name: &str) -> Result<Self> {
        get_outer_entity_by_name(client, &config(), name).await
    }

    /// Look up by name among the networks owned by one VDC or VDC group
    pub async fn get_by_name_in_owner(client: &VcdClient, name: &str, owner_id: &str) -> Result<Self> {
        let query = QueryParams::new().filter(Filter::eq("ownerRef.id", owner_id));
        get_outer_entity_by_name(client, &config().query(query), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &OrgVdcNetworkData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    pub async fn update(&self, data: &OrgVdcNetworkData) -> Result<Self> {
        data.validate(Operation::Update)?;
        update_outer_entity(&self.client, &config(), data).await
    }

    /// Delete, retrying while the network is busy
    pub async fn delete(&self) -> Result<()> {
        let policy = BusyRetryPolicy::from_config(self.client.busy_retry());
        self.delete_with_policy(&policy).await
    }

    pub async fn delete_with_policy(&self, policy: &BusyRetryPolicy) -> Result<()> {
        let id = require_id(Operation::Delete, LABEL, self.id())?;
        delete_entity_by_id_with_retry(&self.client, &config().item(id), policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vdc() -> EntityRef {
        EntityRef {
            id: Some("urn:vcloud:vdc:1".to_string()),
            ..EntityRef::default()
        }
    }

    #[test]
    fn test_routed_wire_format() {
        let edge = EntityRef {
            id: Some("urn:vcloud:gateway:1".to_string()),
            ..EntityRef::default()
        };
        let subnet = Subnet::new("192.168.10.1", 24).with_pool("192.168.10.10", "192.168.10.50");
        let data = OrgVdcNetworkData::routed("net-1", vdc(), edge, subnet);
        assert!(data.validate(Operation::Create).is_ok());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["networkType"], "NAT_ROUTED");
        assert_eq!(json["connection"]["connectionType"], "INTERNAL");
        assert_eq!(json["connection"]["routerRef"]["id"], "urn:vcloud:gateway:1");
        assert_eq!(json["subnets"]["values"][0]["prefixLength"], 24);
        assert_eq!(
            json["subnets"]["values"][0]["ipRanges"]["values"][0]["startAddress"],
            "192.168.10.10"
        );
    }

    #[test]
    fn test_subnet_required() {
        let mut data = OrgVdcNetworkData::isolated("net-1", vdc(), Subnet::new("10.0.0.1", 24));
        data.subnets.values.clear();
        assert!(data.validate(Operation::Create).unwrap_err().is_invalid_parameters());
    }

    #[test]
    fn test_network_types_parse_case_insensitively() {
        assert_eq!("nat_routed".parse::<OrgVdcNetworkType>().unwrap(), OrgVdcNetworkType::NatRouted);
        assert_eq!(" DIRECT_UPLINK ".parse::<OrgVdcNetworkType>().unwrap(), OrgVdcNetworkType::DirectUplink);
        assert_eq!("non_distributed".parse::<ConnectionType>().unwrap(), ConnectionType::NonDistributed);

        let err = "ROUTED".parse::<OrgVdcNetworkType>().unwrap_err();
        assert_eq!(err.value, "ROUTED");
        assert!(err.to_string().contains("NAT_ROUTED"));
        assert!("TRUNK".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn test_unknown_network_type_is_rejected_on_decode() {
        let raw = json!({
            "name": "net-1",
            "networkType": "SOMETHING_ELSE",
            "subnets": {"values": []}
        });
        assert!(serde_json::from_value::<OrgVdcNetworkData>(raw).is_err());

        let raw = json!({
            "name": "net-1",
            "networkType": "ISOLATED",
            "subnets": {"values": []}
        });
        let data: OrgVdcNetworkData = serde_json::from_value(raw).unwrap();
        assert_eq!(data.network_type, Some(OrgVdcNetworkType::Isolated));
    }
}
