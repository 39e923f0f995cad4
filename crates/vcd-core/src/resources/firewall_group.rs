//! NSX-T firewall groups (`1.0.0/firewallGroups`)
//!
//! One endpoint serves four kinds of group, told apart by `typeValue`:
//! IP sets list addresses, static groups list network members, dynamic
//! groups match VMs by criteria, and security groups are the legacy name of
//! static groups on older servers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ExtraFields, UnknownVariant, require_id, require_name};
use crate::client::VcdClient;
use crate::crud::{
    CrudConfig, InnerEntity, OuterEntity, create_outer_entity, delete_entity_by_id,
    get_all_outer_entities, get_outer_entity, get_outer_entity_by_name, update_outer_entity,
};
use crate::endpoints;
use crate::error::{Operation, Result, VcdError};
use crate::query::{Filter, QueryParams};
use crate::task::EntityRef;

const LABEL: &str = "Firewall Group";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirewallGroupType {
    IpSet,
    SecurityGroup,
    StaticMembers,
    VmCriteria,
}

impl FirewallGroupType {
    pub const ALL: [FirewallGroupType; 4] = [
        FirewallGroupType::IpSet,
        FirewallGroupType::SecurityGroup,
        FirewallGroupType::StaticMembers,
        FirewallGroupType::VmCriteria,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FirewallGroupType::IpSet => "IP_SET",
            FirewallGroupType::SecurityGroup => "SECURITY_GROUP",
            FirewallGroupType::StaticMembers => "STATIC_MEMBERS",
            FirewallGroupType::VmCriteria => "VM_CRITERIA",
        }
    }
}

impl fmt::Display for FirewallGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FirewallGroupType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "firewall group type",
                value: s.to_string(),
                expected: "IP_SET, SECURITY_GROUP, STATIC_MEMBERS, VM_CRITERIA",
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallGroupData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub type_value: FirewallGroupType,
    /// Edge gateway or VDC group the group is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<EntityRef>,
    /// IP addresses, CIDRs or ranges (`IP_SET`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
    /// Org VDC networks (`STATIC_MEMBERS`, `SECURITY_GROUP`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<EntityRef>,
    /// Matching rules (`VM_CRITERIA`), passed through as-is
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vm_criteria: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FirewallGroupData {
    fn empty(name: impl Into<String>, kind: FirewallGroupType, owner: EntityRef) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            type_value: kind,
            owner_ref: Some(owner),
            ip_addresses: Vec::new(),
            members: Vec::new(),
            vm_criteria: Vec::new(),
            extra: ExtraFields::new(),
        }
    }

    /// An IP set owned by `owner` (usually an edge gateway)
    #[must_use]
    pub fn ip_set<I, S>(name: impl Into<String>, owner: EntityRef, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut data = Self::empty(name, FirewallGroupType::IpSet, owner);
        data.ip_addresses = addresses.into_iter().map(Into::into).collect();
        data
    }

    /// A static group whose members are Org VDC networks
    #[must_use]
    pub fn static_members(name: impl Into<String>, owner: EntityRef, members: Vec<EntityRef>) -> Self {
        let mut data = Self::empty(name, FirewallGroupType::StaticMembers, owner);
        data.members = members;
        data
    }

    /// A dynamic group matching VMs by `criteria`
    #[must_use]
    pub fn vm_criteria(name: impl Into<String>, owner: EntityRef, criteria: Vec<serde_json::Value>) -> Self {
        let mut data = Self::empty(name, FirewallGroupType::VmCriteria, owner);
        data.vm_criteria = criteria;
        data
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self, operation: Operation) -> Result<()> {
        require_name(operation, LABEL, &self.name)?;
        if self.owner_ref.as_ref().and_then(|o| o.id.as_deref()).is_none() {
            return Err(VcdError::invalid(operation, LABEL, "owner reference with an id is required"));
        }
        match self.type_value {
            FirewallGroupType::IpSet if !self.members.is_empty() || !self.vm_criteria.is_empty() => {
                Err(VcdError::invalid(operation, LABEL, "an IP_SET only holds IP addresses"))
            }
            FirewallGroupType::StaticMembers | FirewallGroupType::SecurityGroup
                if !self.ip_addresses.is_empty() =>
            {
                Err(VcdError::invalid(
                    operation,
                    LABEL,
                    format!("a {} group cannot hold IP addresses", self.type_value),
                ))
            }
            FirewallGroupType::VmCriteria if !self.ip_addresses.is_empty() || !self.members.is_empty() => {
                Err(VcdError::invalid(operation, LABEL, "a VM_CRITERIA group only holds criteria"))
            }
            _ => Ok(()),
        }
    }
}

impl InnerEntity for FirewallGroupData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct FirewallGroup {
    client: VcdClient,
    data: FirewallGroupData,
}

impl OuterEntity for FirewallGroup {
    type Inner = FirewallGroupData;

    fn wrap(client: VcdClient, inner: FirewallGroupData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &FirewallGroupData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::FIREWALL_GROUPS, LABEL)
}

impl FirewallGroup {
    pub async fn create(client: &VcdClient, data: &FirewallGroupData) -> Result<Self> {
        data.validate(Operation::Create)?;
        create_outer_entity(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    /// Look up by name among the groups of one owner (edge gateway or VDC group)
    pub async fn get_by_name(client: &VcdClient, name: &str, owner_id: &str) -> Result<Self> {
        let query = QueryParams::new().filter(Filter::eq("ownerRef.id", owner_id));
        get_outer_entity_by_name(client, &config().query(query), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &FirewallGroupData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub fn kind(&self) -> FirewallGroupType {
        self.data.type_value
    }

    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    pub async fn update(&self, data: &FirewallGroupData) -> Result<Self> {
        data.validate(Operation::Update)?;
        update_outer_entity(&self.client, &config(), data).await
    }

    pub async fn delete(&self) -> Result<()> {
        let id = require_id(Operation::Delete, LABEL, self.id())?;
        delete_entity_by_id(&self.client, &config().item(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> EntityRef {
        EntityRef {
            id: Some("urn:vcloud:gateway:1".to_string()),
            ..EntityRef::default()
        }
    }

    #[test]
    fn test_ip_set_wire_format() {
        let data = FirewallGroupData::ip_set("web-servers", edge(), ["10.0.0.10", "10.0.1.0/24"]);
        assert!(data.validate(Operation::Create).is_ok());
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["typeValue"], "IP_SET");
        assert_eq!(json["ipAddresses"][1], "10.0.1.0/24");
        assert_eq!(json["ownerRef"]["id"], "urn:vcloud:gateway:1");
        assert!(json.get("members").is_none());
    }

    #[test]
    fn test_mixed_contents_rejected() {
        let mut data = FirewallGroupData::static_members("apps", edge(), Vec::new());
        data.ip_addresses.push("10.0.0.1".to_string());
        assert!(data.validate(Operation::Create).unwrap_err().is_invalid_parameters());
    }

    #[test]
    fn test_owner_required() {
        let data = FirewallGroupData::ip_set("web", EntityRef::default(), ["10.0.0.1"]);
        assert!(data.validate(Operation::Create).is_err());
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("vm_criteria".parse::<FirewallGroupType>().unwrap(), FirewallGroupType::VmCriteria);
        assert!("DYNAMIC".parse::<FirewallGroupType>().is_err());
    }
}
