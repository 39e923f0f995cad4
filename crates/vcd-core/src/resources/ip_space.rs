//! IP Spaces (`1.0.0/ipSpaces`, API 37.1+)

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

const LABEL: &str = "IP Space";

/// Who an IP Space serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpSpaceType {
    /// Provider-managed, consumed by many organizations
    Public,
    /// Provider services reachable from tenants
    SharedServices,
    /// Owned by exactly one organization
    Private,
}

impl IpSpaceType {
    pub const ALL: [IpSpaceType; 3] = [
        IpSpaceType::Public,
        IpSpaceType::SharedServices,
        IpSpaceType::Private,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IpSpaceType::Public => "PUBLIC",
            IpSpaceType::SharedServices => "SHARED_SERVICES",
            IpSpaceType::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for IpSpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpSpaceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "IP Space type",
                value: s.to_string(),
                expected: "PUBLIC, SHARED_SERVICES, PRIVATE",
            })
    }
}

/// An inclusive address range inside an IP Space
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start_ip_address: String,
    pub end_ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpSpaceRanges {
    #[serde(default)]
    pub ip_ranges: Vec<IpRange>,
    /// `-1` means unlimited
    #[serde(default, rename = "defaultFloatingIPQuotaCount", skip_serializing_if = "Option::is_none")]
    pub default_floating_ip_quota_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpSpaceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: IpSpaceType,
    /// Owning organization, only for private IP Spaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_ref: Option<EntityRef>,
    /// CIDRs addresses are allocated from
    #[serde(default)]
    pub ip_space_internal_scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_space_external_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_space_ranges: Option<IpSpaceRanges>,
    #[serde(default)]
    pub route_advertisement_enabled: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl IpSpaceData {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: IpSpaceType, internal_scope: Vec<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            kind,
            org_ref: None,
            ip_space_internal_scope: internal_scope,
            ip_space_external_scope: None,
            ip_space_ranges: None,
            route_advertisement_enabled: false,
            extra: ExtraFields::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_org(mut self, org: EntityRef) -> Self {
        self.org_ref = Some(org);
        self
    }

    #[must_use]
    pub fn with_external_scope(mut self, cidr: impl Into<String>) -> Self {
        self.ip_space_external_scope = Some(cidr.into());
        self
    }

    #[must_use]
    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ip_space_ranges
            .get_or_insert_with(IpSpaceRanges::default)
            .ip_ranges
            .push(IpRange {
                id: None,
                start_ip_address: start.into(),
                end_ip_address: end.into(),
            });
        self
    }

    /// Check the type-dependent rules before sending anything
    ///
    /// Private IP Spaces need an owning organization, the other types must
    /// not have one. Every IP Space needs an internal scope.
    pub fn validate(&self, operation: Operation) -> Result<()> {
        require_name(operation, LABEL, &self.name)?;
        if self.ip_space_internal_scope.is_empty() {
            return Err(VcdError::invalid(operation, LABEL, "internal scope must not be empty"));
        }
        match (self.kind, &self.org_ref) {
            (IpSpaceType::Private, None) => Err(VcdError::invalid(
                operation,
                LABEL,
                "a PRIVATE IP Space needs an owning organization",
            )),
            (IpSpaceType::Public | IpSpaceType::SharedServices, Some(_)) => Err(VcdError::invalid(
                operation,
                LABEL,
                format!("a {} IP Space cannot belong to an organization", self.kind),
            )),
            _ => Ok(()),
        }
    }
}

impl InnerEntity for IpSpaceData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct IpSpace {
    client: VcdClient,
    data: IpSpaceData,
}

impl OuterEntity for IpSpace {
    type Inner = IpSpaceData;

    fn wrap(client: VcdClient, inner: IpSpaceData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &IpSpaceData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::IP_SPACES, LABEL)
}

impl IpSpace {
    pub async fn create(client: &VcdClient, data: &IpSpaceData) -> Result<Self> {
        data.validate(Operation::Create)?;
        create_outer_entity(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    pub async fn get_by_name(client: &VcdClient, name: &str) -> Result<Self> {
        get_outer_entity_by_name(client, &config(), name).await
    }

    /// Look up by name among the IP Spaces of one organization
    pub async fn get_by_name_in_org(client: &VcdClient, name: &str, org_id: &str) -> Result<Self> {
        let query = QueryParams::new().filter(Filter::eq("orgRef.id", org_id));
        get_outer_entity_by_name(client, &config().query(query), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &IpSpaceData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub fn kind(&self) -> IpSpaceType {
        self.data.kind
    }

    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    pub async fn update(&self, data: &IpSpaceData) -> Result<Self> {
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

    fn org() -> EntityRef {
        EntityRef {
            id: Some("urn:vcloud:org:1".to_string()),
            ..EntityRef::default()
        }
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("shared_services".parse::<IpSpaceType>().unwrap(), IpSpaceType::SharedServices);
        assert_eq!("PUBLIC".parse::<IpSpaceType>().unwrap(), IpSpaceType::Public);
        let err = "GLOBAL".parse::<IpSpaceType>().unwrap_err();
        assert!(err.to_string().contains("GLOBAL"));
    }

    #[test]
    fn test_private_requires_org() {
        let scope = vec!["10.0.0.0/16".to_string()];
        let data = IpSpaceData::new("tenant-space", IpSpaceType::Private, scope.clone());
        assert!(data.validate(Operation::Create).unwrap_err().is_invalid_parameters());
        assert!(data.with_org(org()).validate(Operation::Create).is_ok());

        let public = IpSpaceData::new("public", IpSpaceType::Public, scope).with_org(org());
        assert!(public.validate(Operation::Create).is_err());
    }

    #[test]
    fn test_empty_scope_rejected() {
        let data = IpSpaceData::new("public", IpSpaceType::Public, Vec::new());
        assert!(data.validate(Operation::Create).is_err());
    }

    #[test]
    fn test_wire_format() {
        let data = IpSpaceData::new("public", IpSpaceType::SharedServices, vec!["192.168.0.0/24".to_string()])
            .with_range("192.168.0.10", "192.168.0.20");
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "SHARED_SERVICES");
        assert_eq!(json["ipSpaceRanges"]["ipRanges"][0]["startIpAddress"], "192.168.0.10");
        assert_eq!(json["ipSpaceInternalScope"][0], "192.168.0.0/24");
    }
}
