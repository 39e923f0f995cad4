//! NSX-T application port profiles (`1.0.0/applicationPortProfiles`)
//!
//! Profiles exist in three scopes. `SYSTEM` profiles ship with the product
//! and are read-only, so only `PROVIDER` and `TENANT` profiles can be
//! created here. Names are unique per scope, not globally, which is why
//! lookups by name always take a scope.

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

const LABEL: &str = "Application Port Profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortProfileScope {
    System,
    Provider,
    Tenant,
}

impl PortProfileScope {
    pub const ALL: [PortProfileScope; 3] = [
        PortProfileScope::System,
        PortProfileScope::Provider,
        PortProfileScope::Tenant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PortProfileScope::System => "SYSTEM",
            PortProfileScope::Provider => "PROVIDER",
            PortProfileScope::Tenant => "TENANT",
        }
    }
}

impl fmt::Display for PortProfileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortProfileScope {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "port profile scope",
                value: s.to_string(),
                expected: "SYSTEM, PROVIDER, TENANT",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortProtocol {
    #[serde(rename = "ICMPv4")]
    IcmpV4,
    #[serde(rename = "ICMPv6")]
    IcmpV6,
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl PortProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            PortProtocol::IcmpV4 => "ICMPv4",
            PortProtocol::IcmpV6 => "ICMPv6",
            PortProtocol::Tcp => "TCP",
            PortProtocol::Udp => "UDP",
        }
    }

    /// ICMP carries no ports
    pub fn has_ports(self) -> bool {
        matches!(self, PortProtocol::Tcp | PortProtocol::Udp)
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortProtocol {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [
            PortProtocol::IcmpV4,
            PortProtocol::IcmpV6,
            PortProtocol::Tcp,
            PortProtocol::Udp,
        ]
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| UnknownVariant {
            kind: "port protocol",
            value: s.to_string(),
            expected: "ICMPv4, ICMPv6, TCP, UDP",
        })
    }
}

/// One protocol plus its destination ports (`"443"` or ranges like `"8000-8080"`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPort {
    pub protocol: PortProtocol,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_ports: Vec<String>,
}

impl AppPort {
    pub fn tcp<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protocol: PortProtocol::Tcp,
            destination_ports: ports.into_iter().map(Into::into).collect(),
        }
    }

    pub fn udp<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protocol: PortProtocol::Udp,
            destination_ports: ports.into_iter().map(Into::into).collect(),
        }
    }

    pub fn icmp(protocol: PortProtocol) -> Self {
        Self {
            protocol,
            destination_ports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPortProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scope: PortProfileScope,
    #[serde(default)]
    pub application_ports: Vec<AppPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_ref: Option<EntityRef>,
    /// VDC, VDC group or NSX-T manager the profile belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_entity_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AppPortProfileData {
    /// A new profile definition; `SYSTEM` scope and empty port lists are rejected
    pub fn new(name: impl Into<String>, scope: PortProfileScope, ports: Vec<AppPort>) -> Result<Self> {
        let data = Self {
            id: None,
            name: name.into(),
            description: None,
            scope,
            application_ports: ports,
            org_ref: None,
            context_entity_id: None,
            extra: ExtraFields::new(),
        };
        data.validate(Operation::Create)?;
        Ok(data)
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
    pub fn with_context(mut self, context_entity_id: impl Into<String>) -> Self {
        self.context_entity_id = Some(context_entity_id.into());
        self
    }

    fn validate(&self, operation: Operation) -> Result<()> {
        require_name(operation, LABEL, &self.name)?;
        if self.scope == PortProfileScope::System {
            return Err(VcdError::invalid(
                operation,
                LABEL,
                "SYSTEM profiles are read-only, use PROVIDER or TENANT scope",
            ));
        }
        if self.application_ports.is_empty() {
            return Err(VcdError::invalid(operation, LABEL, "at least one application port is required"));
        }
        if let Some(port) = self
            .application_ports
            .iter()
            .find(|p| p.protocol.has_ports() && p.destination_ports.is_empty())
        {
            return Err(VcdError::invalid(
                operation,
                LABEL,
                format!("{} entry needs destination ports", port.protocol),
            ));
        }
        Ok(())
    }
}

impl InnerEntity for AppPortProfileData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct AppPortProfile {
    client: VcdClient,
    data: AppPortProfileData,
}

impl OuterEntity for AppPortProfile {
    type Inner = AppPortProfileData;

    fn wrap(client: VcdClient, inner: AppPortProfileData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &AppPortProfileData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::APP_PORT_PROFILES, LABEL)
}

impl AppPortProfile {
    pub async fn create(client: &VcdClient, data: &AppPortProfileData) -> Result<Self> {
        data.validate(Operation::Create)?;
        create_outer_entity(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    /// Look up a profile by name within one scope
    pub async fn get_by_name(client: &VcdClient, name: &str, scope: PortProfileScope) -> Result<Self> {
        let query = QueryParams::new().filter(Filter::eq("scope", scope.as_str()));
        get_outer_entity_by_name(client, &config().query(query), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &AppPortProfileData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    pub async fn update(&self, data: &AppPortProfileData) -> Result<Self> {
        data.validate(Operation::Update)?;
        update_outer_entity(&self.client, &config(), data).await
    }

    pub async fn delete(&self) -> Result<()> {
        let id = require_id(Operation::Delete, LABEL, self.id())?;
        delete_entity_by_id(&self.client, &config().item(id)).await
    }
}
