//! Roles (`1.0.0/roles`)

use serde::{Deserialize, Serialize};

use super::{ExtraFields, require_id, require_name};
use crate::client::VcdClient;
use crate::crud::{
    CrudConfig, InnerEntity, OuterEntity, create_outer_entity, delete_entity_by_id,
    get_all_outer_entities, get_outer_entity, get_outer_entity_by_name, update_outer_entity,
};
use crate::endpoints;
use crate::error::{Operation, Result};
use crate::query::QueryParams;

const LABEL: &str = "Role";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl RoleData {
    /// VCD rejects roles without a description, so one is required here
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            bundle_key: Some("com.vmware.vcloud.undefined.key".to_string()),
            ..Self::default()
        }
    }
}

impl InnerEntity for RoleData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    client: VcdClient,
    data: RoleData,
}

impl OuterEntity for Role {
    type Inner = RoleData;

    fn wrap(client: VcdClient, inner: RoleData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &RoleData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::ROLES, LABEL)
}

impl Role {
    pub async fn create(client: &VcdClient, data: &RoleData) -> Result<Self> {
        require_name(Operation::Create, LABEL, &data.name)?;
        create_outer_entity(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    pub async fn get_by_name(client: &VcdClient, name: &str) -> Result<Self> {
        get_outer_entity_by_name(client, &config(), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &RoleData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    pub async fn update(&self, data: &RoleData) -> Result<Self> {
        update_outer_entity(&self.client, &config(), data).await
    }

    pub async fn delete(&self) -> Result<()> {
        let id = require_id(Operation::Delete, LABEL, self.id())?;
        delete_entity_by_id(&self.client, &config().item(id)).await
    }
}
