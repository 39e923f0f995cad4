//! Catalogs (`1.0.0/catalogs`)
//!
//! Catalog creation is asynchronous on most servers. [`Catalog::create`]
//! waits for the task and returns the finished catalog, while
//! [`Catalog::create_async`] hands the task back for callers that want to
//! report progress themselves.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{ExtraFields, require_id, require_name};
use crate::client::VcdClient;
use crate::crud::{
    CrudConfig, InnerEntity, OuterEntity, create_inner_entity_async, create_outer_entity,
    delete_entity_by_id, get_all_outer_entities, get_outer_entity, get_outer_entity_by_name,
    update_outer_entity,
};
use crate::endpoints;
use crate::error::{Operation, Result};
use crate::query::QueryParams;
use crate::task::{EntityRef, Task};

const LABEL: &str = "Catalog";

/// Wire representation of a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
    #[serde(
        default,
        rename = "numberOfVAppTemplates",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_vapp_templates: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_media: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_storage_profiles: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<FixedOffset>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CatalogData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Create the catalog in `org` (needed for provider sessions)
    #[must_use]
    pub fn with_org(mut self, org: EntityRef) -> Self {
        self.org = Some(org);
        self
    }

    /// Place the catalog on a specific storage profile
    #[must_use]
    pub fn with_storage_profile(mut self, profile: EntityRef) -> Self {
        self.catalog_storage_profiles.push(profile);
        self
    }
}

impl InnerEntity for CatalogData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// A catalog handle
#[derive(Debug, Clone)]
pub struct Catalog {
    client: VcdClient,
    data: CatalogData,
}

impl OuterEntity for Catalog {
    type Inner = CatalogData;

    fn wrap(client: VcdClient, inner: CatalogData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &CatalogData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::CATALOGS, LABEL)
}

impl Catalog {
    /// Create a catalog and wait until it is usable
    pub async fn create(client: &VcdClient, data: &CatalogData) -> Result<Self> {
        require_name(Operation::Create, LABEL, &data.name)?;
        create_outer_entity(client, &config(), data).await
    }

    /// Start creating a catalog and return the server task
    pub async fn create_async(client: &VcdClient, data: &CatalogData) -> Result<Task> {
        require_name(Operation::Create, LABEL, &data.name)?;
        create_inner_entity_async(client, &config(), data).await
    }

    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    pub async fn get_by_name(client: &VcdClient, name: &str) -> Result<Self> {
        get_outer_entity_by_name(client, &config(), name).await
    }

    /// All catalogs visible to the session, narrowed by `query`
    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    /// Re-read the catalog from the server
    pub async fn refresh(&self) -> Result<Self> {
        let id = require_id(Operation::Get, LABEL, self.id())?;
        Self::get_by_id(&self.client, id).await
    }

    /// Replace the catalog with `data`, usually an edited copy of [`data`](Self::data)
    pub async fn update(&self, data: &CatalogData) -> Result<Self> {
        update_outer_entity(&self.client, &config(), data).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.delete_with(false, false).await
    }

    /// Delete, optionally removing contained items (`recursive`) and
    /// ignoring running tasks (`force`)
    pub async fn delete_with(&self, force: bool, recursive: bool) -> Result<()> {
        let id = require_id(Operation::Delete, LABEL, self.id())?;
        let query = QueryParams::new()
            .param("force", force.to_string())
            .param("recursive", recursive.to_string());
        delete_entity_by_id(&self.client, &config().item(id).query(query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "id": "urn:vcloud:catalog:1",
            "name": "catalog-A",
            "numberOfVAppTemplates": 3,
            "isPublished": false,
            "publishConfig": {"isPublished": false},
            "owner": {"id": "urn:vcloud:user:1", "name": "admin"}
        });
        let data: CatalogData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(data.number_of_vapp_templates, Some(3));
        assert!(data.extra.contains_key("publishConfig"));
        assert_eq!(serde_json::to_value(&data).unwrap(), raw);
    }

    #[test]
    fn test_builder() {
        let data = CatalogData::new("catalog-A")
            .with_description("images")
            .with_org(EntityRef {
                id: Some("urn:vcloud:org:1".to_string()),
                ..EntityRef::default()
            });
        assert_eq!(InnerEntity::name(&data), Some("catalog-A"));
        assert_eq!(InnerEntity::id(&data), None);
        assert_eq!(data.description.as_deref(), Some("images"));
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["org"]["id"], "urn:vcloud:org:1");
    }
}
