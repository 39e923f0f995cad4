//! Organizations (`1.0.0/orgs`), read-only
//!
//! Besides plain lookups, an [`Org`] can produce the [`TenantContext`] that
//! makes a provider session act on behalf of that organization.

use serde::{Deserialize, Serialize};

use super::ExtraFields;
use crate::client::{TenantContext, VcdClient};
use crate::crud::{
    CrudConfig, InnerEntity, OuterEntity, get_all_outer_entities, get_outer_entity,
    get_outer_entity_by_name,
};
use crate::endpoints;
use crate::error::Result;
use crate::query::QueryParams;

const LABEL: &str = "Organization";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_vdc_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_count: Option<u32>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl InnerEntity for OrgData {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Org {
    client: VcdClient,
    data: OrgData,
}

impl OuterEntity for Org {
    type Inner = OrgData;

    fn wrap(client: VcdClient, inner: OrgData) -> Self {
        Self {
            client,
            data: inner,
        }
    }

    fn inner(&self) -> &OrgData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config() -> CrudConfig {
    CrudConfig::new(endpoints::ORGS, LABEL)
}

impl Org {
    pub async fn get_by_id(client: &VcdClient, id: &str) -> Result<Self> {
        get_outer_entity(client, &config().item(id)).await
    }

    pub async fn get_by_name(client: &VcdClient, name: &str) -> Result<Self> {
        get_outer_entity_by_name(client, &config(), name).await
    }

    pub async fn list(client: &VcdClient, query: QueryParams) -> Result<Vec<Self>> {
        get_all_outer_entities(client, &config().query(query)).await
    }

    pub fn data(&self) -> &OrgData {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    /// Tenant headers for acting inside this organization
    pub fn tenant_context(&self) -> Option<TenantContext> {
        self.id()
            .map(|id| TenantContext::new(id, self.data.name.clone()))
    }

    /// A client that sends this organization's tenant headers
    pub fn tenant_client(&self) -> Option<VcdClient> {
        self.tenant_context()
            .map(|tenant| self.client.with_tenant(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_context_from_org() {
        let client = VcdClient::builder("https://vcd.example.com")
            .token("t")
            .build()
            .unwrap();
        let data = OrgData {
            id: Some("urn:vcloud:org:0a1b".to_string()),
            name: "tenant-1".to_string(),
            ..OrgData::default()
        };
        let org = Org::wrap(client, data);
        let tenant = org.tenant_context().unwrap();
        assert_eq!(tenant.org_id(), "0a1b");
        assert_eq!(tenant.org_name(), "tenant-1");
        assert!(org.tenant_client().unwrap().tenant().is_some());
    }
}
