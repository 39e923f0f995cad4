//! BGP routing configuration of an NSX-T edge gateway
//!
//! This is a single object below its edge gateway
//! (`1.0.0/edgeGateways/<id>/routing/bgp`): it is never created or deleted,
//! only read and replaced. Disabling BGP is an update with `enabled: false`.

use serde::{Deserialize, Serialize};

use super::ExtraFields;
use crate::client::VcdClient;
use crate::crud::{CrudConfig, InnerEntity, OuterEntity, get_outer_entity, put_inner_entity};
use crate::endpoints;
use crate::error::{Operation, Result, VcdError};

const LABEL: &str = "Edge Gateway BGP configuration";

/// Graceful restart settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpGracefulRestart {
    /// `DISABLE`, `HELPER_ONLY`, `GRACEFUL_AND_HELPER`
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_timer: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_route_timer: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeBgpConfigData {
    pub enabled: bool,
    #[serde(default)]
    pub ecmp: bool,
    /// Autonomous system number as a string (`"65000"` or `"1.10"`)
    #[serde(default, rename = "localASNumber", skip_serializing_if = "Option::is_none")]
    pub local_as_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graceful_restart: Option<BgpGracefulRestart>,
    /// Optimistic locking token, must be sent back unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl InnerEntity for EdgeBgpConfigData {
    fn id(&self) -> Option<&str> {
        None
    }
}

/// BGP configuration handle, bound to its edge gateway
#[derive(Debug, Clone)]
pub struct EdgeBgpConfig {
    client: VcdClient,
    edge_gateway_id: String,
    data: EdgeBgpConfigData,
}

impl OuterEntity for EdgeBgpConfig {
    type Inner = EdgeBgpConfigData;

    fn wrap(client: VcdClient, inner: EdgeBgpConfigData) -> Self {
        Self {
            client,
            edge_gateway_id: String::new(),
            data: inner,
        }
    }

    fn inner(&self) -> &EdgeBgpConfigData {
        &self.data
    }

    fn client(&self) -> &VcdClient {
        &self.client
    }
}

fn config(edge_gateway_id: &str) -> CrudConfig {
    CrudConfig::new(endpoints::EDGE_BGP_CONFIG, LABEL).path_param(edge_gateway_id)
}

fn require_gateway(operation: Operation, edge_gateway_id: &str) -> Result<()> {
    if edge_gateway_id.trim().is_empty() {
        return Err(VcdError::invalid(operation, LABEL, "edge gateway id must not be empty"));
    }
    Ok(())
}

impl EdgeBgpConfig {
    /// Read the BGP configuration of `edge_gateway_id`
    pub async fn get(client: &VcdClient, edge_gateway_id: &str) -> Result<Self> {
        require_gateway(Operation::Get, edge_gateway_id)?;
        let handle: Self = get_outer_entity(client, &config(edge_gateway_id)).await?;
        Ok(handle.on_gateway(edge_gateway_id))
    }

    fn on_gateway(mut self, edge_gateway_id: &str) -> Self {
        self.edge_gateway_id = edge_gateway_id.to_string();
        self
    }

    pub fn edge_gateway_id(&self) -> &str {
        &self.edge_gateway_id
    }

    pub fn data(&self) -> &EdgeBgpConfigData {
        &self.data
    }

    pub async fn refresh(&self) -> Result<Self> {
        Self::get(&self.client, &self.edge_gateway_id).await
    }

    /// Replace the configuration and return what the server stored
    pub async fn update(&self, data: &EdgeBgpConfigData) -> Result<Self> {
        require_gateway(Operation::Update, &self.edge_gateway_id)?;
        let stored = put_inner_entity(&self.client, &config(&self.edge_gateway_id), data).await?;
        Ok(Self {
            client: self.client.clone(),
            edge_gateway_id: self.edge_gateway_id.clone(),
            data: stored,
        })
    }

    /// Turn BGP off, keeping the rest of the configuration
    pub async fn disable(&self) -> Result<Self> {
        let mut data = self.data.clone();
        data.enabled = false;
        self.update(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let raw = serde_json::json!({
            "enabled": true,
            "ecmp": false,
            "localASNumber": "65000",
            "gracefulRestart": {"mode": "HELPER_ONLY", "restartTimer": 180, "staleRouteTimer": 600},
            "version": {"version": 3}
        });
        let data: EdgeBgpConfigData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(data.local_as_number.as_deref(), Some("65000"));
        assert_eq!(data.graceful_restart.as_ref().map(|g| g.mode.as_str()), Some("HELPER_ONLY"));
        assert_eq!(serde_json::to_value(&data).unwrap(), raw);
        assert_eq!(InnerEntity::id(&data), None);
    }

    #[test]
    fn test_config_url_has_gateway() {
        let client = VcdClient::builder("https://vcd.example.com")
            .token("t")
            .api_versions([crate::ApiVersion::new(37, 0)])
            .build()
            .unwrap();
        let url = client
            .endpoint_url(
                &endpoints::EDGE_BGP_CONFIG,
                config("urn:vcloud:gateway:9").path_params(),
                &crate::QueryParams::new(),
                Operation::Get,
                LABEL,
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://vcd.example.com/cloudapi/1.0.0/edgeGateways/urn:vcloud:gateway:9/routing/bgp"
        );
    }
}
