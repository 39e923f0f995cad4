//! # vcd-core
//!
//! Client library for the VMware Cloud Director OpenAPI.
//!
//! The crate is built around three pieces that every resource shares:
//!
//! - **Endpoints and versions** ([`Endpoint`], [`ApiVersion`]): an endpoint
//!   is a path template under `<host>/cloudapi/` with the minimum API
//!   version it exists in. Each request negotiates the highest version both
//!   sides support.
//! - **Generic CRUD** ([`crud`]): create, read, list, look up by name,
//!   update and delete for any [`InnerEntity`], including transparent
//!   handling of pagination and of asynchronous (`202 Accepted`) answers.
//! - **Task polling** ([`task`]): wait for server tasks with a timeout,
//!   a poll interval, optional cancellation and progress callbacks.
//!
//! Typed wrappers for a set of resources live in [`resources`], profile and
//! credential handling in [`config`].
//!
//! # Example
//!
//! ```rust,no_run
//! use vcd_core::{Catalog, CatalogData, VcdClient};
//!
//! # async fn example() -> vcd_core::Result<()> {
//! let client = VcdClient::builder("https://vcd.example.com")
//!     .credentials("admin", "secret", "tenant-1")
//!     .connect()
//!     .await?;
//!
//! let catalog = Catalog::create(&client, &CatalogData::new("images")).await?;
//! let same = Catalog::get_by_name(&client, "images").await?;
//! assert_eq!(catalog.id(), same.id());
//! catalog.delete().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crud;
pub mod endpoint;
pub mod endpoints;
pub mod error;
pub mod query;
pub mod resources;
pub mod retry;
pub mod task;
pub mod upload;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{ApiRequest, ApiResponse, MediaType, TenantContext, VcdClient, VcdClientBuilder};
pub use config::{BusyRetryConfig, Config, ConfigError, Profile, TaskWaitConfig};
pub use crud::{
    CrudConfig, InnerEntity, OuterEntity, create_inner_entity, create_inner_entity_async,
    create_outer_entity, delete_entity_by_id, delete_entity_by_id_with_retry,
    get_all_inner_entities, get_all_outer_entities, get_inner_entity, get_inner_entity_by_name,
    get_outer_entity, get_outer_entity_by_name, put_inner_entity, update_inner_entity,
    update_outer_entity,
};
pub use endpoint::{Endpoint, EndpointError};
pub use error::{ApiErrorBody, Operation, Result, VcdError};
pub use query::{Filter, QueryParams};
pub use resources::{
    AppPort, AppPortProfile, AppPortProfileData, BgpGracefulRestart, Catalog, CatalogData,
    ConnectionType, EdgeBgpConfig, EdgeBgpConfigData, FirewallGroup, FirewallGroupData,
    FirewallGroupType, IpRange, IpSpace, IpSpaceData, IpSpaceType, Org, OrgData, OrgVdcNetwork,
    OrgVdcNetworkData, OrgVdcNetworkType, PortProfileScope, PortProtocol, Role, RoleData, Subnet,
    UnknownVariant,
};
pub use retry::{BusyRetryPolicy, BusyTrigger};
pub use task::{
    EntityRef, ProgressCallback, ProgressEvent, Task, TaskStatus, TaskWaitOptions, fetch_task,
    wait_task_completion, wait_task_completion_with_timeout,
};
pub use upload::{UploadHandle, UploadOptions, UploadProgress, show_upload_progress, spawn_upload};
pub use version::{ApiVersion, ServerVersions};
