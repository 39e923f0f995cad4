//! Generic CRUD engine over OpenAPI endpoints
//!
//! Every resource in [`crate::resources`] is a pair of types: an
//! [`InnerEntity`] (the wire schema) and an [`OuterEntity`] (a handle that
//! owns one inner value plus the client it came from). The functions here
//! do all of the HTTP work for such pairs:
//!
//! 1. negotiate the API version for the endpoint (fails before any request)
//! 2. render the URL from the endpoint template, path params and query
//! 3. send the request and classify non-2xx answers
//! 4. follow pagination or wait for a `202 Accepted` task as needed
//! 5. decode into the inner type and wrap it
//!
//! Adding a resource means declaring an [`Endpoint`](crate::Endpoint) and
//! the two types; no resource module builds requests by hand.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::client::{ApiRequest, ApiResponse, VcdClient};
use crate::config::TaskWaitConfig;
use crate::endpoint::Endpoint;
use crate::error::{Operation, Result, VcdError};
use crate::query::{Filter, QueryParams};
use crate::retry::BusyRetryPolicy;
use crate::task::{Task, TaskWaitOptions, wait_task_completion};
use crate::version::ApiVersion;

/// Wire representation of a resource
pub trait InnerEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Server-assigned id (usually a URN); `None` before creation
    fn id(&self) -> Option<&str>;

    /// Display name, for resources that have one
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Client-side handle around one [`InnerEntity`]
pub trait OuterEntity: Sized {
    type Inner: InnerEntity;

    fn wrap(client: VcdClient, inner: Self::Inner) -> Self;

    fn inner(&self) -> &Self::Inner;

    fn client(&self) -> &VcdClient;

    fn id(&self) -> Option<&str> {
        self.inner().id()
    }
}

/// Per-call settings for the CRUD functions
///
/// Built fresh for every call; the builder methods consume and return it.
#[derive(Debug, Clone)]
pub struct CrudConfig {
    endpoint: Endpoint,
    entity: String,
    path_params: Vec<String>,
    query: QueryParams,
    headers: Vec<(String, String)>,
    cancel: Option<CancellationToken>,
    task_wait: Option<TaskWaitConfig>,
}

impl CrudConfig {
    /// `entity` is the label used in error messages ("Catalog", "IP Space")
    pub fn new(endpoint: Endpoint, entity: impl Into<String>) -> Self {
        Self {
            endpoint,
            entity: entity.into(),
            path_params: Vec::new(),
            query: QueryParams::new(),
            headers: Vec::new(),
            cancel: None,
            task_wait: None,
        }
    }

    /// Append a path parameter; placeholders are filled first, the rest
    /// become trailing segments
    #[must_use]
    pub fn path_param(mut self, param: impl Into<String>) -> Self {
        self.path_params.push(param.into());
        self
    }

    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Override the client's default task wait for this call
    #[must_use]
    pub fn task_wait(mut self, task_wait: TaskWaitConfig) -> Self {
        self.task_wait = Some(task_wait);
        self
    }

    /// The same call aimed at item `id`, without list query parameters
    #[must_use]
    pub fn item(&self, id: impl Into<String>) -> Self {
        let mut item = self.clone();
        item.path_params.push(id.into());
        item.query = QueryParams::new();
        item
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn path_params(&self) -> &[String] {
        &self.path_params
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// True when the params go past the template placeholders, i.e. an id is present
    fn targets_item(&self) -> bool {
        self.path_params.len() > self.endpoint.placeholders()
    }

    fn url(&self, client: &VcdClient, query: &QueryParams, operation: Operation) -> Result<Url> {
        client.endpoint_url(&self.endpoint, &self.path_params, query, operation, &self.entity)
    }

    fn request(&self, method: Method, url: Url, version: ApiVersion) -> ApiRequest {
        ApiRequest::new(method, url)
            .version(version)
            .headers(self.headers.iter().cloned())
            .cancel_on(self.cancel.clone())
    }

    fn wait_options(&self, client: &VcdClient) -> TaskWaitOptions {
        let config = self.task_wait.as_ref().unwrap_or(client.task_wait());
        let options = TaskWaitOptions::from_config(config);
        match &self.cancel {
            Some(token) => options.with_cancellation(token.clone()),
            None => options,
        }
    }
}

/// One page of an OpenAPI list response
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default)]
    result_total: Option<u64>,
    #[serde(default)]
    page_count: Option<u32>,
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

fn encode<B: Serialize + ?Sized>(operation: Operation, entity: &str, body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| {
        VcdError::invalid(operation, entity, format!("cannot encode request body: {e}"))
    })
}

/// Task referenced by a `202 Accepted` response
fn accepted_task(response: &ApiResponse) -> Task {
    let location = response.location.clone().unwrap_or_default();
    match serde_json::from_slice::<Task>(&response.body) {
        Ok(mut task) => {
            if task.href.is_empty() {
                task.href = location;
            }
            task
        }
        Err(_) => Task::from_href(location),
    }
}

async fn wait_for(
    client: &VcdClient,
    config: &CrudConfig,
    operation: Operation,
    response: &ApiResponse,
) -> Result<Task> {
    let task = accepted_task(response);
    debug!(entity = config.entity(), %operation, task = task.label(), "waiting for task");
    wait_task_completion(client, &task, config.wait_options(client))
        .await
        .map_err(|e| e.waited_by(operation, &config.entity))
}

/// POST `body` to the collection and return the created entity
///
/// An asynchronous endpoint is waited on and the entity is then fetched by
/// the task's owner id.
pub async fn create_inner_entity<I, B>(client: &VcdClient, config: &CrudConfig, body: &B) -> Result<I>
where
    I: InnerEntity,
    B: Serialize + ?Sized,
{
    let operation = Operation::Create;
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;
    let url = config.url(client, &config.query, operation)?;
    let payload = encode(operation, &config.entity, body)?;

    let response = client
        .execute(
            operation,
            &config.entity,
            config.request(Method::POST, url, version).body(payload),
        )
        .await?;

    if response.is_task() {
        let task = wait_for(client, config, operation, &response).await?;
        let id = task.owner_id().ok_or_else(|| VcdError::RequestFailed {
            operation,
            entity: config.entity.clone(),
            status: response.status,
            detail: format!("task '{}' finished without an owner id", task.label()),
            api_error: None,
        })?;
        return get_inner_entity(client, &config.item(id)).await;
    }

    response.json(operation, &config.entity)
}

/// [`create_inner_entity`] wrapped into an outer handle
pub async fn create_outer_entity<O, B>(client: &VcdClient, config: &CrudConfig, body: &B) -> Result<O>
where
    O: OuterEntity,
    B: Serialize + ?Sized,
{
    let inner = create_inner_entity::<O::Inner, B>(client, config, body).await?;
    Ok(O::wrap(client.clone(), inner))
}

/// POST `body` and return the task without waiting for it
///
/// Fails with `InvalidParameters` when the endpoint turns out to answer
/// synchronously.
pub async fn create_inner_entity_async<B>(
    client: &VcdClient,
    config: &CrudConfig,
    body: &B,
) -> Result<Task>
where
    B: Serialize + ?Sized,
{
    let operation = Operation::Create;
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;
    let url = config.url(client, &config.query, operation)?;
    let payload = encode(operation, &config.entity, body)?;

    let response = client
        .execute(
            operation,
            &config.entity,
            config.request(Method::POST, url, version).body(payload),
        )
        .await?;

    if !response.is_task() {
        return Err(VcdError::invalid(
            operation,
            &config.entity,
            format!(
                "endpoint '{}' answered synchronously (HTTP {}); no task to return",
                config.endpoint, response.status
            ),
        ));
    }
    Ok(accepted_task(&response))
}

/// GET the URL described by `config` (normally an item URL from [`CrudConfig::item`])
pub async fn get_inner_entity<I: InnerEntity>(client: &VcdClient, config: &CrudConfig) -> Result<I> {
    let operation = Operation::Get;
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;
    let url = config.url(client, &config.query, operation)?;

    let response = client
        .execute(
            operation,
            &config.entity,
            config.request(Method::GET, url, version),
        )
        .await?;
    response.json(operation, &config.entity)
}

pub async fn get_outer_entity<O: OuterEntity>(client: &VcdClient, config: &CrudConfig) -> Result<O> {
    let inner = get_inner_entity::<O::Inner>(client, config).await?;
    Ok(O::wrap(client.clone(), inner))
}

/// GET every page of the collection
///
/// Pages `1..=pageCount` are requested in order; a page with no values ends
/// the walk early.
pub async fn get_all_inner_entities<I: InnerEntity>(
    client: &VcdClient,
    config: &CrudConfig,
) -> Result<Vec<I>> {
    let operation = Operation::List;
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;

    let mut all = Vec::new();
    let mut page_number = 1;
    loop {
        let url = config.url(client, &config.query.for_page(page_number), operation)?;
        let response = client
            .execute(
                operation,
                &config.entity,
                config.request(Method::GET, url, version),
            )
            .await?;
        let page: Page<I> = response.json(operation, &config.entity)?;
        let page_count = page.page_count.unwrap_or(1);
        trace!(
            entity = config.entity(),
            page = page_number,
            page_count,
            total = page.result_total,
            values = page.values.len(),
            "list page"
        );

        let empty = page.values.is_empty();
        all.extend(page.values);
        if empty || page_number >= page_count {
            break;
        }
        page_number += 1;
    }

    debug!(entity = config.entity(), count = all.len(), "listed entities");
    Ok(all)
}

pub async fn get_all_outer_entities<O: OuterEntity>(
    client: &VcdClient,
    config: &CrudConfig,
) -> Result<Vec<O>> {
    let inners = get_all_inner_entities::<O::Inner>(client, config).await?;
    Ok(inners
        .into_iter()
        .map(|inner| O::wrap(client.clone(), inner))
        .collect())
}

/// Find exactly one entity named `name`
///
/// The server filter `name==<name>` narrows the list; the result is then
/// matched exactly. No match is `EntityNotFound`, more than one is
/// `AmbiguousResult`.
pub async fn get_inner_entity_by_name<I: InnerEntity>(
    client: &VcdClient,
    config: &CrudConfig,
    name: &str,
) -> Result<I> {
    if name.is_empty() {
        return Err(VcdError::invalid(
            Operation::Get,
            &config.entity,
            "name must not be empty",
        ));
    }

    let filtered = config
        .clone()
        .query(config.query.clone().filter(Filter::eq("name", name)));
    let mut matches: Vec<I> = get_all_inner_entities::<I>(client, &filtered)
        .await?
        .into_iter()
        .filter(|entity| entity.name() == Some(name))
        .collect();

    match matches.len() {
        0 => Err(VcdError::EntityNotFound {
            operation: Operation::Get,
            entity: config.entity.clone(),
            detail: format!("no entity named '{name}'"),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(VcdError::AmbiguousResult {
            operation: Operation::Get,
            entity: config.entity.clone(),
            name: name.to_string(),
            count,
        }),
    }
}

pub async fn get_outer_entity_by_name<O: OuterEntity>(
    client: &VcdClient,
    config: &CrudConfig,
    name: &str,
) -> Result<O> {
    let inner = get_inner_entity_by_name::<O::Inner>(client, config, name).await?;
    Ok(O::wrap(client.clone(), inner))
}

/// PUT the full representation of `body` to its item URL
///
/// `body.id()` must be set; an empty id fails locally without any request.
pub async fn update_inner_entity<I: InnerEntity>(
    client: &VcdClient,
    config: &CrudConfig,
    body: &I,
) -> Result<I> {
    let id = body.id().filter(|id| !id.trim().is_empty()).ok_or_else(|| {
        VcdError::invalid(Operation::Update, &config.entity, "entity has no id")
    })?;
    put_inner_entity(client, &config.item(id), body).await
}

pub async fn update_outer_entity<O: OuterEntity>(
    client: &VcdClient,
    config: &CrudConfig,
    body: &O::Inner,
) -> Result<O> {
    let inner = update_inner_entity::<O::Inner>(client, config, body).await?;
    Ok(O::wrap(client.clone(), inner))
}

/// PUT `body` to exactly the URL described by `config`
///
/// Used directly for single-object endpoints that have no id of their own
/// (for example an edge gateway's BGP configuration). An asynchronous
/// answer is waited on and the URL is read back.
pub async fn put_inner_entity<I: InnerEntity>(
    client: &VcdClient,
    config: &CrudConfig,
    body: &I,
) -> Result<I> {
    let operation = Operation::Update;
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;
    let url = config.url(client, &config.query, operation)?;
    let payload = encode(operation, &config.entity, body)?;

    let response = client
        .execute(
            operation,
            &config.entity,
            config.request(Method::PUT, url, version).body(payload),
        )
        .await?;

    if response.is_task() {
        wait_for(client, config, operation, &response).await?;
        return get_inner_entity(client, &config.clone().query(QueryParams::new())).await;
    }

    response.json(operation, &config.entity)
}

/// DELETE the item described by `config`; waits if the server answers with a task
///
/// `config` must carry the id (see [`CrudConfig::item`]).
pub async fn delete_entity_by_id(client: &VcdClient, config: &CrudConfig) -> Result<()> {
    let operation = Operation::Delete;
    if !config.targets_item() {
        return Err(VcdError::invalid(
            operation,
            &config.entity,
            "no entity id given",
        ));
    }
    let version = client.negotiate(&config.endpoint, operation, &config.entity)?;
    let url = config.url(client, &config.query, operation)?;

    let response = client
        .execute(
            operation,
            &config.entity,
            config.request(Method::DELETE, url, version),
        )
        .await?;

    if response.is_task() {
        wait_for(client, config, operation, &response).await?;
    }
    Ok(())
}

/// [`delete_entity_by_id`] retried while the server reports the entity busy
pub async fn delete_entity_by_id_with_retry(
    client: &VcdClient,
    config: &CrudConfig,
    policy: &BusyRetryPolicy,
) -> Result<()> {
    policy
        .run(Operation::Delete, &config.entity, config.cancellation(), || {
            delete_entity_by_id(client, config)
        })
        .await
}
