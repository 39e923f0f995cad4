//! Authenticated VCD session and raw request execution
//!
//! [`VcdClient`] is the one shared handle every CRUD call and task wait goes
//! through. It is immutable once built and cheap to clone, so concurrent
//! calls can share it freely.
//!
//! # Example
//!
//! ```rust,no_run
//! use vcd_core::VcdClient;
//!
//! # async fn example() -> vcd_core::Result<()> {
//! let client = VcdClient::builder("https://vcd.example.com")
//!     .credentials("administrator", "secret", "System")
//!     .connect()
//!     .await?;
//! println!("server speaks up to {:?}", client.versions().highest());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::config::{BusyRetryConfig, Profile, ResolvedAuth, TaskWaitConfig};
use crate::endpoint::Endpoint;
use crate::endpoints;
use crate::error::{Operation, Result, VcdError};
use crate::query::QueryParams;
use crate::version::{ApiVersion, ServerVersions};

/// Response header carrying the bearer token after login
pub const ACCESS_TOKEN_HEADER: &str = "X-VMWARE-VCLOUD-ACCESS-TOKEN";
/// Organization (UUID) a provider acts on behalf of
pub const TENANT_CONTEXT_HEADER: &str = "X-VMWARE-VCLOUD-TENANT-CONTEXT";
/// Organization name matching [`TENANT_CONTEXT_HEADER`]
pub const AUTH_CONTEXT_HEADER: &str = "X-VMWARE-VCLOUD-AUTH-CONTEXT";

/// Version used for legacy-API calls (tasks) when the server advertised nothing
const FALLBACK_LEGACY_VERSION: ApiVersion = ApiVersion::new(36, 0);

/// Label used in errors raised while setting up the session
const SESSION: &str = "session";

/// Organization a provider session acts on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    org_id: String,
    org_name: String,
}

impl TenantContext {
    /// `org_id` may be a bare UUID or a `urn:vcloud:org:<uuid>` URN
    pub fn new(org_id: impl Into<String>, org_name: impl Into<String>) -> Self {
        let org_id = org_id.into();
        let org_id = org_id
            .strip_prefix("urn:vcloud:org:")
            .map(str::to_string)
            .unwrap_or(org_id);
        Self {
            org_id,
            org_name: org_name.into(),
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    pub(crate) fn headers(&self) -> [(String, String); 2] {
        [
            (TENANT_CONTEXT_HEADER.to_string(), self.org_id.clone()),
            (AUTH_CONTEXT_HEADER.to_string(), self.org_name.clone()),
        ]
    }
}

/// Which `Accept` media type family a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/json;version=X`, used by `cloudapi/` endpoints
    OpenApi,
    /// `application/*+json;version=X`, used by `api/` endpoints such as tasks
    Legacy,
}

impl MediaType {
    fn accept(self, version: ApiVersion) -> String {
        match self {
            MediaType::OpenApi => format!("application/json;version={version}"),
            MediaType::Legacy => format!("application/*+json;version={version}"),
        }
    }
}

/// One HTTP round trip against the API
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    version: Option<ApiVersion>,
    media: MediaType,
    headers: Vec<(String, String)>,
    body: Option<(reqwest::Body, &'static str)>,
    cancel: Option<CancellationToken>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            version: None,
            media: MediaType::OpenApi,
            headers: Vec::new(),
            body: None,
            cancel: None,
        }
    }

    /// API version to put in the `Accept` header
    #[must_use]
    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn media(mut self, media: MediaType) -> Self {
        self.media = media;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.headers.extend(headers);
        self
    }

    /// Pre-encoded JSON body
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some((body.into(), "application/json"));
        self
    }

    /// Streaming binary body, used for file transfers
    #[must_use]
    pub fn stream_body(mut self, body: reqwest::Body) -> Self {
        self.body = Some((body, "application/octet-stream"));
        self
    }

    /// Abort the round trip when `token` fires
    #[must_use]
    pub fn cancel_on(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// `Location` header, set on `202 Accepted` task responses
    pub location: Option<String>,
    pub body: Bytes,
}

impl ApiResponse {
    /// True for `202 Accepted` with a task `Location`
    pub fn is_task(&self) -> bool {
        self.status == 202 && self.location.is_some()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body, classifying failures as `DecodeFailed`
    pub fn json<T: DeserializeOwned>(&self, operation: Operation, entity: &str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| VcdError::DecodeFailed {
            operation,
            entity: entity.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
struct ClientInner {
    http: reqwest::Client,
    host: Url,
    base: Url,
    token: Option<String>,
    versions: ServerVersions,
    max_version: Option<ApiVersion>,
    tenant: Option<TenantContext>,
    task_wait: TaskWaitConfig,
    busy_retry: BusyRetryConfig,
}

/// Authenticated session handle
#[derive(Debug, Clone)]
pub struct VcdClient {
    inner: Arc<ClientInner>,
}

impl VcdClient {
    pub fn builder(url: impl Into<String>) -> VcdClientBuilder {
        VcdClientBuilder::new(url)
    }

    /// Build and connect a client from a configuration profile
    ///
    /// Environment overrides (`VCD_URL`, `VCD_TOKEN`, ...) are applied.
    pub async fn from_profile(profile: &Profile) -> Result<Self> {
        let resolved = profile.resolve()?;
        let mut builder = VcdClient::builder(resolved.url)
            .insecure(profile.insecure)
            .task_wait(profile.task.clone())
            .busy_retry(profile.busy_retry.clone());
        if let Some(cap) = profile.max_api_version {
            builder = builder.max_api_version(cap);
        }
        builder = match resolved.auth {
            ResolvedAuth::Token(token) => builder.token(token),
            ResolvedAuth::Password {
                username,
                password: Some(password),
            } => builder.credentials(username, password, resolved.org),
            ResolvedAuth::Password { password: None, .. } => {
                return Err(VcdError::invalid(
                    Operation::Login,
                    SESSION,
                    "profile has no password; set one or export VCD_PASSWORD",
                ));
            }
        };
        builder.connect().await
    }

    /// `<host>/cloudapi/`
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// `<host>/`
    pub fn host_url(&self) -> &Url {
        &self.inner.host
    }

    pub fn versions(&self) -> &ServerVersions {
        &self.inner.versions
    }

    pub fn max_api_version(&self) -> Option<ApiVersion> {
        self.inner.max_version
    }

    pub fn tenant(&self) -> Option<&TenantContext> {
        self.inner.tenant.as_ref()
    }

    pub fn task_wait(&self) -> &TaskWaitConfig {
        &self.inner.task_wait
    }

    pub fn busy_retry(&self) -> &BusyRetryConfig {
        &self.inner.busy_retry
    }

    /// A copy of this client acting on behalf of `tenant`
    pub fn with_tenant(&self, tenant: TenantContext) -> Self {
        let mut inner = (*self.inner).clone();
        inner.tenant = Some(tenant);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Highest usable API version for `endpoint`
    ///
    /// `operation` and `entity` label the `UnsupportedEndpoint` error.
    pub fn negotiate(
        &self,
        endpoint: &Endpoint,
        operation: Operation,
        entity: &str,
    ) -> Result<ApiVersion> {
        self.inner.versions.negotiate(
            operation,
            entity,
            endpoint.template(),
            endpoint.min_version(),
            self.inner.max_version,
        )
    }

    /// Version sent to legacy endpoints such as tasks
    pub fn legacy_version(&self) -> ApiVersion {
        self.inner
            .versions
            .negotiate(Operation::Discover, "api", "api", ApiVersion::new(0, 0), self.inner.max_version)
            .unwrap_or(FALLBACK_LEGACY_VERSION)
    }

    /// Render the URL for `endpoint`, mapping template problems to `InvalidParameters`
    pub fn endpoint_url(
        &self,
        endpoint: &Endpoint,
        params: &[String],
        query: &QueryParams,
        operation: Operation,
        entity: &str,
    ) -> Result<Url> {
        endpoint
            .url(&self.inner.base, params, query)
            .map_err(|e| VcdError::invalid(operation, entity, e.to_string()))
    }

    /// Turn an absolute or host-relative href into a URL
    pub fn resolve_href(&self, href: &str) -> Result<Url> {
        match Url::parse(href) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.inner.host.join(href.trim_start_matches('/'))?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Execute one request
    ///
    /// Non-2xx responses are classified with [`VcdError::from_response`].
    /// A fired cancellation token yields `Cancelled`.
    pub async fn execute(
        &self,
        operation: Operation,
        entity: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            url,
            version,
            media,
            headers,
            body,
            cancel,
        } = request;

        let version = version.unwrap_or_else(|| self.legacy_version());
        debug!(%method, %url, %version, "{operation} {entity}");

        let mut builder = self
            .inner
            .http
            .request(method, url)
            .header(ACCEPT, media.accept(version));
        if let Some(token) = &self.inner.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = &self.inner.tenant {
            for (name, value) in tenant.headers() {
                builder = builder.header(name, value);
            }
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some((body, content_type)) = body {
            if let Some(bytes) = body.as_bytes() {
                trace!(body = %String::from_utf8_lossy(bytes), "request body");
            }
            builder = builder.header(CONTENT_TYPE, content_type).body(body);
        }

        let round_trip = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, location, body))
        };

        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(VcdError::cancelled(operation, entity)),
                outcome = round_trip => outcome,
            },
            None => round_trip.await,
        };

        let (status, location, body) = outcome.map_err(|source| VcdError::Transport {
            operation,
            entity: entity.to_string(),
            source,
        })?;
        debug!(status, location = location.as_deref().unwrap_or(""), "response");
        trace!(body = %String::from_utf8_lossy(&body), "response body");

        if !(200..300).contains(&status) {
            return Err(VcdError::from_response(
                operation,
                entity,
                status,
                &String::from_utf8_lossy(&body),
            ));
        }

        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }
}

/// Builder for [`VcdClient`]
#[derive(Debug, Clone)]
pub struct VcdClientBuilder {
    url: String,
    token: Option<String>,
    credentials: Option<(String, String, String)>,
    versions: Option<ServerVersions>,
    max_version: Option<ApiVersion>,
    tenant: Option<TenantContext>,
    insecure: bool,
    timeout: Option<Duration>,
    task_wait: TaskWaitConfig,
    busy_retry: BusyRetryConfig,
}

impl VcdClientBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            credentials: None,
            versions: None,
            max_version: None,
            tenant: None,
            insecure: false,
            timeout: None,
            task_wait: TaskWaitConfig::default(),
            busy_retry: BusyRetryConfig::default(),
        }
    }

    /// Use an existing bearer token instead of logging in
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Log in with `user@org`; org `System` selects the provider session endpoint
    #[must_use]
    pub fn credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        self.credentials = Some((user.into(), password.into(), org.into()));
        self
    }

    /// Skip version discovery and use these versions
    #[must_use]
    pub fn api_versions<I: IntoIterator<Item = ApiVersion>>(mut self, versions: I) -> Self {
        self.versions = Some(ServerVersions::new(versions));
        self
    }

    #[must_use]
    pub fn max_api_version(mut self, cap: ApiVersion) -> Self {
        self.max_version = Some(cap);
        self
    }

    #[must_use]
    pub fn tenant(mut self, tenant: TenantContext) -> Self {
        self.tenant = Some(tenant);
        self
    }

    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Per-request transport timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn task_wait(mut self, task_wait: TaskWaitConfig) -> Self {
        self.task_wait = task_wait;
        self
    }

    #[must_use]
    pub fn busy_retry(mut self, busy_retry: BusyRetryConfig) -> Self {
        self.busy_retry = busy_retry;
        self
    }

    /// Build without any network traffic
    ///
    /// Versions default to none known and the token to none, which makes
    /// this mostly useful together with [`api_versions`](Self::api_versions)
    /// and [`token`](Self::token).
    pub fn build(self) -> Result<VcdClient> {
        let http = self.http_client()?;
        let (host, base) = host_urls(&self.url)?;
        let versions = self.versions.clone().unwrap_or_default();
        let token = self.token.clone();
        Ok(self.finish(http, host, base, versions, token))
    }

    /// Discover versions (unless given) and log in (unless a token was given)
    pub async fn connect(self) -> Result<VcdClient> {
        let http = self.http_client()?;
        let (host, base) = host_urls(&self.url)?;

        let versions = match &self.versions {
            Some(versions) => versions.clone(),
            None => discover_versions(&http, &host).await?,
        };

        let token = match (&self.token, &self.credentials) {
            (Some(token), _) => token.clone(),
            (None, Some((user, password, org))) => {
                login(&http, &base, &versions, self.max_version, user, password, org).await?
            }
            (None, None) => {
                return Err(VcdError::invalid(
                    Operation::Login,
                    SESSION,
                    "no API token or credentials configured",
                ));
            }
        };

        Ok(self.finish(http, host, base, versions, Some(token)))
    }

    fn finish(
        self,
        http: reqwest::Client,
        host: Url,
        base: Url,
        versions: ServerVersions,
        token: Option<String>,
    ) -> VcdClient {
        VcdClient {
            inner: Arc::new(ClientInner {
                http,
                host,
                base,
                token,
                versions,
                max_version: self.max_version,
                tenant: self.tenant,
                task_wait: self.task_wait,
                busy_retry: self.busy_retry,
            }),
        }
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("vcd-core/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.insecure);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|source| VcdError::Transport {
            operation: Operation::Login,
            entity: SESSION.to_string(),
            source,
        })
    }
}

/// `(<host>/, <host>/cloudapi/)` from whatever URL the user configured
fn host_urls(raw: &str) -> Result<(Url, Url)> {
    let mut host = Url::parse(raw.trim())?;
    host.set_path("/");
    host.set_query(None);
    host.set_fragment(None);
    let base = host.join("cloudapi/")?;
    Ok((host, base))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionsDocument {
    #[serde(default)]
    version_info: Vec<VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    version: String,
    #[serde(default)]
    deprecated: bool,
}

/// GET `api/versions`, keeping the non-deprecated versions
async fn discover_versions(http: &reqwest::Client, host: &Url) -> Result<ServerVersions> {
    let url = host.join("api/versions")?;
    debug!(%url, "discovering API versions");

    let transport = |source| VcdError::Transport {
        operation: Operation::Discover,
        entity: SESSION.to_string(),
        source,
    };
    let response = http
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(transport)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(transport)?;
    if !(200..300).contains(&status) {
        return Err(VcdError::from_response(
            Operation::Discover,
            SESSION,
            status,
            &String::from_utf8_lossy(&body),
        ));
    }

    let document: VersionsDocument =
        serde_json::from_slice(&body).map_err(|source| VcdError::DecodeFailed {
            operation: Operation::Discover,
            entity: SESSION.to_string(),
            source,
        })?;
    let versions = ServerVersions::parse(
        document
            .version_info
            .iter()
            .filter(|info| !info.deprecated)
            .map(|info| info.version.as_str()),
    );
    debug!(highest = ?versions.highest(), "server versions discovered");
    Ok(versions)
}

/// POST to the session endpoint with basic auth and read the bearer token header
async fn login(
    http: &reqwest::Client,
    base: &Url,
    versions: &ServerVersions,
    cap: Option<ApiVersion>,
    user: &str,
    password: &str,
    org: &str,
) -> Result<String> {
    let endpoint = if org.eq_ignore_ascii_case("system") {
        endpoints::SESSIONS_PROVIDER
    } else {
        endpoints::SESSIONS
    };
    let version = versions.negotiate(
        Operation::Login,
        SESSION,
        endpoint.template(),
        endpoint.min_version(),
        cap,
    )?;
    let url = endpoint
        .url(base, &[], &QueryParams::new())
        .map_err(|e| VcdError::invalid(Operation::Login, SESSION, e.to_string()))?;
    debug!(%url, user, org, "logging in");

    let transport = |source| VcdError::Transport {
        operation: Operation::Login,
        entity: SESSION.to_string(),
        source,
    };
    let response = http
        .post(url)
        .header(ACCEPT, MediaType::OpenApi.accept(version))
        .basic_auth(format!("{user}@{org}"), Some(password))
        .send()
        .await
        .map_err(transport)?;
    let status = response.status().as_u16();
    let token = response
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(transport)?;

    if !(200..300).contains(&status) {
        return Err(VcdError::from_response(
            Operation::Login,
            SESSION,
            status,
            &String::from_utf8_lossy(&body),
        ));
    }

    token.ok_or_else(|| VcdError::RequestFailed {
        operation: Operation::Login,
        entity: SESSION.to_string(),
        status,
        detail: format!("response carried no {ACCESS_TOKEN_HEADER} header"),
        api_error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_host_urls_strip_path() {
        let (host, base) = host_urls("https://vcd.example.com/tenant/acme?x=1").unwrap();
        assert_eq!(host.as_str(), "https://vcd.example.com/");
        assert_eq!(base.as_str(), "https://vcd.example.com/cloudapi/");
    }

    #[test]
    fn test_tenant_context_strips_urn() {
        let tenant = TenantContext::new("urn:vcloud:org:abc-123", "acme");
        assert_eq!(tenant.org_id(), "abc-123");
        assert_eq!(tenant.org_name(), "acme");
    }

    #[test]
    fn test_negotiate_uses_cap() {
        let client = VcdClient::builder("https://vcd.example.com")
            .api_versions([ApiVersion::new(37, 0), ApiVersion::new(38, 1)])
            .max_api_version(ApiVersion::new(37, 0))
            .build()
            .unwrap();
        assert_eq!(
            client.negotiate(&endpoints::CATALOGS, Operation::Get, "Catalog").unwrap(),
            ApiVersion::new(37, 0)
        );
        let err = client
            .negotiate(&endpoints::IP_SPACES, Operation::List, "IP Space")
            .unwrap_err();
        assert!(err.to_string().starts_with("list IP Space: "), "{err}");
        assert_eq!(client.legacy_version(), ApiVersion::new(37, 0));
    }

    #[test]
    fn test_resolve_href() {
        let client = VcdClient::builder("https://vcd.example.com").build().unwrap();
        assert_eq!(
            client.resolve_href("/api/task/42").unwrap().as_str(),
            "https://vcd.example.com/api/task/42"
        );
        assert_eq!(
            client.resolve_href("https://other.example.com/api/task/1").unwrap().as_str(),
            "https://other.example.com/api/task/1"
        );
    }

    #[tokio::test]
    async fn test_connect_discovers_and_logs_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "versionInfo": [
                    {"version": "36.0", "deprecated": false},
                    {"version": "38.1", "deprecated": false},
                    {"version": "30.0", "deprecated": true}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloudapi/1.0.0/sessions/provider"))
            .and(header("accept", "application/json;version=38.1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).insert_header(ACCESS_TOKEN_HEADER, "tok-1"))
            .expect(1)
            .mount(&server)
            .await;

        let client = VcdClient::builder(server.uri())
            .credentials("administrator", "secret", "System")
            .connect()
            .await
            .unwrap();

        assert_eq!(client.versions().as_slice().len(), 2);
        assert_eq!(client.versions().highest(), Some(ApiVersion::new(38, 1)));
    }

    #[tokio::test]
    async fn test_login_failure_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cloudapi/1.0.0/sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "minorErrorCode": "UNAUTHORIZED",
                "message": "bad credentials"
            })))
            .mount(&server)
            .await;

        let err = VcdClient::builder(server.uri())
            .api_versions([ApiVersion::new(37, 0)])
            .credentials("alice", "wrong", "acme")
            .connect()
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("bad credentials"));
    }

    #[tokio::test]
    async fn test_connect_without_auth_is_invalid() {
        let err = VcdClient::builder("https://vcd.example.com")
            .api_versions([ApiVersion::new(37, 0)])
            .connect()
            .await
            .unwrap_err();
        assert!(err.is_invalid_parameters());
    }

    #[tokio::test]
    async fn test_execute_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cloudapi/1.0.0/orgs/"))
            .and(header("accept", "application/json;version=37.0"))
            .and(header("authorization", "Bearer tok"))
            .and(header(TENANT_CONTEXT_HEADER, "abc"))
            .and(header(AUTH_CONTEXT_HEADER, "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = VcdClient::builder(server.uri())
            .token("tok")
            .api_versions([ApiVersion::new(37, 0)])
            .build()
            .unwrap()
            .with_tenant(TenantContext::new("urn:vcloud:org:abc", "acme"));

        let url = client
            .endpoint_url(&endpoints::ORGS, &[], &QueryParams::new(), Operation::List, "Org")
            .unwrap();
        let version = client.negotiate(&endpoints::ORGS, Operation::List, "Org").unwrap();
        let response = client
            .execute(Operation::List, "Org", ApiRequest::new(Method::GET, url).version(version))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(!response.is_task());
    }

    #[tokio::test]
    async fn test_execute_honours_cancellation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = VcdClient::builder(server.uri()).token("tok").build().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let url = Url::parse(&format!("{}/cloudapi/1.0.0/orgs/", server.uri())).unwrap();
        let err = client
            .execute(
                Operation::List,
                "Org",
                ApiRequest::new(Method::GET, url).cancel_on(Some(token)),
            )
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
