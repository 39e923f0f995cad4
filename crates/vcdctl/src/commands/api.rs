//! Raw API access commands for direct endpoint calls

use super::CommandContext;
use crate::cli::HttpMethod;
use crate::error::{Result as CliResult, VcdCtlError};
use crate::output::OutputFormat;
use serde_json::{Value, json};
use tracing::debug;
use vcd_core::{ApiRequest, ApiVersion, MediaType, Operation, VcdClient, VcdError};

const ENTITY: &str = "api";

/// Parameters for API command execution
pub struct ApiCommandParams<'a> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub data: Option<&'a str>,
    pub min_version: &'a str,
}

/// Handle raw API commands
pub async fn handle_api_command(ctx: &CommandContext<'_>, params: ApiCommandParams<'_>) -> CliResult<()> {
    let min_version: ApiVersion = params.min_version.parse().map_err(|e| VcdCtlError::InvalidInput {
        message: format!("--min-version: {e}"),
    })?;
    let body = params.data.map(read_body).transpose()?;

    let client = ctx.client().await?;
    let mut request = build_request(&client, params.method, params.path, min_version)?;
    if let Some(body) = body {
        request = request.body(serde_json::to_vec(&body)?);
    }

    let response = client
        .execute(operation_for(params.method), ENTITY, request)
        .await?;

    let value = if response.is_task() {
        json!({ "status": response.status, "task": response.location })
    } else if response.body.is_empty() {
        json!({ "status": response.status })
    } else {
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => value,
            Err(_) => Value::String(response.text()),
        }
    };

    ctx.print(value, ctx.output.or(OutputFormat::Json))
}

/// Map a user path to a request
///
/// `/api/...` paths go to the legacy API with the legacy media type; all
/// others are relative to `cloudapi/` and negotiate a version of at least
/// `min_version`.
pub fn build_request(
    client: &VcdClient,
    method: HttpMethod,
    path: &str,
    min_version: ApiVersion,
) -> CliResult<ApiRequest> {
    let trimmed = path.trim().trim_start_matches('/');

    if trimmed == "api" || trimmed.starts_with("api/") {
        let url = client.resolve_href(&format!("/{trimmed}"))?;
        debug!("Legacy API call {} {}", method, url);
        return Ok(ApiRequest::new(method.into(), url)
            .version(client.legacy_version())
            .media(MediaType::Legacy));
    }

    let relative = trimmed.strip_prefix("cloudapi/").unwrap_or(trimmed);
    if relative.is_empty() {
        return Err(VcdCtlError::InvalidInput {
            message: "an API path is required, e.g. 1.0.0/orgs".to_string(),
        });
    }
    let version = client
        .versions()
        .negotiate(operation_for(method), ENTITY, relative, min_version, client.max_api_version())?;
    let url = client.base_url().join(relative).map_err(VcdError::from)?;
    debug!("OpenAPI call {} {} (version {})", method, url, version);

    Ok(ApiRequest::new(method.into(), url).version(version))
}

fn operation_for(method: HttpMethod) -> Operation {
    match method {
        HttpMethod::Get => Operation::Get,
        HttpMethod::Post => Operation::Create,
        HttpMethod::Put => Operation::Update,
        HttpMethod::Delete => Operation::Delete,
    }
}

/// Parse `--data`: inline JSON, or `@path` to read a file
fn read_body(data: &str) -> CliResult<Value> {
    let raw = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| VcdCtlError::FileError {
            path: path.to_string(),
            message: e.to_string(),
        })?,
        None => data.to_string(),
    };
    serde_json::from_str(&raw).map_err(|e| VcdCtlError::InvalidInput {
        message: format!("request body is not valid JSON: {e}"),
    })
}
