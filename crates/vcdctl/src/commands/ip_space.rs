//! IP Space command implementations

use super::{CommandContext, is_urn};
use crate::cli::IpSpaceCommands;
use crate::error::{Result as CliResult, VcdCtlError};
use crate::output::OutputFormat;
use serde_json::{Value, json};
use vcd_core::{Filter, IpSpace, IpSpaceData, IpSpaceType, QueryParams};

pub async fn handle_ip_space_command(ctx: &CommandContext<'_>, command: &IpSpaceCommands) -> CliResult<()> {
    match command {
        IpSpaceCommands::List { kind } => {
            let mut query = QueryParams::new().sort_asc("name");
            if let Some(raw) = kind {
                let kind: IpSpaceType = raw.parse().map_err(|e: vcd_core::UnknownVariant| {
                    VcdCtlError::InvalidInput { message: e.to_string() }
                })?;
                query = query.filter(Filter::eq("type", kind.as_str()));
            }
            let client = ctx.client().await?;
            let spaces = IpSpace::list(&client, query).await?;
            let data: Vec<&IpSpaceData> = spaces.iter().map(IpSpace::data).collect();
            ctx.print_list(&data, || data.iter().map(|s| summary(s)).collect())
        }
        IpSpaceCommands::Get { ip_space, org_id } => {
            let client = ctx.client().await?;
            let space = match (is_urn(ip_space), org_id) {
                (true, _) => IpSpace::get_by_id(&client, ip_space).await?,
                (false, Some(org)) => IpSpace::get_by_name_in_org(&client, ip_space, org).await?,
                (false, None) => IpSpace::get_by_name(&client, ip_space).await?,
            };
            ctx.print(space.data(), ctx.output.or(OutputFormat::Json))
        }
    }
}

fn summary(space: &IpSpaceData) -> Value {
    let ranges = space
        .ip_space_ranges
        .as_ref()
        .map_or(0, |r| r.ip_ranges.len());
    json!({
        "name": space.name,
        "id": space.id,
        "type": space.kind.as_str(),
        "org": space.org_ref,
        "internalScope": space.ip_space_internal_scope,
        "ranges": ranges,
    })
}
