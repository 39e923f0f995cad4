//! Role command implementations

use super::{CommandContext, is_urn};
use crate::cli::RoleCommands;
use crate::error::Result as CliResult;
use crate::output::OutputFormat;
use serde_json::json;
use vcd_core::{Filter, QueryParams, Role, RoleData};

pub async fn handle_role_command(ctx: &CommandContext<'_>, command: &RoleCommands) -> CliResult<()> {
    let client = ctx.client().await?;
    match command {
        RoleCommands::List { filter } => {
            let mut query = QueryParams::new().sort_asc("name");
            if let Some(expr) = filter {
                query = query.filter(Filter::raw(expr.as_str()));
            }
            let roles = Role::list(&client, query).await?;
            let data: Vec<&RoleData> = roles.iter().map(Role::data).collect();
            ctx.print_list(&data, || {
                data.iter()
                    .map(|r| {
                        json!({
                            "name": r.name,
                            "id": r.id,
                            "readOnly": r.read_only.unwrap_or(false),
                            "description": r.description,
                        })
                    })
                    .collect()
            })
        }
        RoleCommands::Get { role } => {
            let role = if is_urn(role) {
                Role::get_by_id(&client, role).await?
            } else {
                Role::get_by_name(&client, role).await?
            };
            ctx.print(role.data(), ctx.output.or(OutputFormat::Json))
        }
    }
}
