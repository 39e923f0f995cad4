//! Catalog command implementations

use super::{CommandContext, is_urn};
use crate::cli::CatalogCommands;
use crate::error::Result as CliResult;
use crate::output::OutputFormat;
use colored::Colorize;
use serde_json::{Value, json};
use vcd_core::{Catalog, CatalogData, Filter, QueryParams, VcdClient};

pub async fn handle_catalog_command(ctx: &CommandContext<'_>, command: &CatalogCommands) -> CliResult<()> {
    let client = ctx.client().await?;
    match command {
        CatalogCommands::List { filter } => {
            let mut query = QueryParams::new().sort_asc("name");
            if let Some(expr) = filter {
                query = query.filter(Filter::raw(expr.as_str()));
            }
            let catalogs = Catalog::list(&client, query).await?;
            let data: Vec<&CatalogData> = catalogs.iter().map(Catalog::data).collect();
            ctx.print_list(&data, || data.iter().map(|c| summary(c)).collect())
        }
        CatalogCommands::Get { catalog } => {
            let catalog = lookup(&client, catalog).await?;
            ctx.print(catalog.data(), ctx.output.or(OutputFormat::Json))
        }
        CatalogCommands::Delete {
            catalog,
            force,
            recursive,
        } => {
            let found = lookup(&client, catalog).await?;
            found.delete_with(*force, *recursive).await?;
            if ctx.output.is_structured() {
                ctx.print(json!({ "deleted": found.id() }), ctx.output)
            } else {
                println!("{} Catalog '{}' deleted", "✓".green(), found.data().name);
                Ok(())
            }
        }
    }
}

async fn lookup(client: &VcdClient, name_or_id: &str) -> CliResult<Catalog> {
    let catalog = if is_urn(name_or_id) {
        Catalog::get_by_id(client, name_or_id).await?
    } else {
        Catalog::get_by_name(client, name_or_id).await?
    };
    Ok(catalog)
}

fn summary(catalog: &CatalogData) -> Value {
    json!({
        "name": catalog.name,
        "id": catalog.id,
        "org": catalog.org,
        "published": catalog.is_published.unwrap_or(false),
        "templates": catalog.number_of_vapp_templates.unwrap_or(0),
        "media": catalog.number_of_media.unwrap_or(0),
    })
}
