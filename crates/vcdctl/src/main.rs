use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcd_core::Config;

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::CommandContext;
use connection::ConnectionManager;
use error::VcdCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = match &cli.config_file {
        Some(config_file) => {
            let path = std::path::PathBuf::from(config_file);
            debug!("Loading config from explicit path: {:?}", path);
            Config::load_from_path(&path).map(|config| (config, Some(path)))
        }
        None => {
            debug!("Loading config from default location");
            Config::load().map(|config| (config, None))
        }
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            VcdCtlError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let mut conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &mut conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "vcdctl=warn,vcd_core=warn",
            1 => "vcdctl=info,vcd_core=info",
            2 => "vcdctl=debug,vcd_core=debug",
            _ => "vcdctl=trace,vcd_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &mut ConnectionManager) -> Result<(), VcdCtlError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            let format = cli.output.or(output::OutputFormat::Table);
            if format.is_structured() {
                let output_data = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                });
                output::print_output(output_data, format, cli.query.as_deref()).map_err(|e| {
                    VcdCtlError::OutputError {
                        message: format!("{e:#}"),
                    }
                })
            } else {
                println!("vcdctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
        Commands::Profile(profile_cmd) => {
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }
        command => {
            let ctx = CommandContext {
                conn_mgr: &*conn_mgr,
                profile: cli.profile.as_deref(),
                output: cli.output,
                query: cli.query.as_deref(),
            };
            execute_server_command(&ctx, command).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

async fn execute_server_command(ctx: &CommandContext<'_>, command: &Commands) -> Result<(), VcdCtlError> {
    match command {
        Commands::Api {
            method,
            path,
            data,
            min_version,
        } => {
            let params = commands::api::ApiCommandParams {
                method: *method,
                path,
                data: data.as_deref(),
                min_version,
            };
            commands::api::handle_api_command(ctx, params).await
        }
        Commands::Task(task_cmd) => commands::task::handle_task_command(ctx, task_cmd).await,
        Commands::Catalog(cmd) => commands::catalog::handle_catalog_command(ctx, cmd).await,
        Commands::Role(cmd) => commands::role::handle_role_command(ctx, cmd).await,
        Commands::IpSpace(cmd) => commands::ip_space::handle_ip_space_command(ctx, cmd).await,
        Commands::Version | Commands::Profile(_) => Ok(()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Api { method, path, .. } => format!("api {} {}", method, path),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                cli::ProfileCommands::Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Task(_) => "task wait".to_string(),
        Commands::Catalog(_) => "catalog".to_string(),
        Commands::Role(_) => "role".to_string(),
        Commands::IpSpace(_) => "ip-space".to_string(),
        Commands::Version => "version".to_string(),
    }
}
