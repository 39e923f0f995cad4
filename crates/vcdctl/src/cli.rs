//! CLI structure and command definitions
//!
//! Three layers, as in the SDK:
//! 1. Raw API access (`api`)
//! 2. Resource commands (`catalog`, `role`, `ip-space`)
//! 3. Task handling (`task wait`)

use clap::{Parser, Subcommand};

pub use crate::output::OutputFormat;

/// VMware Cloud Director command-line client
#[derive(Parser, Debug)]
#[command(name = "vcdctl")]
#[command(version, about = "VMware Cloud Director management CLI")]
#[command(long_about = "
VMware Cloud Director management CLI

EXAMPLES:
    # Set up a tenant profile with an API token
    vcdctl profile set lab --url https://vcd.example.com --org acme --token TOKEN

    # Set up a provider profile (password is prompted when needed)
    vcdctl profile set admin --url https://vcd.example.com --org System --username administrator

    # List catalogs as a table, or JSON for scripting
    vcdctl catalog list
    vcdctl catalog list -o json

    # Filter output with JMESPath
    vcdctl ip-space list -q '[?type==`PUBLIC`].name'

    # Direct OpenAPI access
    vcdctl api get 1.0.0/orgs
    vcdctl api get /api/versions

For more help on a specific command, run:
    vcdctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "VCDCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "VCDCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raw API access - direct OpenAPI endpoint calls
    #[command(after_help = "EXAMPLES:
    # Paths are relative to <host>/cloudapi/
    vcdctl api get 1.0.0/orgs

    # Paths starting with /api/ go to the legacy API
    vcdctl api get /api/versions

    # POST with inline JSON or from a file
    vcdctl api post 1.0.0/roles --data '{\"name\":\"viewer\",\"description\":\"read only\"}'
    vcdctl api post 1.0.0/catalogs --data @catalog.json

    # Require a minimum API version for the call
    vcdctl api get 1.0.0/ipSpaces --min-version 37.1
")]
    Api {
        /// HTTP method
        #[arg(value_enum, ignore_case = true)]
        method: HttpMethod,

        /// API path
        path: String,

        /// Request body as JSON, or @file to read it from a file
        #[arg(long)]
        data: Option<String>,

        /// Lowest API version the endpoint exists in
        #[arg(long, default_value = "31.0")]
        min_version: String,
    },

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Server task operations
    #[command(subcommand)]
    Task(TaskCommands),

    /// Catalog operations
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Role operations
    #[command(subcommand)]
    Role(RoleCommands),

    /// IP Space operations
    #[command(subcommand)]
    IpSpace(IpSpaceCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

/// HTTP methods accepted by `vcdctl api`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    # Tenant profile with an API token
    vcdctl profile set lab --url https://vcd.example.com --org acme --token TOKEN

    # Provider profile; the password is prompted at connect time if omitted
    vcdctl profile set admin --url https://vcd.example.com --org System \\
        --username administrator

    # Lab install with a self-signed certificate, capped at API 37.2
    vcdctl profile set old-lab --url https://10.0.0.5 --org acme --token TOKEN \\
        --insecure --max-api-version 37.2
")]
    Set {
        /// Profile name
        name: String,

        /// VCD URL, e.g. https://vcd.example.com
        #[arg(long)]
        url: String,

        /// Organization to log into ('System' for provider)
        #[arg(long)]
        org: String,

        /// API token
        #[arg(long, conflicts_with = "username")]
        token: Option<String>,

        /// Username for session login
        #[arg(long, required_unless_present = "token")]
        username: Option<String>,

        /// Password for session login
        #[arg(long, requires = "username")]
        password: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Never negotiate an API version above this one
        #[arg(long)]
        max_api_version: Option<String>,

        /// Store the token or password in the OS keyring
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name
        name: String,
    },
}

/// Task commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Wait for a task to finish
    #[command(after_help = "EXAMPLES:
    vcdctl task wait https://vcd.example.com/api/task/5f2e...
    vcdctl task wait /api/task/5f2e... --timeout 60 --interval 1000
")]
    Wait {
        /// Task href (absolute or host-relative)
        href: String,

        /// Give up after this many seconds (profile setting by default)
        #[arg(long)]
        timeout: Option<u64>,

        /// Poll interval in milliseconds (profile setting by default)
        #[arg(long)]
        interval: Option<u64>,
    },
}

/// Catalog commands
#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List catalogs
    #[command(visible_alias = "ls")]
    List {
        /// Server-side filter, e.g. 'isPublished==true'
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show one catalog by name or URN
    Get {
        /// Catalog name or URN
        catalog: String,
    },

    /// Delete a catalog
    #[command(visible_alias = "rm")]
    Delete {
        /// Catalog name or URN
        catalog: String,

        /// Delete even if the catalog is in use
        #[arg(long)]
        force: bool,

        /// Delete contained items too
        #[arg(long)]
        recursive: bool,
    },
}

/// Role commands
#[derive(Subcommand, Debug)]
pub enum RoleCommands {
    /// List roles
    #[command(visible_alias = "ls")]
    List {
        /// Server-side filter, e.g. 'readOnly==false'
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show one role by name or URN
    Get {
        /// Role name or URN
        role: String,
    },
}

/// IP Space commands
#[derive(Subcommand, Debug)]
pub enum IpSpaceCommands {
    /// List IP Spaces
    #[command(visible_alias = "ls")]
    List {
        /// Only spaces of this type (PUBLIC, SHARED_SERVICES, PRIVATE)
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Show one IP Space by name or URN
    Get {
        /// IP Space name or URN
        ip_space: String,

        /// Owning organization URN, for PRIVATE spaces sharing a name
        #[arg(long)]
        org_id: Option<String>,
    },
}
