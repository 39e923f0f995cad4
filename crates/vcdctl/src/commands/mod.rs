//! Command implementations

pub mod api;
pub mod catalog;
pub mod ip_space;
pub mod profile;
pub mod role;
pub mod task;

use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, VcdCtlError};
use crate::output::{OutputFormat, print_output};
use serde::Serialize;
use vcd_core::VcdClient;

/// Global options shared by every command that talks to a server
pub struct CommandContext<'a> {
    pub conn_mgr: &'a ConnectionManager,
    pub profile: Option<&'a str>,
    pub output: OutputFormat,
    pub query: Option<&'a str>,
}

impl CommandContext<'_> {
    pub async fn client(&self) -> CliResult<VcdClient> {
        self.conn_mgr.create_client(self.profile).await
    }

    /// Print full entities for structured output or queries, `summary` rows otherwise
    pub fn print_list<T, S>(&self, full: &[T], summary: S) -> CliResult<()>
    where
        T: Serialize,
        S: FnOnce() -> Vec<serde_json::Value>,
    {
        let format = self.output.or(OutputFormat::Table);
        if format.is_structured() || self.query.is_some() {
            self.print(full, format)
        } else {
            self.print(summary(), format)
        }
    }

    pub fn print<T: Serialize>(&self, data: T, format: OutputFormat) -> CliResult<()> {
        print_output(data, format, self.query).map_err(|e| VcdCtlError::OutputError {
            message: format!("{e:#}"),
        })
    }
}

/// True for VCD URNs such as `urn:vcloud:catalog:<uuid>`
pub fn is_urn(value: &str) -> bool {
    value.starts_with("urn:vcloud:")
}
