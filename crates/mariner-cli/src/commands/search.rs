//! Search command handler.

use anyhow::Result;

use mariner_lib::ReferenceData;

use crate::output::{render_ports, OutputFormat};

/// Handle the search subcommand: ranked free-text lookup over the port
/// table, truncated to `limit` matches.
pub fn run(data: &ReferenceData, format: OutputFormat, query: &str, limit: usize) -> Result<()> {
    let matches = data.ports.search(query, limit);
    render_ports(query, &matches, format)
}
