//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the scan API.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands, DiffFormat, ScanFormat, TreeFormat};
pub use presentation::{format_diff_json, format_diff_text};
pub use route::RunContext;
