use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dpsync")]
#[command(about = "Declarative configuration sync for the HAProxy Data Plane API")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Context name from ~/.dpsync/config
    #[arg(short, long, global = true)]
    pub context: Option<String>,

    /// Data Plane API URL, overriding the context
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Basic-auth username, overriding the context
    #[arg(long, global = true, value_name = "NAME")]
    pub user: Option<String>,

    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to a .env file for loading credentials
    #[arg(long, global = true, value_name = "FILE")]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the live configuration version
    Version,

    /// Probe the endpoint for reachability and credentials
    Check,

    /// List configured contexts
    Contexts,
}

// ============================================================================
// Pure display logic (no I/O - returns formatted strings)
// ============================================================================

use crate::client::ApiInfo;
use crate::context::Config;

/// Format the context list for display.
/// Pure function - returns a formatted string.
pub fn format_contexts(config: &Config) -> String {
    let mut output = String::new();

    if config.contexts.is_empty() {
        output.push_str("No contexts configured.\n");
        output.push_str("Add one to ~/.dpsync/config to get started.\n");
        return output;
    }

    for name in crate::context::list_contexts(config) {
        let marker = if config.current_context.as_deref() == Some(name) {
            "*"
        } else {
            " "
        };
        let ctx = &config.contexts[name];
        output.push_str(&format!(
            "{} {} -> {} ({})\n",
            marker, name, ctx.url, ctx.username
        ));
        if let Some(ref desc) = ctx.description {
            output.push_str(&format!("      {}\n", desc));
        }
    }

    output
}

/// Format a runtime pass report, one line per attempted change.
/// Pure function - returns a formatted string.
pub fn format_runtime_report(report: &crate::apply::RuntimeReport) -> String {
    let mut output = String::new();

    for result in &report.results {
        match &result.outcome {
            Ok(()) => output.push_str(&format!("ok   {}\n", result.description)),
            Err(e) => output.push_str(&format!("FAIL {}\n", e)),
        }
    }
    output.push_str(&format!(
        "{}/{} change(s) applied\n",
        report.applied(),
        report.results.len()
    ));

    output
}

/// Format the result of a `check` probe.
/// Pure function - returns a formatted string.
pub fn format_check(url: &str, info: &ApiInfo) -> String {
    let version = info
        .api
        .as_ref()
        .and_then(|a| a.version.as_deref())
        .unwrap_or("unknown");
    format!("{} reachable, Data Plane API version {}", url, version)
}
