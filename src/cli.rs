use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vfsbox")]
#[command(about = "VfsBox CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a URI through the handler chain
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// URI to resolve, e.g. asset:/index.js
    pub uri: String,

    /// Use the callback path instead of the synchronous one
    #[arg(long = "async")]
    pub use_async: bool,

    /// Directory served by the asset handler
    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// Configuration file, overrides VFSBOX_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Request metadata as NAME=VALUE, sent as headers by the network handler
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Write the payload to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
