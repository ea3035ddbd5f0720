//! Print the OpenAPI document as JSON or YAML.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write as _};
use std::path::PathBuf;

use clap::Parser;
use lifelink::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "openapi-dump",
    about = "Print the LifeLink OpenAPI document",
    version
)]
struct CliArgs {
    /// Emit YAML instead of pretty-printed JSON.
    #[arg(long)]
    yaml: bool,
    /// Write to this file instead of standard output.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
}

fn render(yaml: bool) -> io::Result<String> {
    let doc = ApiDoc::openapi();
    if yaml {
        doc.to_yaml()
            .map_err(|error| io::Error::other(format!("render YAML: {error}")))
    } else {
        doc.to_pretty_json()
            .map_err(|error| io::Error::other(format!("render JSON: {error}")))
    }
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let rendered = render(args.yaml)?;
    match args.output {
        Some(path) => std::fs::write(path, rendered),
        None => writeln!(io::stdout().lock(), "{rendered}"),
    }
}
