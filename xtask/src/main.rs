// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use errata_error::{BaseKind, registry};
use schemars::schema_for;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the JSON Schema for the runtime configuration file.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
    /// List the built-in error catalog.
    Codes {
        /// Output format.
        #[arg(long, value_enum, default_value_t = CodesFormat::Text)]
        format: CodesFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodesFormat {
    Text,
    Json,
}

/// One catalog row as printed by `xtask codes`.
#[derive(Debug, Serialize)]
struct CodeRow {
    code: String,
    kinds: Vec<BaseKind>,
    required_args: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema { out_dir } => schema(&out_dir),
        Command::Codes { format } => {
            print!("{}", codes(format)?);
            Ok(())
        }
    }
}

fn schema(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("create schema output dir")?;

    let config = schema_for!(errata_config::ErrataConfig);
    write_schema(&out_dir.join("errata_config.schema.json"), &config)?;

    eprintln!("wrote schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let s = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn catalog_rows() -> Vec<CodeRow> {
    let registry = registry();
    registry
        .codes()
        .into_iter()
        .map(|code| CodeRow {
            kinds: registry.kinds_of(code.as_str()).unwrap_or_default(),
            required_args: registry
                .store()
                .get(code.as_str())
                .map_or(0, |t| t.required_args()),
            code: code.as_str().to_string(),
        })
        .collect()
}

fn codes(format: CodesFormat) -> Result<String> {
    let rows = catalog_rows();
    match format {
        CodesFormat::Json => Ok(serde_json::to_string_pretty(&rows)? + "\n"),
        CodesFormat::Text => {
            let width = rows.iter().map(|r| r.code.len()).max().unwrap_or(0);
            let mut out = String::new();
            for row in &rows {
                let kinds: Vec<&str> = row.kinds.iter().map(|k| k.name()).collect();
                out.push_str(&format!(
                    "{:<width$}  {}  args={}\n",
                    row.code,
                    kinds.join(","),
                    row.required_args
                ));
            }
            Ok(out)
        }
    }
}
