//! draftfix: the remediation CLI
//!
//! # Usage
//!
//! ```bash
//! # Remediate a JSON batch of code units (file or stdin)
//! draftfix remediate units.json --pretty
//!
//! # Return rewritten code instead of per-statement metadata
//! draftfix --mode rewrite remediate units.json
//!
//! # Check a single ABAP source file
//! draftfix scan zbilling_f01.abap
//!
//! # Serve POST /remediate-array
//! draftfix serve --bind 127.0.0.1:8080
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use draftfix::prelude::*;
use draftfix::server::Server;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "draftfix")]
#[command(version)]
#[command(about = "Add the DRAFT filter to ABAP SELECT * reads of VBRK/VBRP", long_about = None)]
#[command(after_help = "EXAMPLES:
    draftfix remediate units.json --pretty
    draftfix --mode rewrite remediate units.json -o remediated.json
    draftfix scan zbilling_f01.abap
    draftfix serve --bind 127.0.0.1:8080")]
struct Cli {
    /// Config file (default: ./draftfix.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output mode, overrides the config file
    #[arg(short, long, value_enum, global = true, env = "DRAFTFIX_MODE")]
    mode: Option<OutputMode>,

    /// Flatten suggested statements to a single line
    #[arg(long, global = true)]
    normalize: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remediate a JSON array of code units
    Remediate {
        /// Input file, stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Report SELECT * statements in an ABAP source file
    Scan {
        /// ABAP source file
        file: PathBuf,

        /// Write the remediated source back to the file
        #[arg(long)]
        write: bool,
    },
    /// Serve the remediation endpoint over HTTP
    Serve {
        /// Bind address, overrides the config file
        #[arg(short, long, env = "DRAFTFIX_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "draftfix=debug,tower_http=debug"
    } else if matches!(cli.command, Commands::Serve { .. }) {
        "draftfix=info,tower_http=info"
    } else {
        "draftfix=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = RemediatorConfig::load(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if cli.normalize {
        config.normalize_whitespace = true;
    }

    match cli.command {
        Commands::Remediate {
            input,
            output,
            pretty,
        } => remediate(config, input.as_deref(), output.as_deref(), pretty),
        Commands::Scan { file, write } => scan(config, &file, write),
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            Server::new(config).serve().await?;
            Ok(())
        }
    }
}

fn remediate(
    config: RemediatorConfig,
    input: Option<&Path>,
    output: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let content = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let units: Vec<CodeUnit> = serde_json::from_str(&content)
        .map_err(|e| DraftfixError::invalid(e.to_string()))
        .context("Batch rejected")?;

    let results = Remediator::new(config).process_batch(&units);
    let json = if pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {} result(s) to {}", "✓".green(), results.len(), path.display().to_string().cyan());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

fn scan(config: RemediatorConfig, file: &Path, write: bool) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let analysis = Remediator::new(config).analyze(&code);

    println!(
        "{} {} SELECT * statement(s), {} need the draft filter",
        file.display().to_string().white().bold(),
        analysis.records.len().to_string().cyan(),
        analysis.suggestion_count().to_string().yellow()
    );
    if analysis.records.is_empty() {
        return Ok(());
    }
    println!("{}", "─".repeat(72).dimmed());

    let mut chars = code.chars();
    let mut consumed = 0;
    let mut line = 1;
    for record in &analysis.records {
        line += chars
            .by_ref()
            .take(record.start_char_in_unit - consumed)
            .filter(|c| *c == '\n')
            .count();
        consumed = record.start_char_in_unit;
        let status = match &record.suggested_statement {
            Some(_) => "needs filter".yellow(),
            None if is_governed(&record.table) => "ok".green(),
            None => "not governed".dimmed(),
        };
        println!(
            "  L{:<6} {:8} {:4} {:30} {}",
            line,
            record.table.white(),
            record.target_type.to_string().cyan(),
            record.target_name,
            status
        );
        if let Some(ref stmt) = record.suggested_statement {
            println!("          {} {}", "→".dimmed(), normalize_whitespace(stmt).green());
        }
    }

    if write && analysis.suggestion_count() > 0 {
        std::fs::write(file, &analysis.remediated_code)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        println!();
        println!("{} Rewrote {}", "✓".green(), file.display().to_string().cyan());
    }
    Ok(())
}
