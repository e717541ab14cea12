//! unified-waf CLI tool.
//!
//! Exit status: 0 when every payload is allowed, 1 when any is blocked,
//! 2 when the rules or the input cannot be read.

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use unified_waf::audit::format_stack;
use unified_waf::{Error, Firewall, Inspection, Result};

#[derive(Parser)]
#[command(name = "unified-waf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a payload (or each line of stdin)
    Inspect {
        /// Path to a rules file replacing the built-in tables
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Payload to inspect; read from stdin when omitted
        payload: Option<String>,
    },

    /// Check that a rules file loads
    Check {
        /// Path to rules file
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Inspect {
            rules,
            json,
            payload,
        } => inspect_payloads(rules.as_deref(), json, payload),
        Commands::Check { rules } => check_rules(&rules).map(|()| false),
    };

    match outcome {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn load_firewall(rules: Option<&Path>) -> Result<Firewall> {
    match rules {
        Some(path) => {
            info!("Loading rules from {:?}", path);
            Firewall::from_file(path)
        }
        None => Ok(Firewall::new()),
    }
}

/// Returns whether any payload was blocked.
fn inspect_payloads(rules: Option<&Path>, json: bool, payload: Option<String>) -> Result<bool> {
    let firewall = load_firewall(rules)?;

    let payloads: Vec<String> = match payload {
        Some(p) => vec![p],
        None => read_payloads(std::io::stdin().lock())?,
    };

    let mut any_blocked = false;
    for payload in &payloads {
        let result = firewall.inspect(payload);
        info!("{}", result.format_log());
        any_blocked |= result.is_blocked();

        if json {
            match serde_json::to_string_pretty(&result) {
                Ok(s) => println!("{}", s),
                Err(e) => error!("failed to serialize report: {}", e),
            }
        } else {
            print_report(&result);
        }
    }

    Ok(any_blocked)
}

/// Split input into non-empty lines. Invalid UTF-8 is replaced rather than
/// rejected so that every line still gets inspected.
fn read_payloads(reader: impl BufRead) -> Result<Vec<String>> {
    let mut payloads = Vec::new();
    for line in reader.split(b'\n') {
        let line = line.map_err(|source| Error::ReadInput { source })?;
        let text = String::from_utf8_lossy(&line);
        let line = text.trim_end_matches('\r');
        if !line.trim().is_empty() {
            payloads.push(line.to_string());
        }
    }
    Ok(payloads)
}

fn print_report(result: &Inspection) {
    println!("{}", result.payload);
    println!("  RESULT: {}", result.verdict);

    println!("  Structural log:");
    if result.structural_log.is_empty() {
        println!("    (no brackets/tags to validate)");
    }
    for entry in &result.structural_log {
        println!("    {}", entry);
    }
    let final_stack = if result.final_stack.is_empty() {
        "empty".to_string()
    } else {
        format_stack(&result.final_stack)
    };
    println!(
        "  Final stack: [{}] {}",
        final_stack,
        if result.structurally_valid { "valid" } else { "invalid" }
    );

    println!("  Signature log:");
    if result.signature_log.is_empty() {
        println!("    (no malicious patterns detected)");
    }
    for entry in &result.signature_log {
        println!("    {}", entry);
    }
}

fn check_rules(path: &Path) -> Result<()> {
    info!("Checking rules from {:?}", path);

    let firewall = Firewall::from_file(path)?;

    println!("Successfully loaded rules from {}", path.display());
    println!("  Substitutions: {}", firewall.substitutions().len());
    for (from, to) in firewall.substitutions().entries() {
        println!("    {} -> {}", from, to);
    }
    println!("  Signatures: {}", firewall.signatures().len());
    println!("  Match policy: {}", firewall.policy().name());
    Ok(())
}
