//! prodinfo - list Windows Installer upgrade codes and their products
//!
//! Without an argument every upgrade code is printed with its products.
//! With an upgrade code, only that code's products are printed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use prodinfo::{report, Installer, MemoryStore};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Dump product GUIDs for Windows Installer upgrade codes.
#[derive(Parser, Debug)]
#[command(name = "prodinfo", version)]
struct Cli {
    /// Upgrade code whose products to list; lists all upgrade codes when omitted.
    upgrade_code: Option<Uuid>,

    /// Registry export (.reg) of HKEY_LOCAL_MACHINE to read; may be repeated.
    #[arg(long = "reg", value_name = "FILE", required = true)]
    reg_files: Vec<PathBuf>,

    /// Print the upgrade code a product code is registered under.
    #[arg(long, value_name = "GUID", conflicts_with = "upgrade_code")]
    product: Option<Uuid>,

    /// Print results as JSON.
    #[cfg(feature = "json")]
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Error: failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("prodinfo=warn"))?,
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let store = MemoryStore::from_reg_files(&cli.reg_files)
        .context("failed to load registry exports")?;
    tracing::info!(keys = store.key_count(), "Registry data loaded");

    let installer = Installer::new(&store);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(product) = &cli.product {
        let Some(upgrade) = installer.upgrade_code(product)? else {
            bail!("product code {} is not registered under any upgrade code", product);
        };
        #[cfg(feature = "json")]
        if cli.json {
            return Ok(report::write_json(&mut out, &upgrade)?);
        }
        report::write_upgrade_code(&mut out, &upgrade)?;
    } else if let Some(upgrade) = &cli.upgrade_code {
        let Some(products) = installer.products(upgrade)? else {
            bail!("upgrade code {} is not registered", upgrade);
        };
        #[cfg(feature = "json")]
        if cli.json {
            return Ok(report::write_json(&mut out, &products)?);
        }
        report::write_products(&mut out, &products)?;
    } else {
        let entries = installer.upgrade_codes()?;
        #[cfg(feature = "json")]
        if cli.json {
            return Ok(report::write_json(&mut out, &entries)?);
        }
        report::write_upgrade_codes(&mut out, &entries)?;
    }

    out.flush()?;
    Ok(())
}
