//! CLI entry point for rs_siggen
//!
//! Opens one signal generator from the configuration, runs a single command
//! and closes the session again.
//!
//! # Usage
//!
//! ```bash
//! rs_siggen --simulate set rf_frequency 1.5e9
//! rs_siggen get rf_level
//! rs_siggen upload ./qpsk.wv /var/user/
//! rs_siggen recall 3
//! RS_SIGGEN_DRIVER__MODEL=SMW200A rs_siggen identify
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rs_siggen::attribute::Attribute;
use rs_siggen::config::{SiggenConfig, DEFAULT_CONFIG_PATH};
use rs_siggen::driver::SmDriver;
use rs_siggen::error::DriverError;
use rs_siggen::traits::MassMemory;
use rs_siggen::{logging, InstrumentModel};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rs_siggen")]
#[command(about = "Control Rohde & Schwarz SM-series signal generators", long_about = None)]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulated instrument instead of the configured resource
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read an attribute
    Get {
        /// Attribute key, e.g. rf_frequency
        attribute: String,
    },

    /// Write an attribute
    Set {
        attribute: String,
        value: String,
    },

    /// Copy a local file into instrument mass memory
    Upload {
        file: PathBuf,
        /// Destination directory, e.g. /var/user/
        destination: String,
    },

    /// Delete a file from instrument mass memory
    Delete { path: String },

    /// Store the current settings in a state memory (*SAV)
    Save { index: usize },

    /// Restore settings from a state memory (*RCL)
    Recall { index: usize },

    /// Query *IDN?
    Identify,

    /// Reset the instrument (*RST)
    Reset,

    /// Print static driver metadata without connecting
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SiggenConfig::extract_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if cli.simulate {
        config.driver.simulate = true;
    }
    if matches!(cli.command, Commands::Info) {
        // No connection needed, so the resource may be left unset
        config.driver.simulate = true;
    }
    config.validate()?;
    logging::init(&config.logging);

    let model = config.driver.instrument_model()?;
    if let Commands::Info = cli.command {
        return print_info(model);
    }

    let mut driver = SmDriver::new(model);
    driver
        .initialize_resource(
            &config.driver.resource,
            config.driver.options(),
            config.driver.timeout(),
        )
        .await?;
    info!("Connected: {}", driver.session_info().unwrap_or_default());

    let outcome = run(&mut driver, cli.command).await;
    driver.close().await?;
    outcome
}

async fn run(driver: &mut SmDriver, command: Commands) -> Result<()> {
    match command {
        Commands::Get { attribute } => {
            let attribute: Attribute = attribute.parse()?;
            let value = driver.get(attribute).await?;
            println!("{} = {}", attribute, value);
        }
        Commands::Set { attribute, value } => {
            let attribute: Attribute = attribute.parse()?;
            let kind = attribute.descriptor().kind;
            let parsed = kind.parse_input(&value).ok_or_else(|| DriverError::TypeMismatch {
                attribute: attribute.key().to_string(),
                expected: kind.name(),
            })?;
            driver.set(attribute, parsed).await?;
            println!("{} set to {}", attribute, value);
        }
        Commands::Upload { file, destination } => {
            driver.write_file_to_instrument(&file, &destination).await?;
            println!("Uploaded {} to {}", file.display(), destination);
        }
        Commands::Delete { path } => {
            driver.delete_file_from_instrument(&path).await?;
            println!("Deleted {}", path);
        }
        Commands::Save { index } => {
            driver.save_state(index).await?;
            println!("Settings saved to memory {}", index);
        }
        Commands::Recall { index } => {
            driver.recall_state(index).await?;
            println!("Settings recalled from memory {}", index);
        }
        Commands::Identify => {
            let identity = driver.identify().await?;
            print!("{}", toml::to_string_pretty(&identity)?);
        }
        Commands::Reset => {
            driver.reset().await?;
            println!("Instrument reset");
        }
        Commands::Info => {}
    }
    Ok(())
}

fn print_info(model: InstrumentModel) -> Result<()> {
    let driver = SmDriver::new(model);
    print!("{}", toml::to_string_pretty(driver.profile())?);
    Ok(())
}
