#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `firemap`: submit, edit and browse community fire reports from one device.
//!
//! State lives in the configured data directory. When a feed path is
//! configured, new reports are also published there and `sync` pulls reports
//! from other devices.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{CONFIG_ENV, FiremapConfig};

#[derive(Parser)]
#[command(name = "firemap", about = "Community wildfire report tool")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new report from this device
    Submit {
        /// Incident kind: fire, smoke, evacuation or `road_closure`
        #[arg(long = "type")]
        report_type: String,
        /// Severity: low, moderate, high or extreme
        #[arg(long)]
        severity: String,
        /// What is happening (10 to 1000 characters)
        #[arg(long)]
        description: String,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Optional phone number or email (at most 100 characters)
        #[arg(long)]
        contact: Option<String>,
        /// Display name shown on the report
        #[arg(long)]
        reporter: Option<String>,
        /// Skip cooldown, quota and duplicate checks. Requires an operator
        /// token in `FIREMAP_OPERATOR_TOKEN`.
        #[arg(long, requires = "operator")]
        bypass: bool,
        /// Operator name recorded in the audit log for `--bypass`
        #[arg(long, requires = "bypass")]
        operator: Option<String>,
    },
    /// Edit one of the visible reports
    Update {
        /// Report id
        id: String,
        /// New incident kind
        #[arg(long = "type")]
        report_type: Option<String>,
        /// New severity
        #[arg(long)]
        severity: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Mark the incident ongoing (`true`) or resolved (`false`)
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove expired reports
    Prune,
    /// List visible reports with their state and advisories
    List,
    /// Show today's submission count and cooldown
    Quota,
    /// Merge reports from the shared feed
    Sync,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = FiremapConfig::load(cli.config.as_deref())?;
    let mut book = commands::open_book(&config)?;

    match cli.command {
        Commands::Submit {
            report_type,
            severity,
            description,
            lat,
            lng,
            contact,
            reporter,
            bypass,
            operator,
        } => {
            let fields = firemap_reporting::lifecycle::ReportFields {
                report_type,
                severity,
                description,
                latitude: lat,
                longitude: lng,
                contact_info: contact,
                reporter,
            };
            let operator = if bypass { operator } else { None };
            commands::submit(&mut book, &config, fields, operator.as_deref())?;
        }
        Commands::Update {
            id,
            report_type,
            severity,
            description,
            active,
        } => {
            let patch = firemap_reporting::lifecycle::ReportPatch {
                report_type,
                severity,
                description,
                is_active: active,
            };
            commands::update(&mut book, &id, patch)?;
        }
        Commands::Prune => commands::prune(&mut book)?,
        Commands::List => commands::list(&book),
        Commands::Quota => commands::quota(&book),
        Commands::Sync => commands::sync(&mut book)?,
    }

    Ok(())
}
