use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, DataPaths};
use crate::writer::CommitMode;

#[derive(Parser, Debug)]
#[command(name = "polar-bear-telemetry")]
#[command(version, about = "Load polar bear ear-tag telemetry into SQLite and browse it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the deployments and statuses tables from the CSV files
    Ingest {
        /// Deployments CSV
        #[arg(long, default_value = config::DEPLOYMENTS_CSV)]
        deployments: PathBuf,

        /// Status CSV
        #[arg(long, default_value = config::STATUSES_CSV)]
        statuses: PathBuf,

        /// SQLite database path
        #[arg(long, default_value = config::DATABASE)]
        db: PathBuf,

        /// Commit after every row, or once per table
        #[arg(long, value_enum, default_value_t = CommitMode::PerRow)]
        commit: CommitMode,

        /// Show a full-screen progress dashboard
        #[arg(long)]
        tui: bool,
    },

    /// Serve the read-only HTML view
    Serve {
        /// SQLite database path
        #[arg(long, default_value = config::DATABASE)]
        db: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = config::LISTEN_ADDR)]
        addr: String,
    },

    /// List all deployments
    Deployments {
        /// SQLite database path
        #[arg(long, default_value = config::DATABASE)]
        db: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one deployment and its statuses
    Deployment {
        /// Deployment surrogate key (deploy_id)
        id: i64,

        /// SQLite database path
        #[arg(long, default_value = config::DATABASE)]
        db: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Extract the CSV files from a downloaded dataset zip
    Unpack {
        /// Dataset zip file
        archive: PathBuf,

        /// Destination directory
        #[arg(short, long, default_value = config::DATASET_DIR)]
        dest: PathBuf,

        /// Show a full-screen progress dashboard
        #[arg(long)]
        tui: bool,
    },

    /// Print the table DDL
    Schema,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Paths for `ingest`, from its flags
pub fn ingest_paths(deployments: PathBuf, statuses: PathBuf, db: PathBuf) -> DataPaths {
    DataPaths {
        deployments,
        statuses,
        database: db,
    }
}
