//! Fixed locations for the source files, the store and the web listener.
//!
//! Every CLI flag defaults to one of these, so running with no flags from the
//! dataset's parent directory reads and writes the usual locations.

use std::path::PathBuf;

/// Directory the USGS dataset archive unpacks into
pub const DATASET_DIR: &str = "PolarBear_Telemetry_southernBeaufortSea_2009_2011";

pub const DEPLOYMENTS_CSV: &str =
    "PolarBear_Telemetry_southernBeaufortSea_2009_2011/USGS_WC_eartag_deployments_2009-2011.csv";

pub const STATUSES_CSV: &str =
    "PolarBear_Telemetry_southernBeaufortSea_2009_2011/USGS_WC_eartags_output_files_2009-2011-Status.csv";

pub const DATABASE: &str = "polar_bear_data.db";

pub const LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Where ingestion reads from and writes to
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub deployments: PathBuf,
    pub statuses: PathBuf,
    pub database: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            deployments: PathBuf::from(DEPLOYMENTS_CSV),
            statuses: PathBuf::from(STATUSES_CSV),
            database: PathBuf::from(DATABASE),
        }
    }
}
