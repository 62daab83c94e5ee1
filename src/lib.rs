pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod query;
pub mod schema;
pub mod ui;
pub mod web;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::DataPaths;
pub use error::IngestError;
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
pub use writer::{ingest, CommitMode, IngestSummary};
