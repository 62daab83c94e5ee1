use csv::StringRecord;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::schema_gen::{
    generate_create_table, generate_drop_table, generate_indexes, generate_insert,
};
use crate::config::DataPaths;
use crate::error::{IngestError, Result};
use crate::parser::{parse_deployment, parse_status, HeaderIndex};
use crate::schema::{DependencyResolver, TableSchema, DEPLOYMENTS, STATUSES};
use crate::ui::{Phase, Ui};

/// Rows between progress updates
const PROGRESS_INTERVAL: u64 = 250;

/// How inserts are grouped into transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CommitMode {
    /// Every row commits on its own; rows before a failure stay committed
    #[default]
    #[value(name = "row")]
    PerRow,
    /// Each table rebuild is a single transaction; a failure keeps the old table
    #[value(name = "table")]
    PerTable,
}

/// Counters for one loaded table
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadStats {
    pub table: &'static str,
    pub rows_read: u64,
    pub inserted: u64,
    /// Status rows dropped for a blank latitude
    pub skipped: u64,
    /// BearIDs that matched more than one deployment
    pub ambiguous_bear_ids: Vec<i64>,
}

impl LoadStats {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }
}

/// Result of a full ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub deployments: LoadStats,
    pub statuses: LoadStats,
    pub elapsed_secs: f64,
}

pub struct SqliteWriter {
    conn: Connection,
    mode: CommitMode,
}

impl SqliteWriter {
    /// Open (or create) the store. Existing tables are replaced only when loaded.
    pub fn open(db_path: &Path, mode: CommitMode) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn, mode)
    }

    pub fn from_connection(conn: Connection, mode: CommitMode) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn, mode })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace the deployments table (and drop statuses, which would be orphaned)
    pub fn load_deployments<R: Read>(
        &mut self,
        file: &str,
        source: R,
        total: u64,
        ui: &mut impl Ui,
    ) -> Result<LoadStats> {
        let mut reader = csv_reader(source);
        let index = HeaderIndex::resolve(file, reader.headers()?, &DEPLOYMENTS)?;

        ui.set_phase(Phase::LoadingDeployments);
        let stats = self.run(|conn| {
            rebuild_table(conn, &DEPLOYMENTS)?;
            insert_deployments(conn, &index, &mut reader, total, ui)
        })?;

        ui.log(format!("{}: {} records", DEPLOYMENTS.name, stats.inserted));
        Ok(stats)
    }

    /// Replace the statuses table. Deployments must already be loaded.
    pub fn load_statuses<R: Read>(
        &mut self,
        file: &str,
        source: R,
        total: u64,
        ui: &mut impl Ui,
    ) -> Result<LoadStats> {
        let mut reader = csv_reader(source);
        let index = HeaderIndex::resolve(file, reader.headers()?, &STATUSES)?;

        ui.set_phase(Phase::LoadingStatuses);
        let stats = self.run(|conn| {
            rebuild_table(conn, &STATUSES)?;
            insert_statuses(conn, &index, &mut reader, total, ui)
        })?;

        ui.log(format!(
            "{}: {} records, {} skipped (blank latitude)",
            STATUSES.name, stats.inserted, stats.skipped
        ));
        for bear_id in &stats.ambiguous_bear_ids {
            ui.warn(format!(
                "BearID {} matches several deployments; statuses linked to the first",
                bear_id
            ));
        }
        Ok(stats)
    }

    pub fn load_deployments_file(&mut self, path: &Path, ui: &mut impl Ui) -> Result<LoadStats> {
        let total = count_data_rows(path)?;
        let file = open_source(path)?;
        self.load_deployments(&path.display().to_string(), file, total, ui)
    }

    pub fn load_statuses_file(&mut self, path: &Path, ui: &mut impl Ui) -> Result<LoadStats> {
        let total = count_data_rows(path)?;
        let file = open_source(path)?;
        self.load_statuses(&path.display().to_string(), file, total, ui)
    }

    /// Refresh planner statistics and leave WAL mode.
    ///
    /// A rollback-journal file can be opened read-only without creating
    /// `-wal`/`-shm` siblings next to it.
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA optimize;
             PRAGMA journal_mode = DELETE;",
        )?;
        Ok(())
    }

    fn run<T>(&mut self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match self.mode {
            CommitMode::PerRow => f(&self.conn),
            CommitMode::PerTable => {
                let tx = self.conn.transaction()?;
                let out = f(&tx)?;
                tx.commit()?;
                Ok(out)
            }
        }
    }
}

/// Drop `schema` and everything that references it, then recreate `schema`
pub fn rebuild_table(conn: &Connection, schema: &TableSchema) -> Result<()> {
    let resolver = DependencyResolver::new();
    for table in resolver.drop_order(schema.name).map_err(IngestError::Schema)? {
        debug!(table = table.name, "dropping table");
        conn.execute(&generate_drop_table(table), [])?;
    }

    conn.execute(&generate_create_table(schema), [])?;
    for index_sql in generate_indexes(schema) {
        conn.execute(&index_sql, [])?;
    }
    Ok(())
}

fn insert_deployments<R: Read>(
    conn: &Connection,
    index: &HeaderIndex,
    reader: &mut csv::Reader<R>,
    total: u64,
    ui: &mut impl Ui,
) -> Result<LoadStats> {
    let mut stmt = conn.prepare(&generate_insert(&DEPLOYMENTS))?;
    let mut stats = LoadStats::new(DEPLOYMENTS.name);
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        stats.rows_read += 1;
        let line = record_line(&record);
        let row = parse_deployment(index, &record, line)?;

        stmt.execute(params![
            row.bear_id,
            row.ptt_id,
            row.capture_lat,
            row.capture_long,
            row.sex,
            row.age_class,
            row.ear_applied,
        ])?;
        stats.inserted += 1;

        if stats.rows_read % PROGRESS_INTERVAL == 0 {
            ui.set_progress(stats.rows_read, total, DEPLOYMENTS.name);
        }
    }

    ui.set_progress(stats.rows_read, total, DEPLOYMENTS.name);
    Ok(stats)
}

fn insert_statuses<R: Read>(
    conn: &Connection,
    index: &HeaderIndex,
    reader: &mut csv::Reader<R>,
    total: u64,
    ui: &mut impl Ui,
) -> Result<LoadStats> {
    let mut stmt = conn.prepare(&generate_insert(&STATUSES))?;
    let mut stats = LoadStats::new(STATUSES.name);
    let mut lookup = BearLookup::default();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        stats.rows_read += 1;
        let line = record_line(&record);

        let row = match parse_status(index, &record, line)? {
            Some(row) => row,
            None => {
                debug!(file = index.file(), line, "skipping status with blank latitude");
                stats.skipped += 1;
                continue;
            }
        };

        let deployment_id = lookup.resolve(conn, index.file(), line, row.bear_id)?;

        stmt.execute(params![
            row.bear_id,
            row.received,
            row.latitude,
            row.longitude,
            row.temperature,
            deployment_id,
        ])?;
        stats.inserted += 1;

        if stats.rows_read % PROGRESS_INTERVAL == 0 {
            ui.set_progress(stats.rows_read, total, STATUSES.name);
        }
    }

    ui.set_progress(stats.rows_read, total, STATUSES.name);
    stats.ambiguous_bear_ids = lookup.ambiguous;
    Ok(stats)
}

/// Resolves a BearID to a deployment surrogate key, remembering answers.
///
/// When several deployments share a BearID the lowest key wins and the
/// BearID is reported once.
#[derive(Default)]
struct BearLookup {
    resolved: HashMap<i64, i64>,
    ambiguous: Vec<i64>,
}

impl BearLookup {
    fn resolve(&mut self, conn: &Connection, file: &str, line: u64, bear_id: i64) -> Result<i64> {
        if let Some(id) = self.resolved.get(&bear_id) {
            return Ok(*id);
        }

        let mut stmt = conn.prepare_cached(
            "SELECT deploy_id FROM deployments WHERE BearID = ?1 ORDER BY deploy_id",
        )?;
        let keys = stmt
            .query_map([bear_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;

        let first = match keys.first() {
            Some(id) => *id,
            None => {
                return Err(IngestError::Resolution {
                    file: file.to_string(),
                    line,
                    bear_id,
                })
            }
        };

        if keys.len() > 1 {
            warn!(
                bear_id,
                deployments = ?keys,
                chosen = first,
                "BearID matches several deployments"
            );
            self.ambiguous.push(bear_id);
        }

        self.resolved.insert(bear_id, first);
        Ok(first)
    }
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source)
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// Non-header line count, used as the progress total
fn count_data_rows(path: &Path) -> Result<u64> {
    let mut lines: u64 = 0;
    for line in BufReader::new(open_source(path)?).lines() {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

/// Rebuild both tables from the two source files
pub fn ingest(paths: &DataPaths, mode: CommitMode, ui: &mut impl Ui) -> Result<IngestSummary> {
    let start = Instant::now();

    ui.set_phase(Phase::Preparing);
    ui.set_info(format!("Store: {}", paths.database.display()));
    info!(db = %paths.database.display(), ?mode, "opening store");
    let mut writer = SqliteWriter::open(&paths.database, mode)?;

    let deployments = writer.load_deployments_file(&paths.deployments, ui)?;
    info!(rows = deployments.inserted, "deployments loaded");

    let statuses = writer.load_statuses_file(&paths.statuses, ui)?;
    info!(
        rows = statuses.inserted,
        skipped = statuses.skipped,
        "statuses loaded"
    );

    writer.finalize()?;
    ui.clear_progress();

    Ok(IngestSummary {
        deployments,
        statuses,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
