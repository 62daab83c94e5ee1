//! End-to-end ingestion tests against generated CSV files laid out like the
//! USGS eartag exports (extra columns included, fields in their usual
//! positions).
//!
//! A shared fixture is generated once; tests that need to mutate a store get
//! their own scratch database.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use polar_bear_telemetry::query::{deployment_detail, list_deployments, open_read_only};
use polar_bear_telemetry::{ingest, CommitMode, DataPaths, IngestError, SilentUi};

// =============================================================================
// Test Configuration
// =============================================================================

/// Number of random status rows compared field by field
const SAMPLE_SIZE: usize = 25;

/// Random seed for reproducible fixtures and sampling
const RANDOM_SEED: u64 = 42;

/// Generated status rows (before the fixed rows are appended)
const STATUS_ROWS: usize = 300;

const DEPLOYMENTS_HEADER: &str = "BearID,PTT_ID,Capture_date,Capture_time,Tag_type,Collar,\
capture_lat,capture_long,Recapture,Sex,Age_class,Ear_applied";

const STATUSES_HEADER: &str =
    "DeployID,PTT,Received,Quality,Latitude,Longitude,Error,Instr,Battery,Temperature";

/// BearIDs in file order; BearID 7 is the third row and so gets deploy_id 3
const BEAR_IDS: &[i64] = &[20414, 20735, 7, 42, 21358, 20529, 21011, 20966, 21237, 20867];

// =============================================================================
// Fixture
// =============================================================================

#[derive(Debug, Clone)]
struct ExpectedStatus {
    bear_id: i64,
    received: String,
    latitude: f64,
    longitude: f64,
    temperature: f64,
}

struct Fixture {
    _dir: TempDir,
    paths: DataPaths,
    /// Status rows that should be stored, in file order
    admitted: Vec<ExpectedStatus>,
    /// Status rows with a blank latitude
    skipped: usize,
}

static FIXTURE: Lazy<Fixture> = Lazy::new(Fixture::new);

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let deployments = dir.path().join("deployments.csv");
        let statuses = dir.path().join("statuses.csv");

        fs::write(&deployments, deployments_csv(BEAR_IDS)).expect("Failed to write deployments");

        let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
        let mut lines = vec![STATUSES_HEADER.to_string()];
        let mut admitted = Vec::new();
        let mut skipped = 0;

        for i in 0..STATUS_ROWS {
            let bear_id = *BEAR_IDS.choose(&mut rng).unwrap();
            let received = format!("2010-{:02}-{:02} {:02}:00:00", 3 + i % 5, 1 + i % 28, i % 24);
            let latitude = format!("{:.4}", rng.gen_range(69.0..74.0));
            let longitude = format!("{:.4}", rng.gen_range(-156.0..-140.0));
            let temperature = format!("{:.1}", rng.gen_range(-30.0..10.0));

            let blank_lat = rng.gen_bool(0.1);
            let blank_temp = rng.gen_bool(0.2);

            lines.push(status_line(
                bear_id,
                &received,
                if blank_lat { "" } else { latitude.as_str() },
                &longitude,
                if blank_temp { "" } else { temperature.as_str() },
            ));

            if blank_lat {
                skipped += 1;
            } else {
                admitted.push(ExpectedStatus {
                    bear_id,
                    received,
                    latitude: latitude.parse().unwrap(),
                    longitude: longitude.parse().unwrap(),
                    temperature: if blank_temp {
                        0.0
                    } else {
                        temperature.parse().unwrap()
                    },
                });
            }
        }

        // BearID 42, blank temperature
        lines.push(status_line(42, "2011-05-01 06:00:00", "71.5", "-150.2", ""));
        admitted.push(ExpectedStatus {
            bear_id: 42,
            received: "2011-05-01 06:00:00".to_string(),
            latitude: 71.5,
            longitude: -150.2,
            temperature: 0.0,
        });

        fs::write(&statuses, lines.join("\n") + "\n").expect("Failed to write statuses");

        let paths = DataPaths {
            deployments,
            statuses,
            database: dir.path().join("shared.db"),
        };
        ingest(&paths, CommitMode::PerRow, &mut SilentUi::new())
            .expect("Failed to ingest fixture");

        Self {
            _dir: dir,
            paths,
            admitted,
            skipped,
        }
    }

    fn connection(&self) -> Connection {
        open_read_only(&self.paths.database).expect("Failed to open fixture database")
    }

    /// Fresh store path for tests that ingest on their own
    fn scratch(&self, dir: &TempDir) -> DataPaths {
        DataPaths {
            database: dir.path().join("scratch.db"),
            ..self.paths.clone()
        }
    }
}

fn deployments_csv(bear_ids: &[i64]) -> String {
    let mut lines = vec![DEPLOYMENTS_HEADER.to_string()];
    for (i, bear_id) in bear_ids.iter().enumerate() {
        let sex = if i % 2 == 0 { "F" } else { "M" };
        lines.push(format!(
            "{},{},2009-04-{:02},10:{:02},SPOT,no,{:.3},{:.3},N,{},A,L",
            bear_id,
            81600 + i,
            1 + i,
            i,
            70.0 + i as f64 / 10.0,
            -145.0 - i as f64,
            sex
        ));
    }
    lines.join("\n") + "\n"
}

fn status_line(bear_id: i64, received: &str, lat: &str, long: &str, temp: &str) -> String {
    format!(
        "{},81600,{},G,{},{},250,SPLASH,3.2,{}",
        bear_id, received, lat, long, temp
    )
}

fn count(conn: &Connection, table: &str) -> usize {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
        r.get::<_, i64>(0)
    })
    .expect("Failed to count rows") as usize
}

fn dump(db: &Path, table: &str) -> Vec<Vec<rusqlite::types::Value>> {
    let conn = open_read_only(db).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {} ORDER BY 1", table))
        .unwrap();
    let width = stmt.column_count();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, rusqlite::types::Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();
    rows
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Ingestion
// =============================================================================

#[test]
fn test_deployment_row_count_matches_input() {
    let conn = FIXTURE.connection();
    assert_eq!(count(&conn, "deployments"), BEAR_IDS.len());
}

#[test]
fn test_blank_latitude_rows_are_skipped() {
    let conn = FIXTURE.connection();
    assert!(FIXTURE.skipped > 0, "fixture should contain blank latitudes");
    assert_eq!(count(&conn, "statuses"), FIXTURE.admitted.len());

    let blank: usize = conn
        .query_row(
            "SELECT COUNT(*) FROM statuses WHERE latitude IS NULL",
            [],
            |r| r.get::<_, i64>(0),
        )
        .unwrap() as usize;
    assert_eq!(blank, 0);
}

#[test]
fn test_blank_temperature_defaults_to_zero() {
    let conn = FIXTURE.connection();
    let (temperature, deployment_id): (f64, i64) = conn
        .query_row(
            "SELECT temperature, deployment_id FROM statuses
             WHERE deployID = 42 AND received = '2011-05-01 06:00:00'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(temperature, 0.0);
    assert_eq!(deployment_id, 4);
}

#[test]
fn test_status_resolves_to_deployment_surrogate_key() {
    let conn = FIXTURE.connection();
    let bear7: i64 = conn
        .query_row("SELECT deploy_id FROM deployments WHERE BearID = 7", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(bear7, 3);

    let mismatched: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM statuses s JOIN deployments d ON s.deployment_id = d.deploy_id
             WHERE s.deployID != d.BearID",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(mismatched, 0);

    let linked_to_bear7 = FIXTURE.admitted.iter().filter(|s| s.bear_id == 7).count();
    assert_eq!(deployment_detail(&conn, 3).unwrap().statuses.len(), linked_to_bear7);
}

#[test]
fn test_sampled_statuses_match_source() {
    let conn = FIXTURE.connection();
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
    let indexed: Vec<(usize, &ExpectedStatus)> = FIXTURE.admitted.iter().enumerate().collect();

    for (idx, expected) in indexed.choose_multiple(&mut rng, SAMPLE_SIZE) {
        // a freshly created table numbers admitted rows from 1 in file order
        let status_id = *idx as i64 + 1;
        let (bear_id, received, latitude, longitude, temperature): (i64, String, f64, f64, f64) =
            conn.query_row(
                "SELECT deployID, received, latitude, longitude, temperature
                 FROM statuses WHERE status_id = ?1",
                [status_id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .unwrap_or_else(|e| panic!("status_id {} missing: {}", status_id, e));

        assert_eq!(bear_id, expected.bear_id, "deployID for status {}", status_id);
        assert_eq!(received, expected.received, "received for status {}", status_id);
        assert!((latitude - expected.latitude).abs() < 1e-9);
        assert!((longitude - expected.longitude).abs() < 1e-9);
        assert!((temperature - expected.temperature).abs() < 1e-9);
    }
}

#[test]
fn test_ingest_twice_yields_same_contents() {
    let dir = TempDir::new().unwrap();
    let paths = FIXTURE.scratch(&dir);

    ingest(&paths, CommitMode::PerRow, &mut SilentUi::new()).unwrap();
    let first = (
        dump(&paths.database, "deployments"),
        dump(&paths.database, "statuses"),
    );

    let summary = ingest(&paths, CommitMode::PerTable, &mut SilentUi::new()).unwrap();
    let second = (
        dump(&paths.database, "deployments"),
        dump(&paths.database, "statuses"),
    );

    assert_eq!(first, second);
    assert_eq!(summary.deployments.inserted as usize, BEAR_IDS.len());
    assert_eq!(summary.statuses.skipped as usize, FIXTURE.skipped);

    let shared = (
        dump(&FIXTURE.paths.database, "deployments"),
        dump(&FIXTURE.paths.database, "statuses"),
    );
    assert_eq!(first, shared);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unknown_bear_aborts_and_keeps_committed_rows() {
    let dir = TempDir::new().unwrap();
    let statuses = [
        STATUSES_HEADER.to_string(),
        status_line(7, "2010-04-01 00:00:00", "70.1", "-145.0", "1.0"),
        status_line(42, "2010-04-02 00:00:00", "70.2", "-145.1", ""),
        status_line(99999, "2010-04-03 00:00:00", "70.3", "-145.2", "2.0"),
        status_line(7, "2010-04-04 00:00:00", "70.4", "-145.3", "3.0"),
    ]
    .join("\n");

    let paths = DataPaths {
        statuses: write(&dir, "statuses.csv", &statuses),
        ..FIXTURE.scratch(&dir)
    };

    let err = ingest(&paths, CommitMode::PerRow, &mut SilentUi::new()).unwrap_err();
    assert!(err.is_resolution(), "expected resolution error, got {err}");
    assert_eq!(err.kind(), "resolution");
    match err {
        IngestError::Resolution { bear_id, line, .. } => {
            assert_eq!(bear_id, 99999);
            assert_eq!(line, 4);
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = open_read_only(&paths.database).unwrap();
    assert_eq!(count(&conn, "deployments"), BEAR_IDS.len());
    assert_eq!(count(&conn, "statuses"), 2);
}

#[test]
fn test_non_numeric_deployment_aborts_with_parse_error() {
    let dir = TempDir::new().unwrap();
    let mut csv = deployments_csv(&[1, 2]);
    csv.push_str("3,not-a-ptt,2009-04-03,10:00,SPOT,no,70.0,-145.0,N,F,A,L\n");

    let paths = DataPaths {
        deployments: write(&dir, "deployments.csv", &csv),
        ..FIXTURE.scratch(&dir)
    };

    let err = ingest(&paths, CommitMode::PerRow, &mut SilentUi::new()).unwrap_err();
    assert!(err.is_parse(), "expected parse error, got {err}");
    assert!(err.to_string().contains("PTT_ID"));

    // the two good rows before the failure were committed individually
    let conn = open_read_only(&paths.database).unwrap();
    assert_eq!(count(&conn, "deployments"), 2);
}

#[test]
fn test_missing_source_file() {
    let dir = TempDir::new().unwrap();
    let paths = DataPaths {
        deployments: dir.path().join("nope.csv"),
        ..FIXTURE.scratch(&dir)
    };
    let err = ingest(&paths, CommitMode::PerRow, &mut SilentUi::new()).unwrap_err();
    assert!(matches!(err, IngestError::Open { .. }));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_list_deployments_in_file_order() {
    let conn = FIXTURE.connection();
    let rows = list_deployments(&conn).unwrap();
    let bears: Vec<i64> = rows.iter().map(|d| d.bear_id).collect();
    assert_eq!(bears, BEAR_IDS);
    assert_eq!(rows[2].deploy_id, 3);
    assert_eq!(rows[0].sex, "F");
    assert_eq!(rows[0].ear_applied, "L");
}

#[test]
fn test_detail_for_unknown_key_is_empty() {
    let conn = FIXTURE.connection();
    let detail = deployment_detail(&conn, 10_000).unwrap();
    assert!(detail.deployment.is_none());
    assert!(detail.statuses.is_empty());
}
