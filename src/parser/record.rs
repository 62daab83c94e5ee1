use csv::StringRecord;
use std::str::FromStr;

use super::header::HeaderIndex;
use crate::error::{IngestError, Result};

/// A deployments row ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub bear_id: i64,
    pub ptt_id: i64,
    pub capture_lat: f64,
    pub capture_long: f64,
    pub sex: String,
    pub age_class: String,
    pub ear_applied: String,
}

/// A status row ready for FK resolution and insertion
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub bear_id: i64,
    pub received: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
}

/// Parse one deployments row. Any non-numeric numeric cell fails the row.
pub fn parse_deployment(
    index: &HeaderIndex,
    record: &StringRecord,
    line: u64,
) -> Result<DeploymentRecord> {
    Ok(DeploymentRecord {
        bear_id: parse_cell(index, record, "BearID", line, "integer")?,
        ptt_id: parse_cell(index, record, "PTT_ID", line, "integer")?,
        capture_lat: parse_cell(index, record, "capture_lat", line, "float")?,
        capture_long: parse_cell(index, record, "capture_long", line, "float")?,
        sex: index.cell(record, "Sex").to_string(),
        age_class: index.cell(record, "Age_class").to_string(),
        ear_applied: index.cell(record, "Ear_applied").to_string(),
    })
}

/// Parse one status row.
///
/// Returns `Ok(None)` when the latitude cell is blank; such rows are not
/// stored. A blank temperature reads as 0.
pub fn parse_status(
    index: &HeaderIndex,
    record: &StringRecord,
    line: u64,
) -> Result<Option<StatusRecord>> {
    if is_blank(index.cell(record, "latitude")) {
        return Ok(None);
    }

    let temperature = if is_blank(index.cell(record, "temperature")) {
        0.0
    } else {
        parse_cell(index, record, "temperature", line, "float")?
    };

    Ok(Some(StatusRecord {
        bear_id: parse_cell(index, record, "deployID", line, "integer")?,
        received: index.cell(record, "received").to_string(),
        latitude: parse_cell(index, record, "latitude", line, "float")?,
        longitude: parse_cell(index, record, "longitude", line, "float")?,
        temperature,
    }))
}

pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn parse_cell<T: FromStr>(
    index: &HeaderIndex,
    record: &StringRecord,
    column: &'static str,
    line: u64,
    expected: &'static str,
) -> Result<T> {
    let raw = index.cell(record, column);
    raw.trim().parse::<T>().map_err(|_| IngestError::Parse {
        file: index.file().to_string(),
        line,
        column,
        value: raw.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DEPLOYMENTS, STATUSES};

    fn deployment_index() -> HeaderIndex {
        let headers = StringRecord::from(vec![
            "BearID",
            "PTT_ID",
            "capture_lat",
            "capture_long",
            "Sex",
            "Age_class",
            "Ear_applied",
        ]);
        HeaderIndex::resolve("deployments.csv", &headers, &DEPLOYMENTS).unwrap()
    }

    fn status_index() -> HeaderIndex {
        let headers = StringRecord::from(vec![
            "DeployID",
            "Received",
            "Latitude",
            "Longitude",
            "Temperature",
        ]);
        HeaderIndex::resolve("status.csv", &headers, &STATUSES).unwrap()
    }

    #[test]
    fn test_parse_deployment() {
        let row = StringRecord::from(vec!["20414", "81684", "70.9", "-147.5", "F", "A", "L"]);
        let rec = parse_deployment(&deployment_index(), &row, 2).unwrap();
        assert_eq!(rec.bear_id, 20414);
        assert_eq!(rec.ptt_id, 81684);
        assert_eq!(rec.capture_lat, 70.9);
        assert_eq!(rec.capture_long, -147.5);
        assert_eq!(rec.sex, "F");
        assert_eq!(rec.ear_applied, "L");
    }

    #[test]
    fn test_parse_deployment_rejects_bad_number() {
        let row = StringRecord::from(vec!["20414", "tag", "70.9", "-147.5", "F", "A", "L"]);
        let err = parse_deployment(&deployment_index(), &row, 5).unwrap_err();
        match err {
            IngestError::Parse {
                line,
                column,
                value,
                expected,
                ..
            } => {
                assert_eq!(line, 5);
                assert_eq!(column, "PTT_ID");
                assert_eq!(value, "tag");
                assert_eq!(expected, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_deployment_rejects_fractional_bear_id() {
        let row = StringRecord::from(vec!["20414.5", "81684", "70.9", "-147.5", "F", "A", "L"]);
        assert!(parse_deployment(&deployment_index(), &row, 2)
            .unwrap_err()
            .is_parse());
    }

    #[test]
    fn test_parse_status_blank_latitude_skips() {
        let row = StringRecord::from(vec!["42", "2010-04-01 12:00:00", "", "-150.2", "3.5"]);
        assert_eq!(parse_status(&status_index(), &row, 2).unwrap(), None);

        let row = StringRecord::from(vec!["not-a-bear", "x", "  ", "y", "z"]);
        assert_eq!(parse_status(&status_index(), &row, 3).unwrap(), None);
    }

    #[test]
    fn test_parse_status_blank_temperature_defaults_to_zero() {
        let row = StringRecord::from(vec!["42", "2010-04-01 12:00:00", "71.5", "-150.2", ""]);
        let rec = parse_status(&status_index(), &row, 2).unwrap().unwrap();
        assert_eq!(rec.bear_id, 42);
        assert_eq!(rec.latitude, 71.5);
        assert_eq!(rec.longitude, -150.2);
        assert_eq!(rec.temperature, 0.0);
    }

    #[test]
    fn test_parse_status_blank_longitude_is_an_error() {
        let row = StringRecord::from(vec!["42", "2010-04-01", "71.5", "", "1.0"]);
        let err = parse_status(&status_index(), &row, 7).unwrap_err();
        assert!(err.is_parse());
    }
}
