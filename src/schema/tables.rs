//! Table schema definitions for the telemetry store

use super::types::*;

/// One row per capture/tagging event, read from the deployments file
pub static DEPLOYMENTS: TableSchema = TableSchema {
    name: "deployments",
    columns: &[
        Column::key("deploy_id"),
        Column::new("BearID", ColumnType::Integer).from_headers(&["BearID", "Bear_ID"]),
        Column::new("PTT_ID", ColumnType::Integer).from_headers(&["PTT_ID", "PTT", "PttID"]),
        Column::new("capture_lat", ColumnType::Real)
            .from_headers(&["capture_lat", "CaptureLatitude"]),
        Column::new("capture_long", ColumnType::Real)
            .from_headers(&["capture_long", "capture_lon", "CaptureLongitude"]),
        Column::new("Sex", ColumnType::Text).from_headers(&["Sex"]),
        Column::new("Age_class", ColumnType::Text).from_headers(&["Age_class", "AgeClass"]),
        Column::new("Ear_applied", ColumnType::Text).from_headers(&["Ear_applied", "Ear"]),
    ],
    foreign_keys: &[],
    indexes: &[Index::on(&["BearID"])],
};

/// One row per telemetry ping, read from the status file.
///
/// `deployID` repeats the external BearID from the source row; the link to
/// the owning deployment is `deployment_id`, resolved at load time.
pub static STATUSES: TableSchema = TableSchema {
    name: "statuses",
    columns: &[
        Column::key("status_id"),
        Column::new("deployID", ColumnType::Integer).from_headers(&["DeployID", "BearID"]),
        Column::new("received", ColumnType::Text).from_headers(&["Received"]),
        Column::new("latitude", ColumnType::Real).from_headers(&["Latitude", "Lat"]),
        Column::new("longitude", ColumnType::Real).from_headers(&["Longitude", "Lon", "Long"]),
        Column::new("temperature", ColumnType::Real).from_headers(&["Temperature", "Temp"]),
        Column::new("deployment_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new("deployment_id", "deployments", "deploy_id")],
    indexes: &[],
};

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[&DEPLOYMENTS, &STATUSES];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_columns() {
        assert_eq!(DEPLOYMENTS.key_column().map(|c| c.name), Some("deploy_id"));
        assert_eq!(STATUSES.key_column().map(|c| c.name), Some("status_id"));
    }

    #[test]
    fn test_deployment_id_is_not_sourced() {
        let col = STATUSES.column("deployment_id").unwrap();
        assert!(!col.is_sourced());
        assert_eq!(STATUSES.sourced_columns().count(), 5);
        assert_eq!(DEPLOYMENTS.sourced_columns().count(), 7);
    }

    #[test]
    fn test_get_table() {
        assert!(get_table("statuses").is_some());
        assert!(get_table("bears").is_none());
        assert_eq!(table_names(), vec!["deployments", "statuses"]);
    }
}
