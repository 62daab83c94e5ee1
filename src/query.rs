//! Read-only projections over the ingested tables

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

use crate::model::{Deployment, DeploymentDetail, Status};

/// Open the store for reading. The file must already exist.
pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database: {:?}", db_path))
}

/// Every deployment, in storage order
pub fn list_deployments(conn: &Connection) -> Result<Vec<Deployment>> {
    let mut stmt = conn.prepare("SELECT * FROM deployments")?;
    let rows = stmt
        .query_map([], Deployment::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read deployments")?;
    Ok(rows)
}

/// A deployment and its statuses, looked up by surrogate key.
///
/// An unknown key yields an empty detail rather than an error.
pub fn deployment_detail(conn: &Connection, deploy_id: i64) -> Result<DeploymentDetail> {
    let mut stmt = conn.prepare("SELECT * FROM statuses WHERE deployment_id = ?1")?;
    let statuses = stmt
        .query_map([deploy_id], Status::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read statuses")?;

    let deployment = conn
        .query_row(
            "SELECT * FROM deployments WHERE deploy_id = ?1",
            [deploy_id],
            Deployment::from_row,
        )
        .optional()
        .context("Failed to read deployment")?;

    Ok(DeploymentDetail {
        deployment,
        statuses,
    })
}
