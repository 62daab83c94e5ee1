//! Stored rows as returned by the query layer

use rusqlite::Row;
use serde::Serialize;

/// A capture/tagging event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    pub deploy_id: i64,
    #[serde(rename = "BearID")]
    pub bear_id: i64,
    #[serde(rename = "PTT_ID")]
    pub ptt_id: i64,
    pub capture_lat: f64,
    pub capture_long: f64,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Age_class")]
    pub age_class: String,
    #[serde(rename = "Ear_applied")]
    pub ear_applied: String,
}

impl Deployment {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            deploy_id: row.get("deploy_id")?,
            bear_id: row.get("BearID")?,
            ptt_id: row.get("PTT_ID")?,
            capture_lat: row.get("capture_lat")?,
            capture_long: row.get("capture_long")?,
            sex: row.get("Sex")?,
            age_class: row.get("Age_class")?,
            ear_applied: row.get("Ear_applied")?,
        })
    }
}

/// One telemetry ping.
///
/// `bear_id` is the external BearID copied from the source row (stored as
/// `deployID`); `deployment_id` is the surrogate key of the owning deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub status_id: i64,
    #[serde(rename = "deployID")]
    pub bear_id: i64,
    pub received: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub deployment_id: i64,
}

impl Status {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            status_id: row.get("status_id")?,
            bear_id: row.get("deployID")?,
            received: row.get("received")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            temperature: row.get("temperature")?,
            deployment_id: row.get("deployment_id")?,
        })
    }
}

/// A deployment together with its statuses. Both parts may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentDetail {
    pub deployment: Option<Deployment>,
    pub statuses: Vec<Status>,
}

impl DeploymentDetail {
    pub fn is_empty(&self) -> bool {
        self.deployment.is_none() && self.statuses.is_empty()
    }
}
