use askama::Template;

use crate::model::{Deployment, DeploymentDetail, Status};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub deployments: &'a [Deployment],
}

#[derive(Template)]
#[template(path = "deployment.html")]
pub struct DeploymentPage<'a> {
    pub deploy_id: i64,
    pub deployment: Option<&'a Deployment>,
    pub statuses: &'a [Status],
}

impl<'a> DeploymentPage<'a> {
    pub fn new(deploy_id: i64, detail: &'a DeploymentDetail) -> Self {
        Self {
            deploy_id,
            deployment: detail.deployment.as_ref(),
            statuses: &detail.statuses,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub status: u16,
    pub message: &'a str,
}
