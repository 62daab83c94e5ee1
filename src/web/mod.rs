//! Read-only HTML view over the store.
//!
//! One request is handled at a time, each with its own read-only connection
//! that is closed before the response is sent.

mod pages;

use anyhow::{anyhow, Result};
use askama::Template;
use std::path::Path;
use tiny_http::{Header, Method, Response, Server};
use tracing::{error, info, warn};

use crate::query::{deployment_detail, list_deployments, open_read_only};
use pages::{DeploymentPage, ErrorPage, IndexPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Deployment(i64),
    NotFound,
}

impl Route {
    /// Map a request URL (path plus optional query string) to a route
    pub fn parse(url: &str) -> Self {
        let path = url.split(|c| c == '?' || c == '#').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Index,
            ["deployment", id] => id.parse().map_or(Route::NotFound, Route::Deployment),
            _ => Route::NotFound,
        }
    }
}

/// A rendered response
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// Produce the page for one request. Never fails: store errors become a 500 page.
pub fn handle(db_path: &Path, method: &Method, url: &str) -> Page {
    if *method != Method::Get && *method != Method::Head {
        return error_page(405, "Only GET is supported.");
    }

    let route = Route::parse(url);
    if route == Route::NotFound {
        return error_page(404, "No such page.");
    }

    match render(db_path, route) {
        Ok(body) => Page { status: 200, body },
        Err(e) => {
            error!(url, error = %format!("{:#}", e), "request failed");
            error_page(500, "The telemetry store could not be read.")
        }
    }
}

fn render(db_path: &Path, route: Route) -> Result<String> {
    let conn = open_read_only(db_path)?;

    let body = match route {
        Route::Index => {
            let deployments = list_deployments(&conn)?;
            IndexPage {
                deployments: &deployments,
            }
            .render()?
        }
        Route::Deployment(id) => {
            let detail = deployment_detail(&conn, id)?;
            DeploymentPage::new(id, &detail).render()?
        }
        Route::NotFound => return Err(anyhow!("unroutable request")),
    };

    Ok(body)
}

fn error_page(status: u16, message: &str) -> Page {
    let body = ErrorPage { status, message }
        .render()
        .unwrap_or_else(|_| format!("{} {}", status, message));
    Page { status, body }
}

/// Serve until the process is stopped
pub fn serve(db_path: &Path, addr: &str) -> Result<()> {
    let server = Server::http(addr).map_err(|e| anyhow!("Failed to listen on {}: {}", addr, e))?;
    let content_type = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        .map_err(|_| anyhow!("invalid Content-Type header"))?;

    info!(addr, db = %db_path.display(), "serving telemetry view");

    for request in server.incoming_requests() {
        let page = handle(db_path, request.method(), request.url());
        info!(
            method = %request.method(),
            url = request.url(),
            status = page.status,
            "request"
        );

        let response = Response::from_string(page.body)
            .with_status_code(page.status)
            .with_header(content_type.clone());
        if let Err(e) = request.respond(response) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}
