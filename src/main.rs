use anyhow::{Context, Result};
use polar_bear_telemetry::{
    archive::unpack_dataset,
    cli::{ingest_paths, Cli, Commands},
    model::{Deployment, DeploymentDetail},
    query::{deployment_detail, list_deployments, open_read_only},
    schema::DependencyResolver,
    ui::{LogUi, UiApp},
    web,
    writer::{generate_create_table, generate_indexes, ingest, IngestSummary},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Ingest {
            deployments,
            statuses,
            db,
            commit,
            tui,
        } => {
            let paths = ingest_paths(deployments, statuses, db);

            let result = if tui {
                let mut ui = UiApp::new()?;
                match ingest(&paths, commit, &mut ui) {
                    Ok(summary) => {
                        ui.finish(&summary_lines(&summary))?;
                        Ok(summary)
                    }
                    Err(e) => {
                        ui.fail(&e.to_string())?;
                        Err(e)
                    }
                }
            } else {
                ingest(&paths, commit, &mut LogUi::new())
            };

            let summary = result.map_err(|e| {
                let kind = e.kind();
                anyhow::Error::new(e).context(format!("Ingestion failed ({} error)", kind))
            })?;

            if !tui {
                println!();
                for line in summary_lines(&summary) {
                    println!("{}", line);
                }
            }
        }

        Commands::Serve { db, addr } => {
            web::serve(&db, &addr)?;
        }

        Commands::Deployments { db, json } => {
            let conn = open_read_only(&db)?;
            let rows = list_deployments(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_deployments(&rows);
            }
        }

        Commands::Deployment { id, db, json } => {
            let conn = open_read_only(&db)?;
            let detail = deployment_detail(&conn, id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print_detail(id, &detail);
            }
        }

        Commands::Unpack { archive, dest, tui } => {
            let written = if tui {
                let mut ui = UiApp::new()?;
                match unpack_dataset(&archive, &dest, &mut ui) {
                    Ok(written) => {
                        ui.finish(&[format!("{} CSV files extracted", written.len())])?;
                        written
                    }
                    Err(e) => {
                        ui.fail(&format!("{:#}", e))?;
                        return Err(e);
                    }
                }
            } else {
                unpack_dataset(&archive, &dest, &mut LogUi::new())?
            };
            println!("{} CSV files extracted to {:?}", written.len(), dest);
        }

        Commands::Schema => {
            let tables = DependencyResolver::new()
                .load_order()
                .map_err(anyhow::Error::msg)
                .context("Failed to order tables")?;
            for table in tables {
                println!("{};", generate_create_table(table));
                for index in generate_indexes(table) {
                    println!("{};", index);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn summary_lines(summary: &IngestSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "deployments: {} rows loaded",
            summary.deployments.inserted
        ),
        format!(
            "statuses: {} rows loaded, {} skipped for blank latitude",
            summary.statuses.inserted, summary.statuses.skipped
        ),
    ];
    if !summary.statuses.ambiguous_bear_ids.is_empty() {
        lines.push(format!(
            "ambiguous BearIDs (linked to their first deployment): {:?}",
            summary.statuses.ambiguous_bear_ids
        ));
    }
    lines.push(format!("finished in {:.1}s", summary.elapsed_secs));
    lines
}

fn print_deployments(rows: &[Deployment]) {
    println!(
        "{:>9} {:>8} {:>8} {:>10} {:>11}  {:<4} {:<9} {}",
        "deploy_id", "BearID", "PTT_ID", "lat", "long", "Sex", "Age_class", "Ear_applied"
    );
    for d in rows {
        println!(
            "{:>9} {:>8} {:>8} {:>10.4} {:>11.4}  {:<4} {:<9} {}",
            d.deploy_id,
            d.bear_id,
            d.ptt_id,
            d.capture_lat,
            d.capture_long,
            d.sex,
            d.age_class,
            d.ear_applied
        );
    }
    println!("\n{} deployments", rows.len());
}

fn print_detail(id: i64, detail: &DeploymentDetail) {
    match &detail.deployment {
        Some(d) => println!(
            "Deployment {}: BearID {} PTT_ID {} captured at {:.4}, {:.4} ({} {} {})",
            d.deploy_id,
            d.bear_id,
            d.ptt_id,
            d.capture_lat,
            d.capture_long,
            d.sex,
            d.age_class,
            d.ear_applied
        ),
        None => println!("No deployment with deploy_id {}", id),
    }

    println!(
        "\n{:>9} {:<20} {:>10} {:>11} {:>11}",
        "status_id", "received", "latitude", "longitude", "temperature"
    );
    for s in &detail.statuses {
        println!(
            "{:>9} {:<20} {:>10.4} {:>11.4} {:>11.1}",
            s.status_id, s.received, s.latitude, s.longitude, s.temperature
        );
    }
    println!("\n{} statuses", detail.statuses.len());
}
