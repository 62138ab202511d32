use anyhow::{Context, Result};
use std::io::Write;
use tracing::{error, info};

use crate::cfg::Cfg;
use crate::sheets::{AppendSummary, RowAppender};

pub async fn run_job<A, W>(cfg: &Cfg, appender: &A, out: &mut W) -> Result<AppendSummary>
where
    A: RowAppender + ?Sized + Sync,
    W: Write,
{
    info!("Starting job execution");

    let request = cfg.append_request();
    let summary = appender
        .append_row(&request)
        .await
        .context("Unable to append row")?;

    if cfg.verbose {
        writeln!(out, "{}", summary)?;
    }

    info!("Job completed successfully: {}", summary);
    Ok(summary)
}

pub async fn run_with_error_handling<A, W>(
    cfg: &Cfg,
    appender: &A,
    out: &mut W,
) -> Result<AppendSummary>
where
    A: RowAppender + ?Sized + Sync,
    W: Write,
{
    match run_job(cfg, appender, out).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            error!("Job failed with error: {:#}", e);
            Err(e)
        }
    }
}
