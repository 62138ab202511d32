use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::info;

mod a1;
mod args;
mod auth;
mod cfg;
mod job;
mod sheets;
mod token_cache;

#[cfg(test)]
mod testing;

use args::Args;
use cfg::{Cfg, CfgError};
use sheets::SheetsAppender;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level)?;

    info!("Starting sheets_append");

    // Usage errors stop here, before any credential or network access
    let cfg = match Cfg::load_and_validate(args) {
        Ok(cfg) => cfg,
        Err(e) => match e.downcast_ref::<CfgError>() {
            Some(usage) => {
                eprintln!("error: {}\n", usage);
                eprintln!("{}", Args::command().render_usage());
                std::process::exit(2);
            }
            None => return Err(e),
        },
    };

    let hub = auth::create_sheets_hub(&cfg).await?;
    let appender = SheetsAppender::new(hub);

    job::run_with_error_handling(&cfg, &appender, &mut std::io::stdout()).await?;

    info!("sheets_append completed successfully");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match level {
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
