//! feedreel command-line runner.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use feedreel_feed::FeedClient;
use feedreel_media::{check_ffmpeg, check_ffprobe, FfmpegEngine};
use feedreel_worker::{init_tracing, Cli, Pipeline, RunReport, WorkerConfig, WorkerError};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);
    info!("Starting feedreel");

    let report_path = cli.report.clone();
    let config = cli.into_config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return exit_code(e.exit_code());
    }

    let report = match run(config).await {
        Ok(report) => report,
        Err(e) => {
            error!("Run failed: {:#}", e);
            let code = e
                .downcast_ref::<WorkerError>()
                .map(WorkerError::exit_code)
                .unwrap_or(1);
            return exit_code(code);
        }
    };

    println!("{}", report.summary());
    if let Some(path) = report_path {
        if let Err(e) = write_report(&report, &path).await {
            error!("Failed to write report to {}: {:#}", path.display(), e);
        }
    }
    ExitCode::SUCCESS
}

async fn run(mut config: WorkerConfig) -> anyhow::Result<RunReport> {
    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    let client = FeedClient::from_env()
        .map_err(|e| WorkerError::config_error(format!("feed client: {}", e)))?;
    config.request_interval = client.config().request_interval;

    let mut engine = FfmpegEngine::new().with_debug(config.debug);
    if let Some(timeout) = config.engine_timeout {
        engine = engine.with_timeout(timeout.as_secs());
    }

    let pipeline = Pipeline::new(config, Arc::new(client), Arc::new(engine))?;
    Ok(pipeline.run().await?)
}

async fn write_report(report: &RunReport, path: &std::path::Path) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, json).await?;
    info!("Report written to {}", path.display());
    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
