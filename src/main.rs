mod batch;
mod bigmodel;
mod cli;
mod config;
mod download;
mod error;
mod job;
mod poller;
mod server;
#[cfg(test)]
mod testing;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use bigmodel::BigModelClient;
use cli::{Cli, Command};
use config::MediaGenConfig;
use error::MediaGenError;
use job::JobStatus;
use poller::JobPoller;
use ui::JobProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = MediaGenConfig::load(cli.config.as_deref())?;
    config.override_poll(cli.timeout, cli.interval)?;

    let client = BigModelClient::with_base_url(
        config.require_api_key()?.to_string(),
        config.base_url.clone(),
    )?;
    let poller = JobPoller::new(client);

    match cli.command {
        Command::Video { prompt, out } => run_video(&poller, &config, &prompt, out, cli.json).await,
        Command::Image { prompt } => {
            let url = poller.generate_image(&prompt, &config.image).await?;
            println!("{url}");
            Ok(())
        }
        Command::Status { job_id } => {
            let job = poller.check(&job_id).await?;
            if cli.json {
                ui::print_job_json(&job);
            } else {
                println!("{} {}", job.id, job.status);
                if let Some(url) = &job.result_url {
                    println!("{url}");
                }
            }
            Ok(())
        }
        Command::Batch { prompts, out } => {
            let out_dir = out.unwrap_or_else(|| config.download_dir.clone());
            let cancel = cancel_on_ctrl_c();
            let items = batch::run_batch(
                &poller,
                poller.service().http(),
                &prompts,
                &config.video,
                &config.poll,
                &out_dir,
                &cancel,
                |index, job| {
                    tracing::info!(index, job_id = %job.id, status = %job.status, "Batch job status")
                },
            )
            .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                ui::print_batch_summary(&items);
            }
            Ok(())
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(config.server.addr);
            let state = Arc::new(server::AppState {
                poller,
                video: config.video.clone(),
                image: config.image.clone(),
                poll: config.poll,
            });
            server::serve(state, addr).await
        }
    }
}

async fn run_video(
    poller: &JobPoller<BigModelClient>,
    config: &MediaGenConfig,
    prompt: &str,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let progress = JobProgress::start(prompt);

    let result = poller
        .generate(prompt, &config.video, &config.poll, &cancel, |job| progress.update(job))
        .await;

    let job = match result {
        Ok(job) => job,
        Err(MediaGenError::Poll(e)) => {
            tracing::debug!(job_id = e.job_id(), "Polling ended without a terminal status");
            progress.abort(&e.to_string(), e.is_timeout());
            return Err(e.into());
        }
        Err(e) => {
            progress.abort(&e.to_string(), false);
            return Err(e.into());
        }
    };

    progress.complete(&job);
    if json {
        ui::print_job_json(&job);
    }
    if job.status != JobStatus::Success {
        bail!("job {} finished with status {}", job.id, job.status);
    }

    if let (Some(dir), Some(url)) = (out, job.result_url.as_deref()) {
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.mp4", job.id));
        let bytes = download::download_to(poller.service().http(), url, &path).await?;
        println!("  saved {} ({bytes} bytes)", path.display());
    }
    Ok(())
}

/// A token that is cancelled when the user presses Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mediagen=debug" } else { "mediagen=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
