mod cli;
mod logging;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use jobclient::{AwaitOptions, ClientConfig, JobApi, JobClient, JobStatus, PollMode};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }

    let client = JobClient::from_config(&config)?;

    match cli.command {
        Command::Create {
            duration,
            should_error,
        } => {
            let created = client.create_job(duration, should_error).await?;
            ui::print_created(&created);
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { job_id, mode } => {
            let status = client.get_status(&job_id, PollMode::from(mode)).await?;
            println!("{status}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Await { job_id, poll } => {
            let options = poll.resolve(config.poll);
            wait_for(&client, &job_id, options).await
        }
        Command::Run {
            duration,
            should_error,
            poll,
        } => {
            let created = client.create_job(duration, should_error).await?;
            ui::print_created(&created);
            let options = poll.resolve(config.poll);
            wait_for(&client, &created.job_id, options).await
        }
    }
}

/// Await a job with a spinner. Job-level `error` and client failures both
/// exit non-zero; only the latter are reported as errors.
async fn wait_for(client: &JobClient, job_id: &str, options: AwaitOptions) -> Result<ExitCode> {
    let progress = ui::PollProgress::start(job_id, options.mode);
    match client.await_completion(job_id, options).await {
        Ok(status) => {
            progress.finish(job_id, status);
            Ok(match status {
                JobStatus::Completed => ExitCode::SUCCESS,
                JobStatus::Error | JobStatus::Pending => ExitCode::from(2),
            })
        }
        Err(e) => {
            progress.fail(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
