use std::fs;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sen2cor_wrapper::api::{process_directory, process_l1c};
use sen2cor_wrapper::runner::run_sen2cor_with;
use sen2cor_wrapper::{Sen2CorParams, get_tiles_projtrans, set_projection_on_classfiles};

use super::args::{CliArgs, CliCommand, RunnerArgs};
use super::errors::AppError;

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn runner_params(args: &RunnerArgs) -> Result<Sen2CorParams, AppError> {
    let mut params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|source| AppError::InvalidParams {
                path: path.clone(),
                source,
            })?
        }
        None => Sen2CorParams::default(),
    };
    if let Some(command) = &args.sen2cor {
        params.command = command.clone();
    }
    if let Some(secs) = args.poll_interval {
        params.poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.max_wait {
        params.max_wait = Duration::from_secs(secs);
    }
    Ok(params)
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    init_logging(args.verbose);

    match args.command {
        CliCommand::Process {
            input,
            resolution,
            no_projection,
            runner,
        } => {
            let params = runner_params(&runner)?;
            let classfiles = if no_projection {
                run_sen2cor_with(&input, resolution, &params)?
            } else {
                process_l1c(&input, resolution, &params)?
            };
            for classfile in &classfiles {
                println!("{}", classfile.display());
            }
            info!("Successfully processed: {:?}", input);
        }
        CliCommand::Batch {
            input_dir,
            resolution,
            continue_on_error,
            runner,
        } => {
            let params = runner_params(&runner)?;
            info!("Starting batch processing from directory: {:?}", input_dir);
            let report = process_directory(&input_dir, resolution, &params, continue_on_error)?;

            info!("Batch processing complete!");
            info!("Processed: {}", report.processed);
            info!("Skipped: {}", report.skipped);
            info!("Errors: {}", report.errors);
            if report.errors > 0 {
                return Err(AppError::BatchFailed {
                    errors: report.errors,
                    total: report.processed + report.errors,
                });
            }
        }
        CliCommand::SetProjection {
            l2a,
            metadata,
            resolution,
        } => {
            set_projection_on_classfiles(&l2a, &metadata, resolution)?;
        }
        CliCommand::Projtrans {
            metadata,
            tiles,
            resolution,
        } => {
            let projtrans = get_tiles_projtrans(&metadata, &tiles, resolution)?;
            println!("{}", serde_json::to_string_pretty(&projtrans)?);
        }
    }

    Ok(())
}
