//! `lms` subcommands

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lms_core::{
    plan_submission, CourseSubmissionCoordinator, ProgressEvent, ProgressSink, SubmissionResult,
    SubmissionStatus, SubmitOptions,
};
use lms_model::CourseEdit;
use lms_remote::{HttpResourceClient, RemoteResourceClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Command-line definition
#[must_use]
pub fn build_cli() -> Command {
    let edit_arg = Arg::new("edit")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Course edit JSON file (course with nested chapters and lectures)");

    Command::new("lms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit course edits to the LMS backend")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help(format!("Config file (default: ./{DEFAULT_CONFIG_FILE} if present)")),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("submit")
                .about("Create or update a course and its chapters and lectures")
                .arg(edit_arg.clone()),
        )
        .subcommand(
            Command::new("plan")
                .about("Print the calls a submission would make, without calling the backend")
                .arg(edit_arg)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("check-config").about("Print the effective configuration"))
}

/// Process exit code for a finished submission
#[must_use]
pub fn exit_code(status: SubmissionStatus) -> u8 {
    match status {
        SubmissionStatus::Complete => 0,
        SubmissionStatus::PartialTree => 2,
        SubmissionStatus::CourseFailed | SubmissionStatus::Cancelled => 1,
    }
}

/// Parse a course edit from a JSON file.
///
/// # Errors
/// Unreadable file or invalid JSON.
pub fn read_edit(path: &Path) -> anyhow::Result<CourseEdit> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read edit file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid course edit in {}", path.display()))
}

/// Submit `edit`, logging progress as nodes settle.
pub async fn submit_edit(
    client: Arc<dyn RemoteResourceClient>,
    config: &AppConfig,
    edit: &CourseEdit,
    cancel: CancellationToken,
) -> SubmissionResult {
    let (progress, mut events) = ProgressSink::channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ProgressEvent::CourseSettled {
                    course_id,
                    action,
                    error: None,
                    ..
                } => tracing::info!(?course_id, ?action, "course saved"),
                ProgressEvent::NodeSettled { outcome, .. } if outcome.success() => {
                    tracing::info!(node = %outcome.node(), action = ?outcome.action, id = ?outcome.resolved_id, "saved");
                }
                _ => {}
            }
        }
    });

    let coordinator = CourseSubmissionCoordinator::new(client).with_config(config.submission);
    let options = SubmitOptions::new().with_cancel(cancel).with_progress(progress);
    let result = coordinator.submit_with(edit, options).await;

    // Every sender is gone once submit returns, so the reporter drains and exits.
    if let Err(e) = reporter.await {
        tracing::debug!("progress reporter stopped: {}", e);
    }
    result
}

/// Run the parsed command line, returning the process exit code.
///
/// # Errors
/// Configuration, input and output failures. A rejected submission is not
/// an error: it is printed and reflected in the exit code.
pub async fn run(matches: &ArgMatches) -> anyhow::Result<u8> {
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);

    match matches.subcommand() {
        Some(("submit", args)) => {
            let config = AppConfig::load(config_path)?;
            let edit = read_edit(edit_path(args)?)?;
            let client = HttpResourceClient::new(config.client.clone())
                .context("cannot build HTTP client")?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping after the call in flight");
                    on_interrupt.cancel();
                }
            });

            let result = submit_edit(Arc::new(client), &config, &edit, cancel).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(exit_code(result.status()))
        }
        Some(("plan", args)) => {
            let edit = read_edit(edit_path(args)?)?;
            let plan = plan_submission(&edit);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{plan}");
            }
            Ok(0)
        }
        Some(("check-config", _)) => {
            let config = AppConfig::load(config_path)?;
            print!("{}", toml::to_string_pretty(&config.redacted())?);
            Ok(0)
        }
        _ => {
            build_cli().print_help()?;
            Ok(1)
        }
    }
}

fn edit_path(args: &ArgMatches) -> anyhow::Result<&Path> {
    args.get_one::<PathBuf>("edit")
        .map(PathBuf::as_path)
        .context("missing course edit file")
}
