use crate::app_state::AppState;
use crate::batch_job::BatchJob;
use crate::jobs::{
    get_validated_main_subjects_as_jobs, handle_job_preparation_or_run_directly_if_any_jobs,
    process_ngrams_into_batch_jobs, process_user_supplied_qids_into_batch_jobs, run_prepared_jobs,
    JobContext, RunSummary,
};
use crate::main_subjects::fetch_main_subjects;
use crate::ngram::NGram;
use crate::presenter::{ConsolePresenter, Presenter};
use crate::task::{Task, TaskId, TaskRegistry};
use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    ScholarlyArticles,
    RiksdagenDocuments,
    Thesis,
}

impl From<TaskArg> for TaskId {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::ScholarlyArticles => Self::ScholarlyArticles,
            TaskArg::RiksdagenDocuments => Self::RiksdagenDocuments,
            TaskArg::Thesis => Self::Thesis,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "itemsubjector")]
#[command(version)]
#[command(about = "Add main subjects to scholarly items on Wikidata, semi-automatically")]
pub struct Cli {
    #[arg(short, long, num_args = 1.., help = "QIDs of main subjects to find matching items for")]
    pub add: Vec<String>,
    #[arg(long, num_args = 1.., help = "Free-text labels to recognize as main subjects")]
    pub ngram: Vec<String>,
    #[arg(short, long, value_enum, help = "Task to work on [default: ask]")]
    pub task: Option<TaskArg>,
    #[arg(long, help = "Add the jobs to the jobs file instead of running them")]
    pub prepare_jobs: bool,
    #[arg(short, long, help = "Run previously prepared jobs non-interactively")]
    pub run_prepared_jobs: bool,
    #[arg(long, help = "Delete the jobs file")]
    pub remove_prepared_jobs: bool,
    #[arg(short, long, help = "Pick random main subjects already in use on Wikidata")]
    pub match_existing_main_subjects: bool,
    #[arg(long, help = "Only search for the label, not the aliases")]
    pub no_aliases: bool,
    #[arg(long, help = "Show item URLs in the list of found items")]
    pub show_item_urls: bool,
    #[arg(short, long, env = "ITEMSUBJECTOR_CONFIG", default_value = "config.json")]
    pub config: PathBuf,
}

/// Reads the JSON config. A missing file yields an empty config.
pub fn get_bot_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        warn!("No config file at {}, using defaults", path.display());
        return Ok(json!({}));
    }
    let file = File::open(path)
        .map_err(|e| anyhow!("Can not open config file at {}: {e}", path.display()))?;
    let config: Value = serde_json::from_reader(file)
        .map_err(|e| anyhow!("Can not parse JSON from config file {}: {e}", path.display()))?;
    Ok(config)
}

/// Lets the operator pick a task. `None` means they chose to exit.
pub fn select_task<'a>(presenter: &mut dyn Presenter, tasks: &'a TaskRegistry) -> Option<&'a Task> {
    let all = tasks.tasks();
    let index = presenter.choose_one("Select a task", &tasks.labels())?;
    let task = all.get(index).copied();
    if let Some(task) = task {
        info!("Selected task {}", task.id);
    }
    task
}

fn report_summary(summary: &RunSummary) {
    info!(
        "{} job(s) succeeded, {} failed, runtime {}",
        summary.succeeded,
        summary.failed.len(),
        summary.runtime
    );
    for failed in &summary.failed {
        warn!("Job {}: {}", failed.job_count, failed.error);
    }
}

pub async fn command_line_usage(cli: Cli) -> Result<()> {
    let config = get_bot_config(&cli.config)?;
    let state = AppState::new_from_config(&config);
    let args = state.run_arguments(cli.no_aliases, cli.show_item_urls, cli.prepare_jobs);
    let ctx = JobContext {
        state: &state,
        args: &args,
    };
    let mut presenter = ConsolePresenter::new();

    if cli.remove_prepared_jobs {
        state.job_store().remove()?;
        presenter.show("Removed the jobs file");
        return Ok(());
    }

    let mut client = state.wikidata_client().await?;

    if cli.run_prepared_jobs {
        let summary = run_prepared_jobs(ctx, &mut client, &mut presenter).await?;
        report_summary(&summary);
        return Ok(());
    }

    let jobs: Vec<BatchJob> = if cli.match_existing_main_subjects {
        let main_subjects = fetch_main_subjects(&client, state.main_subjects_limit()).await?;
        let mut jobs = vec![];
        get_validated_main_subjects_as_jobs(ctx, &client, &mut presenter, &main_subjects, &mut jobs)
            .await?;
        jobs
    } else if !cli.add.is_empty() || !cli.ngram.is_empty() {
        let task = match cli.task {
            Some(task_arg) => state
                .tasks()
                .get(task_arg.into())
                .ok_or_else(|| anyhow!("Task {task_arg:?} is not configured"))?,
            None => match select_task(&mut presenter, state.tasks()) {
                Some(task) => task,
                None => {
                    info!("Got exit");
                    std::process::exit(0);
                }
            },
        };
        let mut jobs = vec![];
        if !cli.add.is_empty() {
            jobs.extend(
                process_user_supplied_qids_into_batch_jobs(ctx, &client, &mut presenter, &cli.add, task)
                    .await?,
            );
        }
        if !cli.ngram.is_empty() {
            let ngrams: Vec<NGram> = cli.ngram.iter().map(|label| NGram::new(label, 1)).collect();
            jobs.extend(
                process_ngrams_into_batch_jobs(ctx, &client, &mut presenter, &ngrams, task).await?,
            );
        }
        jobs
    } else {
        presenter.show("Nothing to do. Use --add, --ngram, --match-existing-main-subjects or --run-prepared-jobs, see --help");
        return Ok(());
    };

    if jobs.is_empty() {
        presenter.show("No jobs were created");
        return Ok(());
    }
    if let Some(summary) =
        handle_job_preparation_or_run_directly_if_any_jobs(ctx, &mut client, &mut presenter, &jobs)
            .await?
    {
        report_summary(&summary);
    }
    Ok(())
}
