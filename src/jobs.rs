use crate::app_state::AppState;
use crate::batch_job::BatchJob;
use crate::console;
use crate::error::BotError;
use crate::item::{is_valid_qid, strip_prefix, Item};
use crate::items::fetcher_for_task;
use crate::ngram::NGram;
use crate::presenter::Presenter;
use crate::suggestion::{RunArguments, Suggestion};
use crate::task::Task;
use crate::wikidata::WikidataClient;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// What came out of trying to turn a main subject into a job
#[derive(Debug)]
pub enum JobOutcome {
    Job(BatchJob),
    /// The item has no label in the task's language
    Skipped,
    /// None of the queries found anything
    NoMatches,
    /// The operator said no
    Declined,
}

impl JobOutcome {
    pub fn into_job(self) -> Option<BatchJob> {
        match self {
            Self::Job(job) => Some(job),
            _ => None,
        }
    }
}

/// Shared settings for assembling jobs
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    pub state: &'a AppState,
    pub args: &'a RunArguments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    /// 1-based position in the run
    pub job_count: usize,
    pub error: String,
    /// The items that were not edited, starting with the one that failed
    pub remaining: Option<BatchJob>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: Vec<FailedJob>,
    pub runtime: Duration,
}

impl RunSummary {
    /// What is left to do after this run
    pub fn remaining_jobs(&self) -> Vec<BatchJob> {
        self.failed
            .iter()
            .filter_map(|failed| failed.remaining.clone())
            .collect()
    }
}

fn validated_qid(qid: &str) -> Result<String, BotError> {
    let qid = strip_prefix(qid);
    if qid.is_empty() {
        return Err(BotError::InvalidArgument("qid was empty".to_string()));
    }
    if !is_valid_qid(&qid) {
        return Err(BotError::InvalidArgument(format!("'{qid}' is not a valid QID")));
    }
    Ok(qid)
}

pub async fn process_qid_into_job(
    ctx: JobContext<'_>,
    client: &dyn WikidataClient,
    presenter: &mut dyn Presenter,
    qid: &str,
    task: &Task,
    confirmation: bool,
) -> Result<JobOutcome, BotError> {
    let qid = validated_qid(qid)?;
    let item = Item::fetch(client, &qid, task.id, &task.language_code).await?;
    if item.label.is_none() {
        let message = format!(
            "Label for {} was None on {}, skipping",
            task.language_code,
            item.url()
        );
        info!("{message}");
        presenter.show(&message);
        return Ok(JobOutcome::Skipped);
    }
    presenter.show(&format!("Working on {item}"));
    let suggestion = Suggestion::new(item, task, ctx.args);
    process_suggestion_into_job(ctx, client, presenter, suggestion, task, confirmation).await
}

/// Fetches candidates for a suggestion and asks the operator whether to queue them.
pub async fn process_suggestion_into_job(
    ctx: JobContext<'_>,
    client: &dyn WikidataClient,
    presenter: &mut dyn Presenter,
    suggestion: Suggestion,
    task: &Task,
    confirmation: bool,
) -> Result<JobOutcome, BotError> {
    if confirmation && !presenter.confirm("Do you want to continue?") {
        return Ok(JobOutcome::Declined);
    }
    presenter.show(&format!(
        "Fetching items with labels that have one of the search strings by running a total of {} queries on WDQS...",
        suggestion.number_of_queries(task)
    ));
    let mut fetcher = fetcher_for_task(task.id);
    fetcher
        .fetch_based_on_label(client, &suggestion, task, ctx.state.blocklist())
        .await?;
    if fetcher.list().is_empty() {
        info!("No matching items found for {}", suggestion.item.id);
        presenter.show("No matching items found");
        return Ok(JobOutcome::NoMatches);
    }
    fetcher.random_shuffle_list();
    presenter.show(&console::found_items_table(
        fetcher.list(),
        ctx.args.show_item_urls,
    ));
    let job = BatchJob::new(fetcher.into_list(), suggestion)?;
    let question = format!(
        "Do you want to add this job for '{}' with {} items to the queue?",
        job.suggestion().item,
        job.number_of_items()
    );
    if presenter.confirm(&question) {
        Ok(JobOutcome::Job(job))
    } else {
        Ok(JobOutcome::Declined)
    }
}

/// Turns operator-supplied QIDs into jobs. All QIDs are validated before anything is fetched.
pub async fn process_user_supplied_qids_into_batch_jobs(
    ctx: JobContext<'_>,
    client: &dyn WikidataClient,
    presenter: &mut dyn Presenter,
    qids: &[String],
    task: &Task,
) -> Result<Vec<BatchJob>, BotError> {
    if qids.is_empty() {
        return Err(BotError::InvalidArgument("no QIDs were given".to_string()));
    }
    let qids = qids
        .iter()
        .map(|qid| validated_qid(qid))
        .collect::<Result<Vec<String>, BotError>>()?;
    presenter.show(&console::best_practice(task));
    let mut jobs = vec![];
    for qid in &qids {
        match process_qid_into_job(ctx, client, presenter, qid, task, false).await {
            Ok(outcome) => jobs.extend(outcome.into_job()),
            Err(e) => {
                warn!("Could not process {qid}: {e}");
                presenter.show(&format!("Could not process {qid}: {e}"));
            }
        }
    }
    Ok(jobs)
}

/// Recognises each n-gram. The operator's pick of the matching entity stands in for the confirmation.
pub async fn process_ngrams_into_batch_jobs(
    ctx: JobContext<'_>,
    client: &dyn WikidataClient,
    presenter: &mut dyn Presenter,
    ngrams: &[NGram],
    task: &Task,
) -> Result<Vec<BatchJob>, BotError> {
    let mut jobs = vec![];
    for ngram in ngrams {
        let suggestion = match ngram.recognize_named_entity(client, presenter, task).await {
            Ok(Some(suggestion)) => suggestion,
            Ok(None) => {
                presenter.show(&format!("No entity found or chosen for '{}'", ngram.label));
                continue;
            }
            Err(e) => {
                warn!("Could not recognize '{}': {e}", ngram.label);
                presenter.show(&format!("Could not recognize '{}': {e}", ngram.label));
                continue;
            }
        };
        presenter.show(&format!("'{}' matched {}", ngram.label, suggestion.item));
        match process_suggestion_into_job(ctx, client, presenter, suggestion, task, false).await {
            Ok(outcome) => jobs.extend(outcome.into_job()),
            Err(e) => {
                warn!("Could not process '{}': {e}", ngram.label);
                presenter.show(&format!("Could not process '{}': {e}", ngram.label));
            }
        }
    }
    Ok(jobs)
}

/// Logs in once and runs the jobs one after another. A failing job is recorded and the rest still run.
pub async fn run_jobs(
    client: &mut dyn WikidataClient,
    presenter: &mut dyn Presenter,
    jobs: &[BatchJob],
) -> Result<RunSummary, BotError> {
    let start_time = Utc::now();
    let mut summary = RunSummary {
        succeeded: 0,
        failed: vec![],
        runtime: Duration::zero(),
    };
    if jobs.is_empty() {
        return Ok(summary);
    }
    presenter.show(console::keep_an_eye_on_wdqs_lag());
    client.login().await?;
    presenter.show(&console::running_jobs(jobs));
    for (num, job) in jobs.iter().enumerate() {
        let job_count = num + 1;
        match job.run(client, jobs, job_count).await {
            Ok(()) => summary.succeeded += 1,
            Err(stopped) => {
                let e = stopped.error;
                error!(
                    "Job {job_count} for {} failed after {} edit(s): {e}",
                    job.suggestion().item.id,
                    stopped.edited
                );
                presenter.show(&format!("Job {job_count} failed: {e}"));
                summary.failed.push(FailedJob {
                    job_count,
                    error: e.to_string(),
                    remaining: job.remaining_after(stopped.edited),
                });
            }
        }
    }
    summary.runtime = Utc::now() - start_time;
    presenter.show(&format!(
        "All jobs are done: {} succeeded, {} failed",
        summary.succeeded,
        summary.failed.len()
    ));
    presenter.show(&format!("Total runtime: {}", summary.runtime));
    Ok(summary)
}

/// Either appends the jobs to the job store or runs them right away.
pub async fn handle_job_preparation_or_run_directly_if_any_jobs(
    ctx: JobContext<'_>,
    client: &mut dyn WikidataClient,
    presenter: &mut dyn Presenter,
    jobs: &[BatchJob],
) -> Result<Option<RunSummary>, BotError> {
    if jobs.is_empty() {
        return Ok(None);
    }
    if ctx.args.prepare_jobs {
        let store = ctx.state.job_store();
        presenter.show(&format!("Adding {} job(s) to the jobs file", jobs.len()));
        for job in jobs {
            store.append(job)?;
        }
        presenter.show(&console::job_statistics(jobs));
        presenter.show(
            "You can run the jobs non-interactively e.g. on the Toolforge Kubernetes cluster using -r or --run-prepared-jobs.",
        );
        Ok(None)
    } else {
        Ok(Some(run_jobs(client, presenter, jobs).await?))
    }
}

/// Runs everything in the job store. Afterwards the store holds only what
/// failed jobs left undone, or is removed when every job succeeded.
pub async fn run_prepared_jobs(
    ctx: JobContext<'_>,
    client: &mut dyn WikidataClient,
    presenter: &mut dyn Presenter,
) -> Result<RunSummary, BotError> {
    let store = ctx.state.job_store();
    let jobs = store.load_all()?;
    presenter.show(&format!(
        "Loaded {} prepared job(s) from {}",
        jobs.len(),
        store.path().display()
    ));
    let summary = run_jobs(client, presenter, &jobs).await?;
    let remaining = summary.remaining_jobs();
    if !remaining.is_empty() {
        warn!(
            "{} job(s) failed, keeping them in {}",
            remaining.len(),
            store.path().display()
        );
        presenter.show(&format!(
            "Kept {} failed job(s) in {} to run again later",
            remaining.len(),
            store.path().display()
        ));
    }
    store.replace_all(&remaining)?;
    Ok(summary)
}

/// Randomly picks main subjects from `main_subjects` for validation until the
/// operator stops or the pool is used up. Returns the QIDs in the order they were picked.
pub async fn get_validated_main_subjects_as_jobs(
    ctx: JobContext<'_>,
    client: &dyn WikidataClient,
    presenter: &mut dyn Presenter,
    main_subjects: &[String],
    jobs: &mut Vec<BatchJob>,
) -> Result<Vec<String>, BotError> {
    if main_subjects.is_empty() {
        return Err(BotError::InvalidArgument("main subjects was empty".to_string()));
    }
    let task = ctx
        .state
        .tasks()
        .default_task()
        .ok_or_else(|| BotError::InvalidArgument("no default task configured".to_string()))?;
    let mut picked_before: HashSet<String> = HashSet::new();
    let mut picked_order = vec![];
    loop {
        let remaining: Vec<&String> = main_subjects
            .iter()
            .filter(|qid| !picked_before.contains(*qid))
            .collect();
        let qid = match remaining.choose(&mut rand::thread_rng()) {
            Some(qid) => (*qid).to_owned(),
            None => {
                presenter.show("All main subjects have been picked");
                break;
            }
        };
        presenter.show("Picking a random main subject");
        picked_before.insert(qid.to_owned());
        picked_order.push(qid.to_owned());
        match process_qid_into_job(ctx, client, presenter, &qid, task, true).await {
            Ok(outcome) => jobs.extend(outcome.into_job()),
            Err(e) => {
                warn!("Could not process {qid}: {e}");
                presenter.show(&format!("Could not process {qid}: {e}"));
            }
        }
        presenter.show(&console::job_statistics(jobs));
        if !presenter.confirm("Match one more?") {
            break;
        }
    }
    Ok(picked_order)
}
