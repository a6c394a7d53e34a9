use crate::error::BotError;
use crate::job_store::JobStore;
use crate::sparql_item::Blocklist;
use crate::suggestion::RunArguments;
use crate::task::TaskRegistry;
use crate::wikidata::WikidataApi;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_USER_AGENT: &str = "itemsubjector_rs/0.1";
const DEFAULT_JOBS_FILE: &str = "prepared_jobs.jsonl";
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_MAIN_SUBJECTS_LIMIT: u64 = 1000;

// ---------------------------------------------------------------------------
// AppState – config-derived settings, task registry, blocklist and job store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppState {
    config: Value,
    tasks: TaskRegistry,
    blocklist: Blocklist,
    job_store: JobStore,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new_from_config(&json!({}))
    }
}

impl AppState {
    pub fn new_from_config(config: &Value) -> Self {
        let jobs_file = config["jobs_file"].as_str().unwrap_or(DEFAULT_JOBS_FILE);
        Self {
            config: config.to_owned(),
            tasks: TaskRegistry::default(),
            blocklist: Blocklist::new_from_config(config),
            job_store: JobStore::new(jobs_file),
        }
    }

    // ------------------------------------------------------------------
    // Config accessors
    // ------------------------------------------------------------------

    pub fn user_agent(&self) -> &str {
        self.config["user_agent"]
            .as_str()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn username(&self) -> Option<String> {
        self.config["username"].as_str().map(|s| s.to_string())
    }

    pub fn password(&self) -> Option<String> {
        self.config["password"].as_str().map(|s| s.to_string())
    }

    pub fn http_timeout_seconds(&self) -> u64 {
        self.config["http_timeout_seconds"]
            .as_u64()
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS)
    }

    /// How many existing main subjects to fetch as sampling pool
    pub fn main_subjects_limit(&self) -> u64 {
        self.config["main_subjects_limit"]
            .as_u64()
            .unwrap_or(DEFAULT_MAIN_SUBJECTS_LIMIT)
    }

    /// Short aliases that are specific enough to be searched for anyway
    pub fn allowed_aliases(&self) -> HashSet<String> {
        self.config["allowed_aliases"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    pub const fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub const fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    pub const fn job_store(&self) -> &JobStore {
        &self.job_store
    }

    /// Run arguments with the config-derived parts filled in
    pub fn run_arguments(&self, no_aliases: bool, show_item_urls: bool, prepare_jobs: bool) -> RunArguments {
        RunArguments {
            no_aliases,
            show_item_urls,
            prepare_jobs,
            allowed_aliases: self.allowed_aliases(),
        }
    }

    pub async fn wikidata_client(&self) -> Result<WikidataApi, BotError> {
        WikidataApi::new(
            self.user_agent(),
            self.username(),
            self.password(),
            self.http_timeout_seconds(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;
    use std::path::Path;

    #[test]
    fn test_defaults() {
        let state = AppState::default();
        assert_eq!(state.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(state.username(), None);
        assert_eq!(state.http_timeout_seconds(), 120);
        assert_eq!(state.main_subjects_limit(), 1000);
        assert_eq!(state.job_store().path(), Path::new("prepared_jobs.jsonl"));
        assert!(state.blocklist().contains_qid("Q13442814"));
        assert!(state.allowed_aliases().is_empty());
    }

    #[test]
    fn test_values_from_config() {
        let state = AppState::new_from_config(&json!({
            "user_agent": "test-agent/1.0",
            "username": "Bot",
            "password": "secret",
            "jobs_file": "/tmp/jobs.jsonl",
            "http_timeout_seconds": 30,
            "main_subjects_limit": 50,
            "blocklist": ["Q1"],
            "allowed_aliases": ["DNA", "RNA"]
        }));
        assert_eq!(state.user_agent(), "test-agent/1.0");
        assert_eq!(state.username().as_deref(), Some("Bot"));
        assert_eq!(state.password().as_deref(), Some("secret"));
        assert_eq!(state.job_store().path(), Path::new("/tmp/jobs.jsonl"));
        assert_eq!(state.http_timeout_seconds(), 30);
        assert_eq!(state.main_subjects_limit(), 50);
        assert!(state.blocklist().contains_qid("Q1"));
        assert!(!state.blocklist().contains_qid("Q13442814"));
        let args = state.run_arguments(true, false, true);
        assert!(args.no_aliases);
        assert!(args.prepare_jobs);
        assert!(args.allowed_aliases.contains("RNA"));
    }

    #[test]
    fn test_task_registry_is_available() {
        let state = AppState::default();
        assert!(state.tasks().get(TaskId::Thesis).is_some());
    }
}
