use crate::item::Item;
use crate::ngram::NGram;
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Aliases shorter than this are too ambiguous to search for, unless explicitly allowed
pub const MIN_ALIAS_LENGTH: usize = 5;

/// Options from the command line that shape how suggestions are built and shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArguments {
    pub no_aliases: bool,
    pub show_item_urls: bool,
    pub prepare_jobs: bool,
    pub allowed_aliases: HashSet<String>,
}

/// A main subject together with the strings used to find documents about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub item: Item,
    pub task: TaskId,
    pub search_strings: Vec<String>,
    #[serde(default)]
    pub ngram: Option<NGram>,
}

impl Suggestion {
    pub fn new(item: Item, task: &Task, args: &RunArguments) -> Self {
        let search_strings = Self::extract_search_strings(&item, args);
        Self {
            item,
            task: task.id,
            search_strings,
            ngram: None,
        }
    }

    /// A suggestion for a recognised n-gram. Only the n-gram itself is searched for.
    pub fn new_from_ngram(item: Item, task: &Task, ngram: NGram) -> Self {
        let search_strings = Self::dedup(vec![Self::clean_special_symbols(&ngram.label)]);
        Self {
            item,
            task: task.id,
            search_strings,
            ngram: Some(ngram),
        }
    }

    fn clean_special_symbols(s: &str) -> String {
        s.replace(['®', '™'], "").trim().to_string()
    }

    fn extract_search_strings(item: &Item, args: &RunArguments) -> Vec<String> {
        let mut ret = vec![];
        if let Some(label) = &item.label {
            ret.push(Self::clean_special_symbols(label));
        }
        if !args.no_aliases {
            for alias in &item.aliases {
                let alias = Self::clean_special_symbols(alias);
                if alias.chars().count() < MIN_ALIAS_LENGTH && !args.allowed_aliases.contains(&alias) {
                    debug!("Skipping short alias '{alias}' of {}", item.id);
                    continue;
                }
                ret.push(alias);
            }
        }
        Self::dedup(ret)
    }

    /// Drops empty strings and case-insensitive duplicates, keeping the first occurrence
    fn dedup(strings: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        strings
            .into_iter()
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_lowercase()))
            .collect()
    }

    pub fn number_of_queries(&self, task: &Task) -> usize {
        self.search_strings.len() * task.number_of_queries_per_search_string
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with search strings: {}",
            self.item,
            self.search_strings.join(", ")
        )
    }
}
