use crate::error::BotError;
use crate::item::Item;
use crate::suggestion::Suggestion;
use crate::wikidata::WikidataClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A job that stopped at a failed edit
#[derive(Debug)]
pub struct StoppedJob {
    /// Items edited before the failure
    pub edited: usize,
    pub error: BotError,
}

/// Confirmed matches for one main subject, waiting to be written to Wikidata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    items: Vec<Item>,
    suggestion: Suggestion,
}

impl BatchJob {
    /// Fails on an empty item list; a job always has something to do.
    pub fn new(items: Vec<Item>, suggestion: Suggestion) -> Result<Self, BotError> {
        if items.is_empty() {
            return Err(BotError::InvalidArgument(format!(
                "no items to add {} to",
                suggestion.item.id
            )));
        }
        Ok(Self { items, suggestion })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub const fn suggestion(&self) -> &Suggestion {
        &self.suggestion
    }

    pub fn number_of_items(&self) -> usize {
        self.items.len()
    }

    /// The job for the items from `edited` on, i.e. the ones a stopped run did not get to.
    pub fn remaining_after(&self, edited: usize) -> Option<Self> {
        let items: Vec<Item> = self.items.iter().skip(edited).cloned().collect();
        if items.is_empty() {
            return None;
        }
        Some(Self {
            items,
            suggestion: self.suggestion.clone(),
        })
    }

    pub fn edit_summary(&self) -> String {
        let label = self
            .suggestion
            .item
            .label
            .as_deref()
            .unwrap_or(self.suggestion.item.id.as_str());
        let via = match &self.suggestion.ngram {
            Some(ngram) => format!("n-gram '{}'", ngram.label),
            None => format!("search string(s) '{}'", self.suggestion.search_strings.join("', '")),
        };
        format!(
            "Added [[Property:P921]] main subject [[{}|{label}]] inferred from title using {via}",
            self.suggestion.item.id
        )
    }

    /// Adds the main subject to every item. Stops at the first failed edit.
    pub async fn run(
        &self,
        client: &mut dyn WikidataClient,
        jobs: &[BatchJob],
        job_count: usize,
    ) -> Result<(), StoppedJob> {
        info!(
            "Running job {job_count}/{}: adding {} to {} items",
            jobs.len(),
            self.suggestion.item,
            self.items.len()
        );
        let summary = self.edit_summary();
        for (number, item) in self.items.iter().enumerate() {
            client
                .add_main_subject(&item.id, &self.suggestion.item.id, &summary)
                .await
                .map_err(|error| StoppedJob {
                    edited: number,
                    error,
                })?;
            debug!(
                "{}/{} Added main subject to {}",
                number + 1,
                self.items.len(),
                item
            );
        }
        Ok(())
    }
}
