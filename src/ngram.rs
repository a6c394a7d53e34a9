use crate::error::BotError;
use crate::item::{is_valid_qid, Item};
use crate::presenter::Presenter;
use crate::suggestion::Suggestion;
use crate::task::Task;
use crate::wikidata::WikidataClient;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Search hits offered to the operator
const MAX_CANDIDATES: usize = 10;

/// Candidates that are never named entities of interest
const EXCLUDED_INSTANCES: &[&str] = &[
    "Q13442814", // scholarly article
    "Q5633421",  // scientific journal
];

/// A label extracted from a document, with the number of times it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NGram {
    pub label: String,
    pub frequency: usize,
}

impl NGram {
    pub fn new(label: &str, frequency: usize) -> Self {
        Self {
            label: label.to_string(),
            frequency,
        }
    }

    pub fn search_expression(&self) -> String {
        let mut ret: String = EXCLUDED_INSTANCES
            .iter()
            .map(|q| format!("-haswbstatement:P31={q} "))
            .collect();
        ret += &format!("\"{}\"", self.label.replace('"', ""));
        ret
    }

    /// Searches for entities matching this n-gram and lets the operator pick one.
    /// `Ok(None)` when nothing usable was found or the operator skipped.
    pub async fn recognize_named_entity(
        &self,
        client: &dyn WikidataClient,
        presenter: &mut dyn Presenter,
        task: &Task,
    ) -> Result<Option<Suggestion>, BotError> {
        if self.label.trim().is_empty() {
            return Err(BotError::InvalidArgument("ngram label is empty".to_string()));
        }
        info!("Recognizing named entity for '{}'", self.label);
        let titles = client.search_titles(&self.search_expression()).await?;
        let mut candidates: Vec<Item> = vec![];
        for qid in titles
            .iter()
            .filter(|t| is_valid_qid(t))
            .take(MAX_CANDIDATES)
        {
            let item = Item::fetch(client, qid, task.id, &task.language_code).await?;
            if item.label.is_none() {
                info!("{qid} has no {} label, ignoring", task.language_code);
                continue;
            }
            candidates.push(item);
        }
        if candidates.is_empty() {
            info!("No entity found for '{}'", self.label);
            return Ok(None);
        }
        let options: Vec<String> = candidates.iter().map(|item| item.to_string()).collect();
        let title = format!("Does any of these fit the label '{}'?", self.label);
        let index = match presenter.choose_one(&title, &options) {
            Some(index) if index < candidates.len() => index,
            _ => {
                info!("No match chosen for '{}'", self.label);
                return Ok(None);
            }
        };
        let item = candidates.swap_remove(index);
        Ok(Some(Suggestion::new_from_ngram(item, task, self.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::tests::ScriptedPresenter;
    use crate::task::{TaskId, TaskRegistry};
    use crate::wikidata::tests::StubClient;

    fn task() -> Task {
        TaskRegistry::default()
            .get(TaskId::ScholarlyArticles)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_search_expression() {
        let ngram = NGram::new("climate \"change\"", 3);
        assert_eq!(
            ngram.search_expression(),
            "-haswbstatement:P31=Q13442814 -haswbstatement:P31=Q5633421 \"climate change\""
        );
    }

    fn choosing(choices: &[Option<usize>]) -> ScriptedPresenter {
        ScriptedPresenter {
            choices: choices.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recognize_offers_labelled_hits() {
        let client = StubClient::default()
            .with_search_titles(&["Q125928", "P31", "Q7942", "Q1"])
            .with_entity("Q125928", "climate change", &[])
            .with_entity("Q7942", "climate change mitigation", &[])
            .with_unlabelled_entity("Q1");
        let mut presenter = choosing(&[Some(1)]);
        let suggestion = NGram::new("climate change", 3)
            .recognize_named_entity(&client, &mut presenter, &task())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(suggestion.item.id, "Q7942");
        assert_eq!(suggestion.search_strings, vec!["climate change"]);
        assert_eq!(suggestion.ngram.map(|n| n.frequency), Some(3));
        assert_eq!(
            presenter.prompts,
            vec!["Does any of these fit the label 'climate change'?"]
        );
        assert_eq!(client.entity_lookups(), 3);
    }

    #[tokio::test]
    async fn test_recognize_skipped_by_operator() {
        let client = StubClient::default()
            .with_search_titles(&["Q125928"])
            .with_entity("Q125928", "climate change", &[]);
        let mut presenter = choosing(&[None]);
        let result = NGram::new("climate change", 3)
            .recognize_named_entity(&client, &mut presenter, &task())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_recognize_no_hits() {
        let client = StubClient::default();
        let mut presenter = choosing(&[]);
        let result = NGram::new("xyzzy", 1)
            .recognize_named_entity(&client, &mut presenter, &task())
            .await
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(client.entity_lookups(), 0);
        assert!(presenter.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_recognize_empty_label() {
        let client = StubClient::default();
        let mut presenter = choosing(&[]);
        let result = NGram::new("  ", 1)
            .recognize_named_entity(&client, &mut presenter, &task())
            .await;
        assert!(matches!(result, Err(BotError::InvalidArgument(_))));
    }
}
