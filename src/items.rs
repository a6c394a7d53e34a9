use crate::error::BotError;
use crate::item::Item;
use crate::query::{Query, QueryKind};
use crate::sparql_item::Blocklist;
use crate::suggestion::Suggestion;
use crate::task::{Task, TaskId};
use crate::wikidata::WikidataClient;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::info;

/// Collection of candidate documents for one suggestion.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    fn name(&self) -> String;
    fn list(&self) -> &[Item];
    fn into_list(self: Box<Self>) -> Vec<Item>;
    fn random_shuffle_list(&mut self);
    /// Runs one query per search string and query kind of the task, collecting the union of the results.
    async fn fetch_based_on_label(
        &mut self,
        client: &dyn WikidataClient,
        suggestion: &Suggestion,
        task: &Task,
        blocklist: &Blocklist,
    ) -> Result<(), BotError>;
}

/// Picks the fetcher for a task
pub fn fetcher_for_task(id: TaskId) -> Box<dyn ItemFetcher> {
    match id {
        TaskId::ScholarlyArticles => Box::new(ScholarlyArticleItems::default()),
        TaskId::RiksdagenDocuments => Box::new(RiksdagenDocumentItems::default()),
        TaskId::Thesis => Box::new(ThesisItems::default()),
    }
}

/// Deduplicated union of query results, shared by all fetchers
#[derive(Debug, Clone, Default)]
pub struct ItemList {
    list: Vec<Item>,
    seen: HashSet<String>,
}

impl ItemList {
    fn extend(&mut self, items: Vec<Item>) {
        for item in items {
            if self.seen.insert(item.id.to_owned()) {
                self.list.push(item);
            }
        }
    }

    fn shuffle(&mut self) {
        self.list.shuffle(&mut rand::thread_rng());
    }

    async fn run_queries(
        &mut self,
        kinds: &[QueryKind],
        client: &dyn WikidataClient,
        suggestion: &Suggestion,
        task: &Task,
        blocklist: &Blocklist,
    ) -> Result<(), BotError> {
        for search_string in &suggestion.search_strings {
            for kind in kinds {
                let mut query = Query::new(
                    *kind,
                    task.id,
                    search_string,
                    &suggestion.item.id,
                    &task.language_code,
                );
                query.get_results(client, blocklist).await?;
                query.print_number_of_results();
                self.extend(query.items);
            }
        }
        Ok(())
    }
}

macro_rules! item_fetcher {
    ($name:ident, $label:expr, $task:expr) => {
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            items: ItemList,
        }

        #[async_trait]
        impl ItemFetcher for $name {
            fn name(&self) -> String {
                $label.to_string()
            }

            fn list(&self) -> &[Item] {
                &self.items.list
            }

            fn into_list(self: Box<Self>) -> Vec<Item> {
                self.items.list
            }

            fn random_shuffle_list(&mut self) {
                self.items.shuffle();
            }

            async fn fetch_based_on_label(
                &mut self,
                client: &dyn WikidataClient,
                suggestion: &Suggestion,
                task: &Task,
                blocklist: &Blocklist,
            ) -> Result<(), BotError> {
                if task.id != $task {
                    return Err(BotError::InvalidArgument(format!(
                        "{} can not fetch items for task {}",
                        self.name(),
                        task.id
                    )));
                }
                self.items
                    .run_queries(task.id.query_kinds(), client, suggestion, task, blocklist)
                    .await?;
                info!(
                    "Found {} {} for {}",
                    self.items.list.len(),
                    self.name(),
                    suggestion.item
                );
                Ok(())
            }
        }
    };
}

item_fetcher!(ScholarlyArticleItems, "scholarly articles", TaskId::ScholarlyArticles);
item_fetcher!(RiksdagenDocumentItems, "riksdagen documents", TaskId::RiksdagenDocuments);
item_fetcher!(ThesisItems, "theses", TaskId::Thesis);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::RunArguments;
    use crate::task::TaskRegistry;
    use crate::wikidata::tests::{binding, StubClient};

    fn suggestion_for(task: &Task, aliases: &[&str]) -> Suggestion {
        let mut item = Item::new("Q42", Some("Douglas Adams".into()), task.id);
        item.aliases = aliases.iter().map(|s| s.to_string()).collect();
        Suggestion::new(item, task, &RunArguments::default())
    }

    #[tokio::test]
    async fn test_one_query_per_search_string_and_kind() {
        let registry = TaskRegistry::default();
        let task = registry.get(TaskId::ScholarlyArticles).unwrap();
        let suggestion = suggestion_for(task, &["Douglas Noel Adams"]);
        let client = StubClient::default();
        let mut fetcher = fetcher_for_task(task.id);
        fetcher
            .fetch_based_on_label(&client, &suggestion, task, &Blocklist::default())
            .await
            .unwrap();
        assert_eq!(client.query_count(), suggestion.number_of_queries(task));
        assert_eq!(client.query_count(), 4);
        assert!(fetcher.list().is_empty());
    }

    #[tokio::test]
    async fn test_union_is_deduplicated() {
        let registry = TaskRegistry::default();
        let task = registry.get(TaskId::ScholarlyArticles).unwrap();
        let suggestion = suggestion_for(task, &[]);
        let client = StubClient::default()
            .with_bindings(vec![binding("Q1", "douglas adams a"), binding("Q2", "douglas adams b")])
            .with_bindings_for(
                "preprint items",
                vec![binding("Q2", "douglas adams b"), binding("Q3", "douglas adams c")],
            );
        let mut fetcher = fetcher_for_task(task.id);
        fetcher
            .fetch_based_on_label(&client, &suggestion, task, &Blocklist::default())
            .await
            .unwrap();
        fetcher.random_shuffle_list();
        let mut ids: Vec<String> = fetcher.into_list().into_iter().map(|i| i.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["Q1", "Q2", "Q3"]);
    }

    #[tokio::test]
    async fn test_riksdagen_uses_swedish() {
        let registry = TaskRegistry::default();
        let task = registry.get(TaskId::RiksdagenDocuments).unwrap();
        let suggestion = suggestion_for(task, &[]);
        let client = StubClient::default();
        let mut fetcher = fetcher_for_task(task.id);
        assert_eq!(fetcher.name(), "riksdagen documents");
        fetcher
            .fetch_based_on_label(&client, &suggestion, task, &Blocklist::default())
            .await
            .unwrap();
        let queries = client.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("haswbstatement:P8433"));
        assert!(queries[0].contains(r#"FILTER(LANG(?label) = "sv")"#));
    }

    #[tokio::test]
    async fn test_fetcher_rejects_other_task() {
        let registry = TaskRegistry::default();
        let task = registry.get(TaskId::Thesis).unwrap();
        let suggestion = suggestion_for(task, &[]);
        let client = StubClient::default();
        let mut fetcher = ScholarlyArticleItems::default();
        let result = fetcher
            .fetch_based_on_label(&client, &suggestion, task, &Blocklist::default())
            .await;
        assert!(matches!(result, Err(BotError::InvalidArgument(_))));
        assert_eq!(client.query_count(), 0);
    }
}
