use crate::query::QueryKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskId {
    ScholarlyArticles,
    RiksdagenDocuments,
    Thesis,
}

impl TaskId {
    /// The queries run for every search string of a suggestion, in order.
    pub const fn query_kinds(&self) -> &'static [QueryKind] {
        match self {
            Self::ScholarlyArticles => &[QueryKind::ScholarlyArticle, QueryKind::Preprint],
            Self::RiksdagenDocuments => &[QueryKind::RiksdagenDocument],
            Self::Thesis => &[QueryKind::Thesis, QueryKind::TechnicalReport],
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScholarlyArticles => write!(f, "SCHOLARLY_ARTICLES"),
            Self::RiksdagenDocuments => write!(f, "RIKSDAGEN_DOCUMENTS"),
            Self::Thesis => write!(f, "THESIS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub language_code: String,
    pub number_of_queries_per_search_string: usize,
}

impl Task {
    pub fn new(id: TaskId, label: &str, language_code: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            language_code: language_code.to_string(),
            number_of_queries_per_search_string: id.query_kinds().len(),
        }
    }

    /// Wording used in edit summaries and the best practice notice
    pub const fn target_description(&self) -> &str {
        match self.id {
            TaskId::ScholarlyArticles => "scholarly articles and preprints",
            TaskId::RiksdagenDocuments => "documents from the Riksdagen",
            TaskId::Thesis => "theses and technical reports",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.language_code)
    }
}

/// Maps stable task identifiers to their configuration.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Task>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        let tasks = vec![
            Task::new(
                TaskId::ScholarlyArticles,
                "Add main subject to scholarly articles and preprints",
                "en",
            ),
            Task::new(
                TaskId::RiksdagenDocuments,
                "Add main subject to documents from Riksdagen",
                "sv",
            ),
            Task::new(
                TaskId::Thesis,
                "Add main subject to theses and technical reports",
                "en",
            ),
        ];
        Self {
            tasks: tasks.into_iter().map(|task| (task.id, task)).collect(),
        }
    }
}

impl TaskRegistry {
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// The task used when sampling existing main subjects.
    pub fn default_task(&self) -> Option<&Task> {
        self.get(TaskId::ScholarlyArticles)
    }

    /// Tasks in stable identifier order, for menus.
    pub fn tasks(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.tasks.values().map(|task| task.label.to_owned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_by_id() {
        let registry = TaskRegistry::default();
        let task = registry.get(TaskId::RiksdagenDocuments).unwrap();
        assert_eq!(task.language_code, "sv");
        assert_eq!(task.id, TaskId::RiksdagenDocuments);
    }

    #[test]
    fn test_default_task_is_scholarly_articles() {
        let registry = TaskRegistry::default();
        assert_eq!(
            registry.default_task().map(|t| t.id),
            Some(TaskId::ScholarlyArticles)
        );
    }

    #[test]
    fn test_queries_per_search_string_matches_query_kinds() {
        let registry = TaskRegistry::default();
        for task in registry.tasks() {
            assert_eq!(
                task.number_of_queries_per_search_string,
                task.id.query_kinds().len()
            );
        }
        assert_eq!(
            registry
                .get(TaskId::ScholarlyArticles)
                .unwrap()
                .number_of_queries_per_search_string,
            2
        );
    }

    #[test]
    fn test_task_id_serde() {
        let s = serde_json::to_string(&TaskId::Thesis).unwrap();
        assert_eq!(s, "\"THESIS\"");
        let id: TaskId = serde_json::from_str("\"SCHOLARLY_ARTICLES\"").unwrap();
        assert_eq!(id, TaskId::ScholarlyArticles);
        assert_eq!(TaskId::RiksdagenDocuments.to_string(), "RIKSDAGEN_DOCUMENTS");
    }

    #[test]
    fn test_labels_order() {
        let registry = TaskRegistry::default();
        let labels = registry.labels();
        assert_eq!(labels.len(), 3);
        assert!(labels[0].contains("scholarly articles"));
    }
}
