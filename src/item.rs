use crate::error::BotError;
use crate::task::TaskId;
use crate::wikidata::WikidataClient;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

lazy_static! {
    static ref RE_QID: Regex = Regex::new(r"^Q[1-9]\d*$").expect("QID regex");
}

/// Removes an entity URI prefix (and surrounding whitespace) from a QID
pub fn strip_prefix(qid: &str) -> String {
    let qid = qid.trim();
    qid.strip_prefix(ENTITY_PREFIX)
        .or_else(|| qid.strip_prefix("https://www.wikidata.org/wiki/"))
        .or_else(|| qid.strip_prefix("wd:"))
        .unwrap_or(qid)
        .to_string()
}

pub fn is_valid_qid(qid: &str) -> bool {
    RE_QID.is_match(qid)
}

/// Label, description and aliases of an entity in one language, as returned by the entity lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInfo {
    pub id: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub task: TaskId,
}

impl Item {
    pub fn new(id: &str, label: Option<String>, task: TaskId) -> Self {
        Self {
            id: id.to_string(),
            label,
            description: None,
            aliases: vec![],
            task,
        }
    }

    /// Resolves a QID into an item in the given language. A missing entity yields an item without label.
    pub async fn fetch(
        client: &dyn WikidataClient,
        qid: &str,
        task: TaskId,
        language_code: &str,
    ) -> Result<Self, BotError> {
        let qid = strip_prefix(qid);
        if !is_valid_qid(&qid) {
            return Err(BotError::InvalidArgument(format!("'{qid}' is not a valid QID")));
        }
        let mut ret = Self::new(&qid, None, task);
        if let Some(info) = client.get_entity(&qid, language_code).await? {
            ret.label = info.label;
            ret.description = info.description;
            ret.aliases = info.aliases;
        }
        Ok(ret)
    }

    pub fn url(&self) -> String {
        format!("https://www.wikidata.org/wiki/{}", self.id)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, &self.description) {
            (Some(label), Some(desc)) => write!(f, "{label} ({}): {desc}", self.id),
            (Some(label), None) => write!(f, "{label} ({})", self.id),
            _ => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikidata::tests::StubClient;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("http://www.wikidata.org/entity/Q42"), "Q42");
        assert_eq!(strip_prefix(" Q42 "), "Q42");
        assert_eq!(strip_prefix("wd:Q5"), "Q5");
        assert_eq!(strip_prefix("https://www.wikidata.org/wiki/Q1"), "Q1");
    }

    #[test]
    fn test_is_valid_qid() {
        assert!(is_valid_qid("Q42"));
        assert!(!is_valid_qid("Q"));
        assert!(!is_valid_qid("Q042"));
        assert!(!is_valid_qid("P31"));
        assert!(!is_valid_qid("q42"));
        assert!(!is_valid_qid(""));
    }

    #[test]
    fn test_display_and_url() {
        let mut item = Item::new("Q42", Some("Douglas Adams".into()), TaskId::ScholarlyArticles);
        assert_eq!(item.to_string(), "Douglas Adams (Q42)");
        item.description = Some("English author".into());
        assert_eq!(item.to_string(), "Douglas Adams (Q42): English author");
        assert_eq!(item.url(), "https://www.wikidata.org/wiki/Q42");
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_qid() {
        let client = StubClient::default();
        let result = Item::fetch(&client, "foo", TaskId::Thesis, "en").await;
        assert!(matches!(result, Err(BotError::InvalidArgument(_))));
        assert_eq!(client.entity_lookups(), 0);
    }

    #[tokio::test]
    async fn test_fetch_copies_entity_info() {
        let client = StubClient::default().with_entity("Q42", "Douglas Adams", &["DNA"]);
        let item = Item::fetch(&client, "wd:Q42", TaskId::ScholarlyArticles, "en")
            .await
            .unwrap();
        assert_eq!(item.id, "Q42");
        assert_eq!(item.label.as_deref(), Some("Douglas Adams"));
        assert_eq!(item.aliases, vec!["DNA".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_entity_has_no_label() {
        let client = StubClient::default();
        let item = Item::fetch(&client, "Q1", TaskId::Thesis, "en").await.unwrap();
        assert_eq!(item.label, None);
    }
}
