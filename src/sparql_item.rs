use crate::error::BotError;
use crate::item::{is_valid_qid, Item};
use crate::task::TaskId;
use crate::wikidata::WikidataClient;
use serde_json::Value;
use std::collections::HashSet;

/// Used when the config has no `blocklist`
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "Q13442814", // scholarly article
    "Q5633421",  // scientific journal
    "Q737498",   // academic journal
];

/// Entities that must never be proposed as candidates, e.g. the generic
/// "scholarly article" or "scientific journal" items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    qids: HashSet<String>,
    labels: HashSet<String>,
}

impl Blocklist {
    pub fn new<I, J>(qids: I, labels: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            qids: qids.into_iter().collect(),
            labels: labels.into_iter().map(|l| l.trim().to_lowercase()).collect(),
        }
    }

    /// Reads `blocklist` (QIDs) and `blocklist_labels` from the config.
    pub fn new_from_config(config: &Value) -> Self {
        let strings = |key: &str| -> Vec<String> {
            config[key]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default()
        };
        let qids = match config.get("blocklist") {
            Some(_) => strings("blocklist"),
            None => DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
        };
        Self::new(qids, strings("blocklist_labels"))
    }

    pub fn contains_qid(&self, qid: &str) -> bool {
        self.qids.contains(qid)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(&label.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.qids.len() + self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of a WDQS result, with `item` and `itemLabel` bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlItem {
    pub id: String,
    pub label: String,
}

impl SparqlItem {
    /// Validates a binding and copies out its QID and label.
    pub fn validate_qid_and_copy_label(
        binding: &Value,
        client: &dyn WikidataClient,
    ) -> Result<Self, BotError> {
        let uri = binding["item"]["value"]
            .as_str()
            .ok_or_else(|| BotError::Validation(format!("binding without item: {binding}")))?;
        let id = client
            .entity_from_uri(uri)
            .filter(|qid| is_valid_qid(qid))
            .ok_or_else(|| BotError::Validation(format!("'{uri}' is not an item")))?;
        let label = binding["itemLabel"]["value"]
            .as_str()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BotError::Validation(format!("{id} has no label")))?
            .to_string();
        Ok(Self { id, label })
    }

    pub fn is_in_blocklist(&self, blocklist: &Blocklist) -> bool {
        blocklist.contains_qid(&self.id) || blocklist.contains_label(&self.label)
    }

    pub fn into_item(self, task: TaskId) -> Item {
        Item::new(&self.id, Some(self.label), task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikidata::tests::{binding, StubClient};

    #[test]
    fn test_validate_binding() {
        let item = SparqlItem::validate_qid_and_copy_label(&binding("Q123", " Some article "), &StubClient::default()).unwrap();
        assert_eq!(item.id, "Q123");
        assert_eq!(item.label, "Some article");
    }

    #[test]
    fn test_binding_without_item_is_invalid() {
        let b = json!({"itemLabel": {"value": "orphan"}});
        assert!(matches!(
            SparqlItem::validate_qid_and_copy_label(&b, &StubClient::default()),
            Err(BotError::Validation(_))
        ));
    }

    #[test]
    fn test_binding_without_label_is_invalid() {
        let b = json!({"item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q5"}});
        assert!(SparqlItem::validate_qid_and_copy_label(&b, &StubClient::default()).is_err());
    }

    #[test]
    fn test_binding_with_property_uri_is_invalid() {
        let b = binding("P31", "instance of");
        assert!(SparqlItem::validate_qid_and_copy_label(&b, &StubClient::default()).is_err());
    }

    #[test]
    fn test_binding_with_foreign_uri_is_invalid() {
        let b = json!({
            "item": {"type": "uri", "value": "http://example.org/entity/Q5"},
            "itemLabel": {"value": "human"}
        });
        assert!(matches!(
            SparqlItem::validate_qid_and_copy_label(&b, &StubClient::default()),
            Err(BotError::Validation(_))
        ));
    }

    #[test]
    fn test_blocklist_by_qid_and_label() {
        let blocklist = Blocklist::new(
            vec!["Q13442814".to_string()],
            vec!["Scientific Journal".to_string()],
        );
        let by_qid = SparqlItem {
            id: "Q13442814".into(),
            label: "scholarly article".into(),
        };
        let by_label = SparqlItem {
            id: "Q5633421".into(),
            label: "scientific journal".into(),
        };
        let fine = SparqlItem {
            id: "Q1".into(),
            label: "universe".into(),
        };
        assert!(by_qid.is_in_blocklist(&blocklist));
        assert!(by_label.is_in_blocklist(&blocklist));
        assert!(!fine.is_in_blocklist(&blocklist));
    }

    #[test]
    fn test_blocklist_from_config() {
        let config = json!({"blocklist": ["Q1", "Q2"], "blocklist_labels": ["journal"]});
        let blocklist = Blocklist::new_from_config(&config);
        assert_eq!(blocklist.len(), 3);
        assert!(blocklist.contains_qid("Q2"));
        assert!(blocklist.contains_label("Journal"));
        let defaults = Blocklist::new_from_config(&json!({}));
        assert_eq!(defaults.len(), DEFAULT_BLOCKLIST.len());
        assert!(defaults.contains_qid("Q13442814"));
        assert!(Blocklist::new_from_config(&json!({"blocklist": []})).is_empty());
    }
}
