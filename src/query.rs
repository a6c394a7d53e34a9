use crate::error::BotError;
use crate::item::Item;
use crate::sparql_item::{Blocklist, SparqlItem};
use crate::task::TaskId;
use crate::wikidata::{WikidataClient, MAIN_SUBJECT_PROPERTY};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Characters removed from search strings. The query template removes the
/// same set from the labels it compares against.
const REMOVED_CHARS: &[char] = &[',', ':', ';', '(', ')', '[', ']'];

/// Escapes a search string for a single-quoted SPARQL literal and drops the punctuation the labels are cleaned of.
pub fn strip_bad_chars(s: &str) -> String {
    let mut ret = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            // e.g. "Dmel\CG5330"
            '\\' => ret.push_str("\\\\"),
            '\'' => ret.push_str("\\'"),
            c if REMOVED_CHARS.contains(&c) => {}
            c => ret.push(c),
        }
    }
    ret
}

/// The kinds of documents searched for. Each one fills in its own query template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ScholarlyArticle,
    Preprint,
    RiksdagenDocument,
    Thesis,
    TechnicalReport,
}

impl QueryKind {
    /// CirrusSearch filter selecting candidate documents
    const fn cirrus_filter(&self) -> &str {
        match self {
            Self::ScholarlyArticle => "haswbstatement:P31=Q13442814",
            Self::Preprint => "haswbstatement:P31=Q580922",
            Self::RiksdagenDocument => "haswbstatement:P8433",
            Self::Thesis => "haswbstatement:P31=Q1266946|P31=Q187685",
            Self::TechnicalReport => "haswbstatement:P31=Q3099732",
        }
    }

    pub const fn name(&self) -> &str {
        match self {
            Self::ScholarlyArticle => "scholarly article",
            Self::Preprint => "preprint",
            Self::RiksdagenDocument => "riksdagen document",
            Self::Thesis => "thesis",
            Self::TechnicalReport => "technical report",
        }
    }

    /// Fills in the template. `search_string` must already have passed [`strip_bad_chars`].
    pub fn build(&self, search_string: &str, main_subject: &str, language_code: &str) -> String {
        let filter = self.cirrus_filter();
        let lowercase = search_string.to_lowercase();
        format!(
            r#"#{name} items with "{search_string}" in the label and without main subject {main_subject}
SELECT DISTINCT ?item ?itemLabel
WHERE {{
  hint:Query hint:optimizer "None".
  SERVICE wikibase:mwapi {{
    bd:serviceParam wikibase:api "Search";
                    wikibase:endpoint "www.wikidata.org";
                    mwapi:srsearch '{filter} -haswbstatement:{property}={main_subject} "{search_string}"' .
    ?title wikibase:apiOutput mwapi:title.
  }}
  BIND(IRI(CONCAT(STR(wd:), ?title)) AS ?item)
  ?item rdfs:label ?label.
  FILTER(LANG(?label) = "{language_code}")
  BIND(REPLACE(LCASE(?label), "[,:;\\(\\)\\[\\]]", "") AS ?cleaned_label)
  FILTER(CONTAINS(CONCAT(" ", ?cleaned_label, " "), ' {lowercase} '))
  MINUS {{ ?item wdt:{property} wd:{main_subject}. }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "{language_code}". }}
}}"#,
            name = self.name(),
            property = MAIN_SUBJECT_PROPERTY,
        )
    }
}

/// One SPARQL search for documents matching a search string.
#[derive(Debug, Clone)]
pub struct Query {
    pub kind: QueryKind,
    pub task: TaskId,
    pub main_subject: String,
    pub language_code: String,
    pub search_string: String,
    pub query_string: String,
    pub results: Value,
    pub items: Vec<Item>,
}

impl Query {
    pub fn new(
        kind: QueryKind,
        task: TaskId,
        search_string: &str,
        main_subject: &str,
        language_code: &str,
    ) -> Self {
        Self {
            kind,
            task,
            main_subject: main_subject.to_string(),
            language_code: language_code.to_string(),
            search_string: search_string.to_string(),
            query_string: String::new(),
            results: Value::Null,
            items: vec![],
        }
    }

    pub fn strip_bad_chars(&mut self) {
        self.search_string = strip_bad_chars(&self.search_string);
    }

    pub fn build_query(&mut self) {
        self.query_string =
            self.kind
                .build(&self.search_string, &self.main_subject, &self.language_code);
    }

    pub async fn execute(&mut self, client: &dyn WikidataClient) -> Result<(), BotError> {
        if self.query_string.is_empty() {
            return Err(BotError::Query("query was not built".to_string()));
        }
        self.results = client.sparql_query(&self.query_string).await?;
        Ok(())
    }

    /// Turns the bindings into items. Invalid rows and blocklisted entities are logged and skipped.
    pub fn parse_results(
        &mut self,
        client: &dyn WikidataClient,
        blocklist: &Blocklist,
    ) -> Result<(), BotError> {
        let bindings = self.results["results"]["bindings"]
            .as_array()
            .ok_or_else(|| BotError::Query("malformed SPARQL result: no bindings".to_string()))?;
        let mut seen: HashSet<String> = self.items.iter().map(|i| i.id.to_owned()).collect();
        for binding in bindings {
            debug!("binding: {binding}");
            let sparql_item = match SparqlItem::validate_qid_and_copy_label(binding, client) {
                Ok(sparql_item) => sparql_item,
                Err(e) => {
                    warn!("Skipping result row: {e}");
                    continue;
                }
            };
            if sparql_item.is_in_blocklist(blocklist) {
                info!("{} found in blocklist, skipping", sparql_item.label);
                continue;
            }
            if seen.insert(sparql_item.id.to_owned()) {
                self.items.push(sparql_item.into_item(self.task));
            }
        }
        Ok(())
    }

    /// Strips, builds, executes and parses, stopping at the first failing step.
    pub async fn get_results(
        &mut self,
        client: &dyn WikidataClient,
        blocklist: &Blocklist,
    ) -> Result<(), BotError> {
        self.strip_bad_chars();
        self.build_query();
        self.execute(client).await?;
        self.parse_results(client, blocklist)
    }

    pub fn print_number_of_results(&self) {
        info!(
            "Got {} {} items from WDQS using the search string {}",
            self.items.len(),
            self.kind.name(),
            self.search_string
        );
    }
}
