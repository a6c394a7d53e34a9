use crate::error::BotError;
use crate::item::EntityInfo;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time;
use tracing::{debug, info};
use wikimisc::mediawiki::api::Api;
use wikimisc::mediawiki::reqwest::{self, ClientBuilder, StatusCode};
use wikimisc::wikibase::entity_container::EntityContainer;
use wikimisc::wikibase::{
    Entity, EntityTrait, LocaleString, Reference, Snak, Statement, StatementRank,
};

pub const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const WDQS_URL: &str = "https://query.wikidata.org/sparql";
pub const MAIN_SUBJECT_PROPERTY: &str = "P921";
/// "based on heuristic"
pub const BASED_ON_HEURISTIC_PROPERTY: &str = "P887";
/// "inferred from title"
pub const INFERRED_FROM_TITLE: &str = "Q69652283";

/// Everything the bot needs from Wikidata. Implemented against the live API by
/// [`WikidataApi`], and by a stub in tests.
#[async_trait]
pub trait WikidataClient: Send + Sync {
    /// Resolves a QID to its label, description and aliases in `language`.
    async fn get_entity(&self, qid: &str, language: &str) -> Result<Option<EntityInfo>, BotError>;
    /// Titles (QIDs) of the first hits of a CirrusSearch expression.
    async fn search_titles(&self, srsearch: &str) -> Result<Vec<String>, BotError>;
    /// Runs a query on WDQS and returns the raw JSON response.
    async fn sparql_query(&self, sparql: &str) -> Result<Value, BotError>;
    /// The entity ID of a concept URI such as `http://www.wikidata.org/entity/Q42`.
    fn entity_from_uri(&self, uri: &str) -> Option<String>;
    async fn login(&mut self) -> Result<(), BotError>;
    /// Adds `subject` as main subject of `target`, referenced as inferred from title.
    async fn add_main_subject(
        &mut self,
        target: &str,
        subject: &str,
        summary: &str,
    ) -> Result<(), BotError>;
}

/// Turns a WDQS answer into JSON. Anything but a success status is a query error.
pub fn parse_sparql_response(status: StatusCode, body: &str) -> Result<Value, BotError> {
    if !status.is_success() {
        return Err(BotError::Query(format!("SPARQL: WDQS answered {status}")));
    }
    serde_json::from_str(body)
        .map_err(|e| BotError::Query(format!("SPARQL: malformed JSON: {e}")))
}

pub struct WikidataApi {
    api: Api,
    user_agent: String,
    username: Option<String>,
    password: Option<String>,
    edit_token: Option<String>,
}

impl std::fmt::Debug for WikidataApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikidataApi")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("has_edit_token", &self.edit_token.is_some())
            .finish()
    }
}

impl WikidataApi {
    pub async fn new(
        user_agent: &str,
        username: Option<String>,
        password: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, BotError> {
        let timeout = time::Duration::from_secs(timeout_seconds);
        let builder = ClientBuilder::new().timeout(timeout);
        let mut api = Api::new_from_builder(WIKIDATA_API_URL, builder)
            .await
            .map_err(|e| BotError::Query(format!("Can't talk to Wikidata API: {e}")))?;
        api.set_user_agent(user_agent);
        Ok(Self {
            api,
            user_agent: user_agent.to_string(),
            username,
            password,
            edit_token: None,
        })
    }

    fn in_language(strings: &[LocaleString], language: &str) -> Vec<String> {
        strings
            .iter()
            .filter(|s| s.language() == language)
            .map(|s| s.value().to_string())
            .collect()
    }

    fn entity_info(qid: &str, language: &str, entity: &Entity) -> EntityInfo {
        EntityInfo {
            id: qid.to_string(),
            label: Self::in_language(entity.labels(), language).into_iter().next(),
            description: Self::in_language(entity.descriptions(), language)
                .into_iter()
                .next(),
            aliases: Self::in_language(entity.aliases(), language),
        }
    }

    fn check_edit_response(j: &Value) -> Result<(), BotError> {
        match j.get("error") {
            Some(error) => Err(BotError::Edit(
                error["info"]
                    .as_str()
                    .unwrap_or("unknown API error")
                    .to_string(),
            )),
            None => Ok(()),
        }
    }

    /// P921 statement with its "inferred from title" reference
    fn main_subject_statement(subject: &str) -> Statement {
        let reference = Reference::new(vec![Snak::new_item(
            BASED_ON_HEURISTIC_PROPERTY,
            INFERRED_FROM_TITLE,
        )]);
        Statement::new(
            "statement",
            StatementRank::Normal,
            Snak::new_item(MAIN_SUBJECT_PROPERTY, subject),
            vec![],
            vec![reference],
        )
    }

    /// `data` for a `wbeditentity` call that adds the statement and its reference in one revision.
    fn main_subject_edit_data(subject: &str) -> Result<String, BotError> {
        let statement = serde_json::to_value(Self::main_subject_statement(subject))
            .map_err(|e| BotError::Edit(format!("can not serialize statement: {e}")))?;
        Ok(json!({ "claims": [statement] }).to_string())
    }

    /// The session's CSRF token, fetched on first use
    async fn edit_token(&mut self) -> Result<String, BotError> {
        if let Some(token) = &self.edit_token {
            return Ok(token.to_owned());
        }
        let token = self
            .api
            .get_edit_token()
            .await
            .map_err(|e| BotError::Edit(format!("edit token: {e}")))?;
        self.edit_token = Some(token.to_owned());
        Ok(token)
    }
}

#[async_trait]
impl WikidataClient for WikidataApi {
    async fn get_entity(&self, qid: &str, language: &str) -> Result<Option<EntityInfo>, BotError> {
        let entities = EntityContainer::new();
        entities
            .load_entities(&self.api, &vec![qid.to_string()])
            .await
            .map_err(|e| BotError::Query(format!("wbgetentities {qid}: {e}")))?;
        Ok(entities
            .get_entity(qid)
            .map(|entity| Self::entity_info(qid, language, &entity)))
    }

    async fn search_titles(&self, srsearch: &str) -> Result<Vec<String>, BotError> {
        let params = self.api.params_into(&[
            ("action", "query"),
            ("list", "search"),
            ("srprop", ""),
            ("srlimit", "10"),
            ("sroffset", "0"),
            ("srsearch", srsearch),
        ]);
        let j = self
            .api
            .get_query_api_json(&params)
            .await
            .map_err(|e| BotError::Query(format!("search: {e}")))?;
        let results = match j["query"]["search"].as_array() {
            Some(results) => results,
            None => return Ok(vec![]),
        };
        Ok(results
            .iter()
            .filter_map(|result| result["title"].as_str())
            .map(|s| s.to_string())
            .collect())
    }

    async fn sparql_query(&self, sparql: &str) -> Result<Value, BotError> {
        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("query".to_string(), sparql.to_string());
        params.insert("format".to_string(), "json".to_string());

        let response = self
            .api
            .client()
            .post(WDQS_URL)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .form(&params)
            .send()
            .await
            .map_err(|e| BotError::Query(format!("SPARQL: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BotError::Query(format!("SPARQL: {e}")))?;
        parse_sparql_response(status, &text)
    }

    fn entity_from_uri(&self, uri: &str) -> Option<String> {
        self.api.extract_entity_from_uri(uri).ok()
    }

    async fn login(&mut self) -> Result<(), BotError> {
        let (username, password) = match (&self.username, &self.password) {
            (Some(u), Some(p)) => (u.to_owned(), p.to_owned()),
            _ => {
                return Err(BotError::InvalidArgument(
                    "username and password are required to log in".to_string(),
                ))
            }
        };
        self.api
            .login(username.as_str(), password.as_str())
            .await
            .map_err(|e| BotError::Edit(format!("login: {e}")))?;
        self.edit_token = None;
        info!("Logged in as {username}");
        Ok(())
    }

    async fn add_main_subject(
        &mut self,
        target: &str,
        subject: &str,
        summary: &str,
    ) -> Result<(), BotError> {
        let data = Self::main_subject_edit_data(subject)?;
        let token = self.edit_token().await?;
        let params = self.api.params_into(&[
            ("action", "wbeditentity"),
            ("id", target),
            ("data", data.as_str()),
            ("summary", summary),
            ("bot", "1"),
            ("token", token.as_str()),
        ]);
        let j = self
            .api
            .post_query_api_json_mut(&params)
            .await
            .map_err(|e| BotError::Edit(format!("wbeditentity on {target}: {e}")))?;
        if j["error"]["code"].as_str() == Some("badtoken") {
            self.edit_token = None;
        }
        Self::check_edit_response(&j)?;
        debug!("Added {subject} as main subject of {target}");
        Ok(())
    }
}
