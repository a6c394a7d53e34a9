use crate::error::BotError;
use crate::item::is_valid_qid;
use crate::wikidata::{WikidataClient, MAIN_SUBJECT_PROPERTY};
use std::collections::HashSet;
use tracing::info;

fn main_subjects_query(limit: u64) -> String {
    format!(
        r#"SELECT DISTINCT ?subject
WHERE {{
  SERVICE bd:sample {{
    ?article wdt:{MAIN_SUBJECT_PROPERTY} ?subject.
    bd:serviceParam bd:sample.limit {limit} .
  }}
  ?article wdt:P31 wd:Q13442814.
}}"#
    )
}

/// Samples main subjects already used on scholarly articles, as a pool for
/// finding more articles about them.
pub async fn fetch_main_subjects(
    client: &dyn WikidataClient,
    limit: u64,
) -> Result<Vec<String>, BotError> {
    if limit == 0 {
        return Err(BotError::InvalidArgument(
            "main subjects limit must be positive".to_string(),
        ));
    }
    let j = client.sparql_query(&main_subjects_query(limit)).await?;
    let bindings = j["results"]["bindings"]
        .as_array()
        .ok_or_else(|| BotError::Query("malformed SPARQL result: no bindings".to_string()))?;
    let mut seen = HashSet::new();
    let ret: Vec<String> = bindings
        .iter()
        .filter_map(|b| b["subject"]["value"].as_str())
        .filter_map(|uri| client.entity_from_uri(uri))
        .filter(|qid| is_valid_qid(qid))
        .filter(|qid| seen.insert(qid.to_owned()))
        .collect();
    info!("Got {} main subjects from WDQS", ret.len());
    Ok(ret)
}
