use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// A required argument was missing or malformed. Raised before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// WDQS or the Wikidata API was unreachable, answered with an error, or sent malformed JSON.
    #[error("query failed: {0}")]
    Query(String),
    /// A single result row could not be turned into an item.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("job store: {0}")]
    JobStore(String),
    #[error("edit failed: {0}")]
    Edit(String),
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        Self::JobStore(e.to_string())
    }
}

impl From<std::io::Error> for BotError {
    fn from(e: std::io::Error) -> Self {
        Self::JobStore(e.to_string())
    }
}
