use crate::error::EngineError;
use crate::model::Passage;
use crate::similarity::normalize_whitespace;

/// Retrieval and generation collaborators, seen from the engine.
pub trait EvidenceSource {
    /// Ranked passages for `query`, best first. Empty when nothing matched.
    fn retrieve(&self, query: &str) -> Result<Vec<Passage>, EngineError>;

    /// Independently sampled candidate answers for `query`.
    fn sample(&self, query: &str) -> Result<Vec<String>, EngineError>;

    /// The generator's main answer, when it produces one apart from samples.
    fn primary_answer(&self, _query: &str) -> Result<Option<String>, EngineError> {
        Ok(None)
    }
}

/// Lookup key shared by evidence stores: whitespace-collapsed, lowercased.
pub fn query_key(query: &str) -> String {
    normalize_whitespace(query).to_lowercase()
}
