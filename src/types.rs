use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /query`. The field defaults to empty so a JSON object
/// without `query` is treated the same as an empty query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

/// Which path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Predefined,
    Model,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Predefined => write!(f, "predefined"),
            Source::Model => write!(f, "model"),
        }
    }
}

// for the frontend to consume
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub source: Source,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Predefined).unwrap(), "\"predefined\"");
        assert_eq!(serde_json::to_string(&Source::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn query_field_defaults_to_empty() {
        let req: QueryRequest = serde_json::from_str("{}").unwrap();
        assert!(req.query.is_empty());
    }
}
