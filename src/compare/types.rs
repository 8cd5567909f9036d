use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CompareError;
use crate::agent::AgentStep;

/// Which answering pipeline a request runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One merged index over both documents, one QA call.
    Concatenated,
    /// One index per document, exposed as tools to an agent.
    ToolRouted,
}

impl Strategy {
    pub fn selector(&self) -> &'static str {
        match self {
            Strategy::Concatenated => "concat",
            Strategy::ToolRouted => "function_calling",
        }
    }
}

impl FromStr for Strategy {
    type Err = CompareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "concat" => Ok(Strategy::Concatenated),
            "function_calling" => Ok(Strategy::ToolRouted),
            other => Err(CompareError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Raw request fields as posted by the page (or as JSON).
///
/// Every field defaults to empty so that missing values reach the
/// orchestrator and fail with a typed error instead of a rejection.
/// The question may arrive as `query` or `question`; a non-blank `query`
/// wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "WireForm")]
pub struct CompareForm {
    pub query: String,
    pub doc1: String,
    pub doc2: String,
    pub comparison: String,
}

#[derive(Deserialize)]
struct WireForm {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    doc1: String,
    #[serde(default)]
    doc2: String,
    #[serde(default)]
    comparison: String,
}

impl From<WireForm> for CompareForm {
    fn from(wire: WireForm) -> Self {
        let query = match (wire.query, wire.question) {
            (Some(query), _) if !query.trim().is_empty() => query,
            (query, question) => question.or(query).unwrap_or_default(),
        };
        Self {
            query,
            doc1: wire.doc1,
            doc2: wire.doc2,
            comparison: wire.comparison,
        }
    }
}

/// A validated request. Lives for one request only.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    pub doc1: String,
    pub doc2: String,
    pub question: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnswerResult {
    pub answer: String,
    #[serde(rename = "elapsed_embed")]
    pub elapsed_embed_ms: u64,
    #[serde(rename = "elapsed_chain")]
    pub elapsed_chain_ms: u64,
    pub model_name: String,
    pub steps: Vec<AgentStep>,
}

/// Externally-bound stages that run under their own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Embed,
    Chain,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Embed => f.write_str("embedding"),
            Phase::Chain => f.write_str("chain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strategy_selectors_parse() {
        assert_eq!("concat".parse::<Strategy>().unwrap(), Strategy::Concatenated);
        assert_eq!(
            "function_calling".parse::<Strategy>().unwrap(),
            Strategy::ToolRouted
        );
        assert!(matches!(
            "xyz".parse::<Strategy>(),
            Err(CompareError::UnknownStrategy(s)) if s == "xyz"
        ));
    }

    #[test]
    fn form_accepts_question_alias_and_missing_fields() {
        let form: CompareForm =
            serde_json::from_value(json!({ "question": "why?", "doc1": "a" })).unwrap();
        assert_eq!(form.query, "why?");
        assert_eq!(form.doc1, "a");
        assert!(form.doc2.is_empty());
        assert!(form.comparison.is_empty());
    }

    #[test]
    fn non_blank_query_wins_over_question() {
        let form: CompareForm = serde_json::from_value(
            json!({ "query": "from query", "question": "from question" }),
        )
        .unwrap();
        assert_eq!(form.query, "from query");

        let form: CompareForm =
            serde_json::from_value(json!({ "query": "  ", "question": "from question" }))
                .unwrap();
        assert_eq!(form.query, "from question");
    }

    #[test]
    fn answer_serializes_with_wire_names() {
        let result = AnswerResult {
            answer: "Paris".to_string(),
            elapsed_embed_ms: 12,
            elapsed_chain_ms: 34,
            model_name: "gpt-4-0613".to_string(),
            steps: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "answer": "Paris",
                "elapsed_embed": 12,
                "elapsed_chain": 34,
                "model_name": "gpt-4-0613",
                "steps": []
            })
        );
    }
}
