//! `Search[query]` — passage retrieval over an in-memory corpus.
//!
//! Passages are ranked by how many distinct query terms they contain; ties
//! keep corpus order. This is the default retrieval tool of the tool loop:
//! results come back as [`ToolOutput::Retrieval`], so only the passages
//! become the observation.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use hoploop_core::error::ToolError;
use hoploop_core::tool::{Tool, ToolOutput};
use serde::Deserialize;
use tracing::{debug, info};

pub struct SearchTool {
    passages: Vec<String>,
    k: usize,
}

/// One JSONL corpus line. Either key may hold the passage text.
#[derive(Deserialize)]
struct CorpusLine {
    #[serde(default)]
    long_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl SearchTool {
    pub fn new(passages: Vec<String>, k: usize) -> Self {
        Self { passages, k }
    }

    /// Load a corpus file: one passage per line, either plain text or a
    /// JSON object with a `long_text` or `text` key. Blank lines are skipped.
    pub fn from_file(path: &Path, k: usize) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "Search".into(),
            reason: format!("failed to read corpus {}: {e}", path.display()),
        })?;

        let mut passages = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('{') {
                let parsed: CorpusLine =
                    serde_json::from_str(line).map_err(|e| ToolError::ExecutionFailed {
                        tool_name: "Search".into(),
                        reason: format!("{}:{}: {e}", path.display(), lineno + 1),
                    })?;
                if let Some(text) = parsed.long_text.or(parsed.text) {
                    passages.push(text);
                }
            } else {
                passages.push(line.to_string());
            }
        }

        info!(path = %path.display(), passages = passages.len(), "Loaded search corpus");
        Ok(Self::new(passages, k))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Top `k` passages for `query`, best first.
    pub fn retrieve(&self, query: &str) -> Vec<String> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .passages
            .iter()
            .enumerate()
            .filter_map(|(idx, passage)| {
                let score = query_terms.intersection(&terms(passage)).count();
                (score > 0).then_some((idx, score))
            })
            .collect();
        // stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(self.k)
            .map(|(idx, _)| self.passages[idx].clone())
            .collect()
    }
}

/// Lowercased alphanumeric words longer than two characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "Search"
    }

    fn input_variable(&self) -> &str {
        "query"
    }

    fn description(&self) -> &str {
        "takes a search query and returns one or more potentially relevant passages from a corpus"
    }

    async fn invoke(&self, input: &str) -> Result<ToolOutput, ToolError> {
        let passages = self.retrieve(input);
        debug!(query = %input, hits = passages.len(), "Search");
        Ok(ToolOutput::Retrieval {
            query: input.to_string(),
            passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> Vec<String> {
        vec![
            "Paris is the capital and largest city of France.".into(),
            "Berlin is the capital of Germany.".into(),
            "The Seine flows through Paris.".into(),
            "Mount Everest is the highest mountain.".into(),
        ]
    }

    #[test]
    fn ranks_by_term_overlap() {
        let tool = SearchTool::new(corpus(), 3);
        let hits = tool.retrieve("capital of France");
        assert_eq!(hits[0], "Paris is the capital and largest city of France.");
        assert_eq!(hits[1], "Berlin is the capital of Germany.");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn respects_k() {
        let tool = SearchTool::new(corpus(), 1);
        assert_eq!(tool.retrieve("Paris capital").len(), 1);
    }

    #[test]
    fn no_terms_no_hits() {
        let tool = SearchTool::new(corpus(), 3);
        assert!(tool.retrieve("?!").is_empty());
        assert!(tool.retrieve("quantum chromodynamics").is_empty());
    }

    #[tokio::test]
    async fn invoke_returns_retrieval() {
        let tool = SearchTool::new(corpus(), 3);
        let output = tool.invoke("Seine").await.unwrap();
        assert_eq!(
            output,
            ToolOutput::Retrieval {
                query: "Seine".into(),
                passages: vec!["The Seine flows through Paris.".into()],
            }
        );
    }

    #[test]
    fn loads_text_and_jsonl_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Plain passage about Rust.").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"long_text": "Long passage about Tokio."}}"#).unwrap();
        writeln!(file, r#"{{"text": "Short passage about Serde."}}"#).unwrap();

        let tool = SearchTool::from_file(file.path(), 3).unwrap();
        assert_eq!(tool.len(), 3);
        assert_eq!(tool.retrieve("tokio"), vec!["Long passage about Tokio."]);
    }

    #[test]
    fn malformed_jsonl_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{not json").unwrap();
        assert!(SearchTool::from_file(file.path(), 3).is_err());
    }
}
