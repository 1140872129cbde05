//! Field values — the text flowing between hops.
//!
//! A [`Values`] map is the loop-local hop state: every field a predictor
//! filled, plus every observation the action interpreter produced, keyed by
//! field name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signature::Formatter;

/// A single field value: either plain text or a list of passages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Passages(Vec<String>),
}

impl FieldValue {
    /// The plain text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Passages(_) => None,
        }
    }

    /// Render for a prompt, through the field's formatter when it has one.
    pub fn render(&self, formatter: Option<Formatter>) -> String {
        match formatter {
            Some(format) => format(self),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Passages(passages) => f.write_str(&passages.join("\n")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(passages: Vec<String>) -> Self {
        Self::Passages(passages)
    }
}

/// Formats passages as a numbered list of quoted items.
///
/// Plain text is passed through untouched.
pub fn passages_to_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Passages(passages) => match passages.as_slice() {
            [] => "N/A".to_string(),
            [only] => format!("«{only}»"),
            many => many
                .iter()
                .enumerate()
                .map(|(idx, text)| format!("[{}] «{}»", idx + 1, text))
                .collect::<Vec<_>>()
                .join("\n"),
        },
    }
}

/// Mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, FieldValue>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// The text of a field, if present and textual.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    /// Merge another map in; its entries win on conflict.
    pub fn merge(&mut self, other: Values) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<FieldValue>> Extend<(K, V)> for Values {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_inserts_in_order() {
        let mut values = Values::new().with("a", "1");
        values.extend([("a", "2"), ("b", "3")]);
        assert_eq!(values.get_text("a"), Some("2"));
        assert_eq!(values.get_text("b"), Some("3"));
    }

    #[test]
    fn passages_formatting() {
        assert_eq!(passages_to_text(&FieldValue::Passages(vec![])), "N/A");
        assert_eq!(
            passages_to_text(&FieldValue::Passages(vec!["Paris".into()])),
            "«Paris»"
        );
        assert_eq!(
            passages_to_text(&FieldValue::Passages(vec!["a".into(), "b".into()])),
            "[1] «a»\n[2] «b»"
        );
        assert_eq!(passages_to_text(&FieldValue::from("plain")), "plain");
    }

    #[test]
    fn render_uses_formatter_when_given() {
        let value = FieldValue::Passages(vec!["x".into(), "y".into()]);
        assert_eq!(value.render(None), "x\ny");
        assert_eq!(value.render(Some(passages_to_text)), "[1] «x»\n[2] «y»");
    }

    #[test]
    fn merge_overwrites_existing_keys() {
        let mut values = Values::new().with("question", "q1").with("answer", "a1");
        values.merge(Values::new().with("answer", "a2").with("extra", "e"));
        assert_eq!(values.get_text("question"), Some("q1"));
        assert_eq!(values.get_text("answer"), Some("a2"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn get_text_is_none_for_passages() {
        let values = Values::new().with("obs", vec!["a".to_string()]);
        assert!(values.contains("obs"));
        assert_eq!(values.get_text("obs"), None);
    }

    #[test]
    fn untagged_serialization() {
        let values = Values::new()
            .with("answer", "42")
            .with("observations", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"answer": "42", "observations": ["a", "b"]})
        );
    }
}
