//! Chat predictor — fills a schema with one chat-completion call.
//!
//! The prompt lists the instructions, a "Follow the following format." block
//! with one `Prefix description` line per field, and then the input values,
//! ending with the first output prefix for the model to continue. The
//! completion is cut into output fields on the prefixes of the later outputs.

use std::sync::Arc;

use async_trait::async_trait;
use hoploop_config::AppConfig;
use hoploop_core::error::PredictError;
use hoploop_core::message::Message;
use hoploop_core::predictor::Predictor;
use hoploop_core::provider::{Provider, ProviderRequest};
use hoploop_core::signature::{FieldSpec, Schema};
use hoploop_core::values::Values;
use tracing::{debug, warn};

/// A [`Predictor`] backed by a chat [`Provider`].
pub struct ChatPredictor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatPredictor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Model, temperature and token limit from the top-level config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Render the prompt for `schema` with the given input `values`.
///
/// Inputs without a value are left out.
pub fn render_prompt(schema: &Schema, values: &Values) -> String {
    let mut sections = Vec::new();
    if !schema.instructions().is_empty() {
        sections.push(schema.instructions().to_string());
    }

    sections.push("---".into());
    sections.push("Follow the following format.".into());
    for field in schema.fields() {
        sections.push(format!("{} {}", field.prefix, field.description));
    }
    sections.push("---".into());

    let mut filled = Vec::new();
    for field in schema.input_fields() {
        if let Some(value) = values.get(&field.name) {
            filled.push(format!("{} {}", field.prefix, value.render(field.formatter)));
        }
    }
    if let Some(first) = schema.output_fields().next() {
        filled.push(first.prefix.clone());
    }
    sections.push(filled.join("\n\n"));

    sections.join("\n\n")
}

/// Split a completion into the output fields of `schema`.
///
/// The first output starts at the beginning of the completion (a repeated
/// prefix is dropped); each later output starts after its own prefix. Once a
/// prefix is missing, the text so far stays with the previous field and every
/// remaining output is filled with empty text, so the result always carries
/// every declared output.
pub fn parse_completion(schema: &Schema, completion: &str) -> Values {
    let outputs: Vec<&FieldSpec> = schema.output_fields().collect();
    let mut values = Values::new();

    let Some(first) = outputs.first() else {
        return values;
    };
    let text = completion.trim_start();
    let mut rest = Some(text.strip_prefix(first.prefix.as_str()).unwrap_or(text));

    for (idx, field) in outputs.iter().enumerate() {
        let Some(current) = rest else {
            values.insert(field.name.as_str(), "");
            continue;
        };
        let next = outputs
            .get(idx + 1)
            .and_then(|next| current.find(next.prefix.as_str()).map(|at| (at, next)));
        match next {
            Some((at, next)) => {
                values.insert(field.name.as_str(), current[..at].trim());
                rest = Some(&current[at + next.prefix.len()..]);
            }
            None => {
                if let Some(missing) = outputs.get(idx + 1) {
                    warn!(field = %missing.name, "Completion is missing an output prefix");
                }
                values.insert(field.name.as_str(), current.trim());
                rest = None;
            }
        }
    }

    values
}

#[async_trait]
impl Predictor for ChatPredictor {
    async fn predict(&self, schema: &Schema, values: &Values) -> Result<Values, PredictError> {
        let prompt = render_prompt(schema, values);
        debug!(
            provider = self.provider.name(),
            model = %self.model,
            outputs = ?schema.output_names(),
            prompt_chars = prompt.len(),
            "Predicting"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        Ok(parse_completion(schema, &response.message.content))
    }
}
