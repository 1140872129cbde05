//! Signatures — the prompt schema a predictor fills.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s plus free-text
//! instructions. Field order is significant: predictors render fields in
//! declaration order, so two structurally equal schemas produce the same
//! prompt.
//!
//! Schemas are plain values. The loops build a fresh one per hop (or per
//! code-loop mode) and never mutate one after handing it to a predictor.

use std::fmt;
use std::str::FromStr;

use crate::error::SignatureError;
use crate::values::FieldValue;

/// Renders a field value into prompt text.
pub type Formatter = fn(&FieldValue) -> String;

/// Whether the predictor reads or fills a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Input,
    Output,
}

/// A single named field of a schema.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
    /// Label the field is introduced with in the prompt, e.g. `Thought 1:`.
    pub prefix: String,
    pub description: String,
    pub formatter: Option<Formatter>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, role: FieldRole) -> Self {
        let name = name.into();
        Self {
            prefix: infer_prefix(&name),
            description: format!("${{{name}}}"),
            name,
            role,
            formatter: None,
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, FieldRole::Input)
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, FieldRole::Output)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// The same field with a different role.
    pub fn as_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    pub fn is_input(&self) -> bool {
        self.role == FieldRole::Input
    }

    pub fn is_output(&self) -> bool {
        self.role == FieldRole::Output
    }
}

impl PartialEq for FieldSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.role == other.role
            && self.prefix == other.prefix
            && self.description == other.description
            && match (self.formatter, other.formatter) {
                (Some(a), Some(b)) => std::ptr::fn_addr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("prefix", &self.prefix)
            .field("description", &self.description)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// `generated_code` → `Generated Code:`.
fn infer_prefix(name: &str) -> String {
    let words: Vec<String> = name
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            if word.chars().all(|c| !c.is_lowercase()) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("{}:", words.join(" "))
}

/// An ordered set of uniquely named fields plus instructions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    instructions: String,
}

impl Schema {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            instructions: instructions.into(),
        }
    }

    /// Add a field. A field with the same name is replaced in place, so names
    /// stay unique and the original position is kept.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn input_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_input())
    }

    pub fn output_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_output())
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.input_fields().map(|f| f.name.as_str()).collect()
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.output_fields().map(|f| f.name.as_str()).collect()
    }
}

/// Backtick-quoted, comma-joined field names: `` `a`, `b` ``.
pub fn quote_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for Schema {
    type Err = SignatureError;

    /// Parses the `"question, context -> answer"` shorthand.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (inputs, outputs) = s
            .split_once("->")
            .ok_or_else(|| SignatureError::Malformed(format!("missing `->` in `{s}`")))?;

        let parse_names = |part: &str| -> Result<Vec<String>, SignatureError> {
            part.split(',')
                .map(str::trim)
                .map(|name| {
                    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                        Err(SignatureError::Malformed(format!(
                            "invalid field name `{name}` in `{s}`"
                        )))
                    } else {
                        Ok(name.to_string())
                    }
                })
                .collect()
        };

        let inputs = parse_names(inputs)?;
        let outputs = parse_names(outputs)?;

        let mut schema = Schema::default();
        for name in &inputs {
            if schema.field(name).is_some() {
                return Err(SignatureError::DuplicateField(name.clone()));
            }
            schema = schema.with_field(FieldSpec::input(name.as_str()));
        }
        for name in &outputs {
            if schema.field(name).is_some() {
                return Err(SignatureError::DuplicateField(name.clone()));
            }
            schema = schema.with_field(FieldSpec::output(name.as_str()));
        }

        let instructions = format!(
            "Given the fields {}, produce the fields {}.",
            quote_names(inputs.iter().map(String::as_str)),
            quote_names(outputs.iter().map(String::as_str)),
        );
        Ok(schema.with_instructions(instructions))
    }
}
