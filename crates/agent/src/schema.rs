//! Schema builder — the per-hop prompt schema for both loops.
//!
//! Every function here is pure: the same task signature, hop index and tool
//! catalog always produce a field-for-field identical [`Schema`]. The loops
//! call these once per hop and never cache the result.

use hoploop_core::error::{Error, Result};
use hoploop_core::signature::{FieldRole, FieldSpec, Schema, quote_names};
use hoploop_core::tool::{FINISH, ToolRegistry};
use hoploop_core::values::passages_to_text;

/// The fields one tool-loop hop reads and writes, addressed by hop number.
///
/// Hop numbers are 1-based, so hop index `i` of the loop owns
/// `HopSlots::new(i + 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopSlots {
    pub hop: usize,
    pub thought: String,
    pub action: String,
    pub observation: String,
}

impl HopSlots {
    pub fn new(hop: usize) -> Self {
        Self {
            hop,
            thought: format!("Thought_{hop}"),
            action: format!("Action_{hop}"),
            observation: format!("Observation_{hop}"),
        }
    }

    /// Slots for hops `1..=hop`, in order.
    pub fn up_to(hop: usize) -> Vec<Self> {
        (1..=hop).map(Self::new).collect()
    }
}

/// The loop's single answer field, or a configuration error naming the loop.
pub fn single_output<'a>(signature: &'a Schema, loop_name: &str) -> Result<&'a FieldSpec> {
    let mut outputs = signature.output_fields();
    match (outputs.next(), outputs.next()) {
        (Some(field), None) => Ok(field),
        _ => Err(Error::configuration(format!(
            "{loop_name} ondersteunt slechts één uitvoerveld."
        ))),
    }
}

// ── Tool loop ─────────────────────────────────────────────────────────────

/// Every registered tool as `Name[input]`, joined with ` or `. The reserved
/// `Finish` is not included.
fn tool_list(tools: &ToolRegistry) -> String {
    tools
        .iter()
        .filter(|tool| tool.name() != FINISH)
        .map(|tool| format!("{}[{}]", tool.name(), tool.input_variable()))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Instructions shared by every hop: the task, the Thought/Action/Observation
/// protocol and the numbered action catalog ending in `Finish`.
pub fn react_instructions(signature: &Schema, tools: &ToolRegistry) -> String {
    let inputs = quote_names(signature.input_names());
    let outputs = quote_names(signature.output_names());

    let mut lines = Vec::new();
    if !signature.instructions().is_empty() {
        lines.push(format!("{}\n", signature.instructions()));
    }
    lines.push(format!("Je krijgt {inputs} en je reageert met {outputs}.\n"));
    lines.push("Om dit te doen, wissel je Gedachte-, Actie- en Observatiestappen af.\n".into());
    lines.push(
        "Gedachte kan redeneren over de huidige situatie, en Actie kan van de volgende types zijn:\n"
            .into(),
    );

    let mut idx = 0;
    for tool in tools.iter() {
        idx += 1;
        lines.push(format!(
            "({idx}) {}[{}], which {}",
            tool.name(),
            tool.input_variable(),
            tool.description()
        ));
    }
    lines.push(format!(
        "({}) {FINISH}[{}], which geeft het uiteindelijke {outputs} terug en beëindigt de taak",
        idx + 1,
        signature.output_names().join(", "),
    ));

    lines.join("\n")
}

/// Schema for hop number `hop` (1-based) of the tool loop.
///
/// The task's input fields come first, then the Thought, Action and
/// Observation of every completed hop as inputs, then the current hop's
/// Thought and Action as outputs.
pub fn react_schema(signature: &Schema, tools: &ToolRegistry, hop: usize) -> Schema {
    let actions = tool_list(tools);
    let mut schema = Schema::new(react_instructions(signature, tools));

    for field in signature.input_fields() {
        schema = schema.with_field(field.clone());
    }

    for slots in HopSlots::up_to(hop) {
        let j = slots.hop;
        let role = if j == hop {
            FieldRole::Output
        } else {
            FieldRole::Input
        };

        schema = schema
            .with_field(
                FieldSpec::input(slots.thought)
                    .as_role(role)
                    .with_prefix(format!("Thought {j}:"))
                    .with_description("volgende stappen op basis van de laatste observatie"),
            )
            .with_field(
                FieldSpec::input(slots.action)
                    .as_role(role)
                    .with_prefix(format!("Action {j}:"))
                    .with_description(format!(
                        "altijd ofwel {actions} of, wanneer klaar, {FINISH}[<answer>], \
                         waarbij <answer> het antwoord op de vraag zelf is."
                    )),
            );

        if j < hop {
            schema = schema.with_field(
                FieldSpec::input(slots.observation)
                    .with_prefix(format!("Observatie {j}:"))
                    .with_description("observaties gebaseerd op actie")
                    .with_formatter(passages_to_text),
            );
        }
    }

    schema
}

// ── Code loop ─────────────────────────────────────────────────────────────

pub const GENERATED_CODE: &str = "generated_code";
pub const PREVIOUS_CODE: &str = "previous_code";
pub const ERROR: &str = "error";
pub const FINAL_GENERATED_CODE: &str = "final_generated_code";
pub const CODE_OUTPUT: &str = "code_output";

/// The three fixed shapes of the code loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMode {
    /// Task inputs → code.
    Generate,
    /// Task inputs, failing code and its error → corrected code.
    Regenerate,
    /// Task inputs, final code and its output → the task's answer field.
    Answer,
}

fn generated_code_field() -> FieldSpec {
    FieldSpec::output(GENERATED_CODE)
        .with_prefix("Code:")
        .with_description("python code die de vraag beantwoordt")
}

/// Schema for one code-loop mode. Fails unless the task declares exactly
/// one output field.
pub fn pot_schema(signature: &Schema, mode: CodeMode) -> Result<Schema> {
    let answer_field = single_output(signature, "PoT")?;

    let mut schema = Schema::default();
    for field in signature.input_fields() {
        schema = schema.with_field(field.clone());
    }

    schema = match mode {
        CodeMode::Generate => schema.with_field(generated_code_field()),
        CodeMode::Regenerate => schema
            .with_field(
                FieldSpec::input(PREVIOUS_CODE)
                    .with_prefix("Previous Code:")
                    .with_description("eerder gegenereerde python code die een fout gaf"),
            )
            .with_field(
                FieldSpec::input(ERROR)
                    .with_prefix("Error:")
                    .with_description("foutmelding van eerder gegenereerde python code"),
            )
            .with_field(generated_code_field()),
        CodeMode::Answer => schema
            .with_field(
                FieldSpec::input(FINAL_GENERATED_CODE)
                    .with_prefix("Code:")
                    .with_description("python code die de vraag beantwoordt"),
            )
            .with_field(
                FieldSpec::input(CODE_OUTPUT)
                    .with_prefix("Code Output:")
                    .with_description("uitvoer van eerder gegenereerde python code"),
            )
            .with_field(answer_field.clone()),
    };

    let inputs = quote_names(schema.input_names());
    let outputs = quote_names([answer_field.name.as_str()]);
    let instructions = match mode {
        CodeMode::Generate => [
            format!("Je krijgt {inputs} en je reageert met {outputs}."),
            format!(
                "Genereer uitvoerbare Python-code die het correcte {outputs} programmatiche berekent."
            ),
            format!(
                "Zorg ervoor dat de laatste regel in je code de juiste waarde voor {outputs} \
                 evalueert nadat je klaar bent met de berekening."
            ),
        ]
        .join("\n"),
        CodeMode::Regenerate => [
            format!("Je krijgt {inputs} vanwege een fout in de vorige code."),
            format!("Je taak is om de fout te corrigeren en de nieuwe `{GENERATED_CODE}` te geven."),
        ]
        .join("\n"),
        CodeMode::Answer => {
            format!("Gegeven de definitieve code {inputs}, geef het definitieve {outputs}.")
        }
    };

    Ok(schema.with_instructions(instructions))
}
