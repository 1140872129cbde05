//! Subcommand implementations.

pub mod config_cmd;
pub mod pot;
pub mod react;
pub mod tools;

use hoploop_config::AppConfig;
use hoploop_core::signature::Schema;
use hoploop_core::values::Values;
use tracing::warn;

/// Parse a `name=value` input argument. Only the first `=` separates.
pub fn parse_input(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in `{arg}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Load the config, failing early when a hosted provider has no API key.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && config.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENROUTER_API_KEY='sk-or-v1-...'   (recommended)");
        eprintln!("    export OPENAI_API_KEY='sk-...'             (for OpenAI direct)");
        eprintln!("    export HOPLOOP_API_KEY='sk-...'            (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// Parse the signature and collect the inputs it names.
pub fn task(
    signature: &str,
    inputs: Vec<(String, String)>,
) -> Result<(Schema, Values), Box<dyn std::error::Error>> {
    let signature: Schema = signature.parse()?;
    let values: Values = inputs.into_iter().collect();

    for name in signature.input_names() {
        if !values.contains(name) {
            warn!(field = name, "No value given for input field");
        }
    }

    Ok((signature, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_splits_on_first_equals() {
        assert_eq!(
            parse_input("expr=a == b"),
            Ok(("expr".to_string(), "a == b".to_string()))
        );
        assert_eq!(parse_input("empty="), Ok(("empty".to_string(), String::new())));
    }

    #[test]
    fn input_needs_name_and_equals() {
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=value").is_err());
    }

    #[test]
    fn task_parses_signature_and_inputs() {
        let (signature, values) = task(
            "question -> answer",
            vec![("question".into(), "Why?".into())],
        )
        .unwrap();
        assert_eq!(signature.output_names(), vec!["answer"]);
        assert_eq!(values.get_text("question"), Some("Why?"));
    }

    #[test]
    fn task_rejects_malformed_signature() {
        assert!(task("no arrow here", vec![]).is_err());
    }
}
