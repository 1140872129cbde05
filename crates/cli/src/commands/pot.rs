//! `hoploop pot` — Answer a task by generating and running Python code.

use std::sync::Arc;

use hoploop_agent::{ChatPredictor, ProgramOfThought};

pub async fn run(
    signature: &str,
    inputs: Vec<(String, String)>,
    max_iters: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let (signature, inputs) = super::task(signature, inputs)?;
    let settings = &config.program_of_thought;

    let sandbox = Arc::new(hoploop_tools::sandbox_from_config(settings));
    let provider = hoploop_providers::build_from_config(&config);
    let predictor = ChatPredictor::from_config(provider, &config);

    let max_iters = max_iters.unwrap_or(settings.max_iters);
    let pot = ProgramOfThought::new(signature, sandbox)?
        .with_max_iters(max_iters)
        .with_import_whitelist(settings.import_whitelist.clone());

    match pot.forward(&predictor, &inputs).await? {
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        None => Err(format!("No result: generated code still failed after {max_iters} attempts").into()),
    }
}
