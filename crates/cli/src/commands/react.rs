//! `hoploop react` — Answer a task with the tool loop.

use hoploop_agent::{ChatPredictor, ReactAgent};

pub async fn run(
    signature: &str,
    inputs: Vec<(String, String)>,
    max_iters: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let (signature, inputs) = super::task(signature, inputs)?;

    let tools = hoploop_tools::default_registry(&config.react)?;
    let provider = hoploop_providers::build_from_config(&config);
    let predictor = ChatPredictor::from_config(provider, &config);

    let agent = ReactAgent::new(signature, tools)?
        .with_max_iters(max_iters.unwrap_or(config.react.max_iters));
    let result = agent.forward(&predictor, &inputs).await?;
    if !result.finished {
        eprintln!("No Finish after {} hops; answer is empty", result.hops);
    }

    println!("{}", serde_json::to_string_pretty(&result.into_output())?);
    Ok(())
}
