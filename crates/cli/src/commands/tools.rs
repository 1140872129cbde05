//! `hoploop tools` — List the tools the tool loop can act through.

use hoploop_config::AppConfig;
use hoploop_core::tool::FINISH;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = hoploop_tools::default_registry(&config.react)?;

    println!("Registered tools");
    println!("================");
    for tool in registry.iter() {
        println!(
            "  {}[{}]  {}",
            tool.name(),
            tool.input_variable(),
            tool.description()
        );
    }
    println!("  {FINISH}[answer]  ends the loop with the answer");

    match &config.react.corpus_path {
        Some(path) => println!("\n  Search corpus: {}", path.display()),
        None => println!("\n  Search corpus: none (set react.corpus_path)"),
    }

    Ok(())
}
