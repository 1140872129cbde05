//! `hoploop config` — Configuration management commands.

use hoploop_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() && config.provider != "ollama" {
                warnings.push(
                    "No API key set (set HOPLOOP_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY)"
                        .to_string(),
                );
            }

            if let Some(path) = &config.react.corpus_path {
                if !path.exists() {
                    warnings.push(format!("Search corpus {} does not exist", path.display()));
                }
            }

            if config.program_of_thought.import_whitelist.is_empty() {
                warnings.push("Import whitelist is empty; generated code cannot import".into());
            }

            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.provider);
            println!("   Model:     {}", config.model);
            println!("   ReAct:     {} hops", config.react.max_iters);
            println!(
                "   PoT:       {} attempts, python `{}`",
                config.program_of_thought.max_iters, config.program_of_thought.python_command
            );
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(AppConfig::config_dir())?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}
