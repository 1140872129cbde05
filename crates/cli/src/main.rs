//! hoploop CLI — the main entry point.
//!
//! Commands:
//! - `react`   — Answer a task with the Thought/Action/Observation tool loop
//! - `pot`     — Answer a task by generating and running Python code
//! - `tools`   — List the tools the tool loop can act through
//! - `config`  — Show, locate, validate or create the config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hoploop",
    about = "hoploop — hop-bounded agentic loops over a language model",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ReAct tool loop
    React {
        /// Task signature, e.g. "question -> answer"
        #[arg(short, long)]
        signature: String,

        /// Input value as name=value (repeatable)
        #[arg(short, long = "input", value_parser = commands::parse_input)]
        inputs: Vec<(String, String)>,

        /// Override the hop ceiling
        #[arg(long)]
        max_iters: Option<usize>,
    },

    /// Run the Program of Thought code loop
    Pot {
        /// Task signature, e.g. "question -> answer"
        #[arg(short, long)]
        signature: String,

        /// Input value as name=value (repeatable)
        #[arg(short, long = "input", value_parser = commands::parse_input)]
        inputs: Vec<(String, String)>,

        /// Override the attempt ceiling
        #[arg(long)]
        max_iters: Option<usize>,
    },

    /// List the registered tools
    Tools,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Check the config file for problems
    Validate,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::React {
            signature,
            inputs,
            max_iters,
        } => commands::react::run(&signature, inputs, max_iters).await?,
        Commands::Pot {
            signature,
            inputs,
            max_iters,
        } => commands::pot::run(&signature, inputs, max_iters).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
