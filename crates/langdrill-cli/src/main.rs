//! langdrill CLI: serve drills and inspect the adaptive policy.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use langdrill_core::model::ExerciseKind;
use langdrill_core::params::Strictness;

mod commands;

#[derive(Parser)]
#[command(
    name = "langdrill",
    version,
    about = "Adaptive-difficulty language rehabilitation drills"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Database URL, or memory:// for a throwaway store
        #[arg(long)]
        database_url: Option<String>,

        /// Serve offline content even if an API key is configured
        #[arg(long)]
        offline: bool,
    },

    /// Show generation parameters for every level
    Params {
        /// Limit to one exercise (speech, prepositions, sentence_tf)
        #[arg(long)]
        exercise: Option<ExerciseKind>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a sequence of answers through the skill tracker
    Simulate {
        /// Exercise to simulate
        #[arg(long)]
        exercise: ExerciseKind,

        /// Answers as a string of 1 (correct) and 0 (incorrect), e.g. "1110111"
        #[arg(long)]
        answers: String,

        /// Latency recorded for every answer
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Starting level
        #[arg(long, default_value = "1")]
        level: u8,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate one batch of content and print it as JSON
    Preview {
        /// Exercise to generate
        #[arg(long)]
        exercise: ExerciseKind,

        /// Difficulty level
        #[arg(long, default_value = "1")]
        level: u8,

        /// Use the offline generator with this seed
        #[arg(long)]
        seed: Option<u64>,

        /// Use the offline generator
        #[arg(long)]
        offline: bool,

        /// Optional topic hint
        #[arg(long)]
        topic: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a transcript against a target phrase
    Score {
        /// What the speaker said
        #[arg(long)]
        transcript: String,

        /// The phrase they were asked to say
        #[arg(long)]
        target: String,

        /// lenient, normal, or strict
        #[arg(long, default_value = "normal")]
        strictness: Strictness,
    },

    /// Create a starter langdrill.toml
    Init,
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            config,
            bind,
            database_url,
            offline,
        } => commands::serve::execute(config, bind, database_url, offline).await,
        Commands::Params { exercise, config } => {
            init_tracing("warn");
            commands::params::execute(exercise, config)
        }
        Commands::Simulate {
            exercise,
            answers,
            latency_ms,
            level,
            config,
        } => {
            init_tracing("warn");
            commands::simulate::execute(exercise, &answers, latency_ms, level, config)
        }
        Commands::Preview {
            exercise,
            level,
            seed,
            offline,
            topic,
            config,
        } => {
            init_tracing("warn");
            commands::preview::execute(exercise, level, seed, offline, topic, config).await
        }
        Commands::Score {
            transcript,
            target,
            strictness,
        } => commands::score::execute(&transcript, &target, strictness),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
