// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use lingocap::app_config::{self, Config, LlmProvider};
use lingocap::app_controller::Controller;
use lingocap::playback::render::format_timestamp;

/// CLI Wrapper for LlmProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliProvider> for LlmProvider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Ollama => LlmProvider::Ollama,
            CliProvider::OpenAI => LlmProvider::OpenAI,
            CliProvider::Anthropic => LlmProvider::Anthropic,
            CliProvider::LMStudio => LlmProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild caption files into sentences
    Segment {
        /// Caption JSON file or directory of caption files
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Only print the sentence playing at this time (milliseconds)
        #[arg(long, value_name = "MS")]
        at: Option<u64>,

        /// Print the sentences as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore missing punctuation with a language model
    Punctuate {
        /// Caption JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Language model provider to use
        #[arg(short, long, value_enum)]
        provider: Option<CliProvider>,

        /// Model name to use
        #[arg(short, long)]
        model: Option<String>,

        /// Output file (defaults to <INPUT>.punctuated.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the caption track of a video
    Fetch {
        /// Video id
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Caption language (defaults to the configured language)
        #[arg(long)]
        lang: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Follow a caption file in real time with sentence navigation
    Replay {
        /// Caption JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Start position in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 0)]
        from: u64,

        /// Print overlay markup instead of plain text
        #[arg(long)]
        overlay: bool,
    },

    /// Generate shell completions for lingocap
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// lingocap - sentence-level captions for language learners
///
/// Rebuilds auto-generated video captions into words and sentences, restores
/// missing punctuation with a language model, and replays one sentence at a time.
#[derive(Parser, Debug)]
#[command(name = "lingocap")]
#[command(version)]
#[command(about = "Sentence-level captions for language learners")]
#[command(long_about = "lingocap rebuilds auto-generated captions into sentences, restores punctuation with AI providers and replays captions sentence by sentence.

EXAMPLES:
    lingocap fetch dQw4w9WgXcQ --lang ja            # Download Japanese captions
    lingocap segment captions/dQw4w9WgXcQ.ja.json   # Print every sentence
    lingocap segment captions/ --at 61000           # Sentence at 1:01 in every file
    lingocap punctuate -p openai talk.en.json       # Restore punctuation with OpenAI
    lingocap replay talk.en.json --from 30000       # Navigate with a/s/d from 0:30
    lingocap completions bash > lingocap.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and symbol for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "✖"),
            Level::Warn => ("\x1B[1;33m", "▲"),
            Level::Info => ("\x1B[1;32m", "•"),
            Level::Debug => ("\x1B[1;36m", "›"),
            Level::Trace => ("\x1B[1;35m", "·"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, symbol) = Self::style_for_level(record.level());
        let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, symbol, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is narrowed with `log::set_max_level` once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "lingocap", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    run(cli.command, config).await
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Segment { input, at, json } => {
            let controller = Controller::with_config(config)?;
            let files = controller.segment_path(&input, at)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&files).context("Failed to serialize sentences")?);
                return Ok(());
            }

            let show_headers = files.len() > 1;
            for file in &files {
                if show_headers {
                    println!("== {} ==", file.path.display());
                }
                for sentence in &file.sentences {
                    println!("[{} - {}] {}",
                        format_timestamp(sentence.start_time_ms),
                        format_timestamp(sentence.end_time_ms),
                        sentence.display_text());
                }
            }
            if at.is_some() && files.iter().all(|f| f.sentences.is_empty()) {
                warn!("No sentence found at the requested time");
            }
        }
        Commands::Punctuate { input, provider, model, output } => {
            config.punctuation.enabled = true;
            if let Some(provider) = provider {
                config.punctuation.provider = provider.into();
            }
            if let Some(model) = model {
                let provider = config.punctuation.provider;
                config.punctuation.provider_config_mut(provider).model = model;
            }

            let controller = Controller::with_config(config)?;
            let (path, summary) = controller.punctuate_file(&input, output).await?;
            println!("{} sentences punctuated, {} failed: {}", summary.applied, summary.failed, path.display());
        }
        Commands::Fetch { video_id, lang, output } => {
            let controller = Controller::with_config(config)?;
            let path = controller.fetch_captions(&video_id, lang.as_deref(), output).await?;
            println!("{}", path.display());
        }
        Commands::Replay { input, from, overlay } => {
            let controller = Controller::with_config(config)?;
            controller.replay(&input, from, overlay).await?;
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}

// Load conf.json (creating it with defaults when missing) and apply CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = &cli.config;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.into());
    info!("Using configuration from {}", config_path);

    Ok(config)
}
