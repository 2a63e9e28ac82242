use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::generator::backend::GEMINI_DEFAULT_MODEL;
use crate::replay::replayer::ReplayConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-pilot",
    version,
    about = "Extract web forms, generate answers with an LLM, and fill them back in"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Gemini API key (default: GOOGLE_API_KEY)
    #[arg(long, global = true)]
    pub gemini_api_key: Option<String>,

    /// Path to config file (default: form-pilot.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append JSONL trace events to this file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the form snapshot of a page as JSON
    Extract {
        /// Local HTML file
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        html: Option<String>,

        /// Page URL to fetch
        #[arg(long)]
        url: Option<String>,
    },

    /// Extract a page and print generated answers as JSON
    Answer {
        /// Local HTML file
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        html: Option<String>,

        /// Page URL to fetch
        #[arg(long)]
        url: Option<String>,

        /// Answer generator: mock, ollama or gemini
        #[arg(long)]
        generator: Option<String>,
    },

    /// Replay an answers file against a local HTML file
    Fill {
        /// Local HTML file
        #[arg(long)]
        html: String,

        /// JSON file holding the answer array
        #[arg(long)]
        answers: String,

        /// Sleep for real between steps
        #[arg(long, default_value_t = false)]
        live: bool,
    },

    /// Detect, extract, answer and fill in one go
    Autofill {
        /// Local HTML file
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        html: Option<String>,

        /// Page URL to fetch
        #[arg(long)]
        url: Option<String>,

        /// Answer generator: mock, ollama or gemini
        #[arg(long)]
        generator: Option<String>,

        /// Sleep for real between steps
        #[arg(long, default_value_t = false)]
        live: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "form-pilot.yaml";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Optional YAML config file: `form-pilot.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub kind: GeneratorKind,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Mock,
    Ollama,
    Gemini,
}

impl GeneratorKind {
    /// Unknown names fall back to the mock generator.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ollama" | "llm" => GeneratorKind::Ollama,
            "gemini" | "google" => GeneratorKind::Gemini,
            _ => GeneratorKind::Mock,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Generator settings after CLI > config > environment > defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGenerator {
    pub kind: GeneratorKind,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Merge generator settings. Endpoint and model flags belong to Ollama, so
/// they only override the config for that backend.
pub fn resolve_generator(
    cli: &Cli,
    cli_kind: Option<&str>,
    config: &AppConfig,
    env_api_key: Option<String>,
) -> ResolvedGenerator {
    let kind = cli_kind
        .map(GeneratorKind::parse)
        .unwrap_or(config.generator.kind);

    let (cli_endpoint, cli_model) = match kind {
        GeneratorKind::Ollama => (cli.ollama_endpoint.clone(), cli.ollama_model.clone()),
        _ => (None, None),
    };

    let model = cli_model
        .or_else(|| config.generator.model.clone())
        .or_else(|| (kind == GeneratorKind::Gemini).then(|| GEMINI_DEFAULT_MODEL.to_string()));

    ResolvedGenerator {
        kind,
        endpoint: cli_endpoint.or_else(|| config.generator.endpoint.clone()),
        model,
        api_key: cli
            .gemini_api_key
            .clone()
            .or_else(|| config.generator.api_key.clone())
            .or(env_api_key)
            .filter(|key| !key.is_empty()),
    }
}

/// Trace file from the CLI, else the config file.
pub fn resolve_trace_path(cli: &Cli, config: &AppConfig) -> Option<String> {
    cli.trace.clone().or_else(|| config.trace.path.clone())
}
