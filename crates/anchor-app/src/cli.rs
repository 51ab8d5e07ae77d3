//! CLI argument definitions for the Anchor binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use anchor_core::{AnchorConfig, AnchorError};
use clap::{Parser, Subcommand};

/// Anchor: grounded answers about one subject, with sources.
#[derive(Parser, Debug)]
#[command(name = "anchor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Base URL of the retrieval service.
    #[arg(long = "retrieval-url", global = true)]
    pub retrieval_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP chat API.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
    /// Ask a single question and print the answer with its sources.
    Ask {
        /// The question; multiple words are joined with spaces.
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Interactive conversation on the terminal.
    Chat,
}

/// Configuration after file, env and flag resolution.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: AnchorConfig,
    /// Why the file was ignored in favour of defaults. Logged once tracing
    /// is up.
    pub load_error: Option<AnchorError>,
}

impl CliArgs {
    /// Load the config file and apply env and flag overrides.
    ///
    /// An unreadable or malformed file falls back to defaults; the overrides
    /// still apply on top.
    pub fn load_config(&self) -> LoadedConfig {
        let path = self.resolve_config_path();
        let (mut config, load_error) = match AnchorConfig::load_if_present(&path) {
            Ok(config) => (config, None),
            Err(e) => (AnchorConfig::default(), Some(e)),
        };
        self.apply_overrides(&mut config);
        LoadedConfig {
            path,
            config,
            load_error,
        }
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ANCHOR_CONFIG env var > ~/.anchor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ANCHOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply environment and flag overrides on top of the loaded file.
    pub fn apply_overrides(&self, config: &mut AnchorConfig) {
        self.apply_overrides_from(config, |key| std::env::var(key).ok());
    }

    fn apply_overrides_from(
        &self,
        config: &mut AnchorConfig,
        env: impl Fn(&str) -> Option<String>,
    ) {
        if let Some(url) = env("ANCHOR_RETRIEVAL_URL") {
            config.retrieval.base_url = url;
        }
        if let Some(model) = env("ANTHROPIC_MODEL") {
            config.generation.model = model;
        }
        if let Some(key) = env("ANTHROPIC_API_KEY") {
            config.generation.api_key = Some(key);
        }
        if let Some(port) = env("ANCHOR_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.general.port = port;
        }

        if let Some(ref url) = self.retrieval_url {
            config.retrieval.base_url = url.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Command::Serve { port: Some(port) } = self.command {
            config.general.port = port;
        }
    }

    /// The question for `ask`, if that is the command.
    pub fn question(&self) -> Option<String> {
        match &self.command {
            Command::Ask { question } => Some(question.join(" ")),
            _ => None,
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".anchor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".anchor").join("config.toml");
    }
    PathBuf::from("config.toml")
}
