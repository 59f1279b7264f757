//! CLI argument definitions for the WikiChat binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WikiChat - chat with a Wikipedia page through a routed LLM index.
#[derive(Parser, Debug)]
#[command(name = "wikichat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the secrets file holding `openai_key`.
    #[arg(short = 's', long = "secrets", global = true)]
    pub secrets: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build the index and serve the chat page (default).
    Serve {
        /// HTTP server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
    /// Build the index, answer one question, print the transcript, and exit.
    Ask {
        /// The question to ask.
        question: String,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Serve { port: None })
    }

    /// Priority: --config flag > WIKICHAT_CONFIG env var > ~/.wikichat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("WIKICHAT_CONFIG") {
            return PathBuf::from(p);
        }
        home_dir_file("config.toml")
    }

    /// Priority: --secrets flag > WIKICHAT_SECRETS env var > ~/.wikichat/secrets.toml.
    pub fn resolve_secrets_path(&self) -> PathBuf {
        if let Some(ref p) = self.secrets {
            return p.clone();
        }
        if let Ok(p) = std::env::var("WIKICHAT_SECRETS") {
            return PathBuf::from(p);
        }
        home_dir_file("secrets.toml")
    }

    /// Priority: --port flag > WIKICHAT_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(Command::Serve { port: Some(p) }) = self.command {
            return p;
        }
        if let Ok(val) = std::env::var("WIKICHAT_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// `~/.wikichat/<name>`, or `<name>` in the working directory without a home.
fn home_dir_file(name: &str) -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".wikichat").join(name);
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".wikichat").join(name);
    }
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let args = CliArgs::parse_from(["wikichat"]);
        assert_eq!(args.command(), Command::Serve { port: None });
        assert_eq!(args.resolve_log_level("info"), "info");
    }

    #[test]
    fn test_serve_port_overrides_config() {
        let args = CliArgs::parse_from(["wikichat", "serve", "--port", "9000"]);
        assert_eq!(args.resolve_port(8501), 9000);
    }

    #[test]
    fn test_ask_takes_question() {
        let args = CliArgs::parse_from(["wikichat", "ask", "When did Snowflake IPO?"]);
        assert_eq!(
            args.command(),
            Command::Ask {
                question: "When did Snowflake IPO?".to_string()
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from([
            "wikichat",
            "ask",
            "hi",
            "--config",
            "/tmp/wikichat.toml",
            "--log-level",
            "debug",
            "--secrets",
            "/tmp/secrets.toml",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/wikichat.toml"));
        assert_eq!(args.resolve_secrets_path(), PathBuf::from("/tmp/secrets.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
    }
}
