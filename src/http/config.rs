//! Command line and file configuration for the binaries.
//!
//! The server reads an optional TOML file as its base layer; flags and
//! `POWGATE_*` environment variables override individual settings.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{ProofEngine, ProofEngineBuilder};
use crate::error::Error;
use crate::http::logging::LogFormat;
use crate::verify::VerifierConfig;
use crate::HashAlgorithm;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "powgate-server",
    about = "Serve quotes to clients that present a proof of work"
)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "POWGATE_BIND")]
    pub bind: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "POWGATE_PORT")]
    pub port: Option<u16>,

    /// Required leading zero bits of the proof digest.
    #[arg(long, env = "POWGATE_DIFFICULTY")]
    pub difficulty: Option<u32>,

    /// Digest algorithm: sha1, sha2_256, sha2_512, ripemd320 or blake3.
    #[arg(long, env = "POWGATE_ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Replay window in milliseconds. Values under 1000 are raised to 1000.
    #[arg(long, env = "POWGATE_TTL_MS")]
    pub ttl_ms: Option<u64>,

    /// Longest a single request may take before it is answered with 408.
    #[arg(long, env = "POWGATE_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Quote file, one quote per line.
    #[arg(long, env = "POWGATE_QUOTES")]
    pub quotes: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POWGATE_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, env = "POWGATE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "POWGATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Effective server settings after merging file, env and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub difficulty: u32,
    pub algorithm: HashAlgorithm,
    pub ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub quotes: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_owned(),
            port: 8080,
            difficulty: 20,
            algorithm: HashAlgorithm::Sha1,
            ttl_ms: 1_000,
            request_timeout_ms: 150,
            quotes: PathBuf::from("quotes.txt"),
            log_level: "info".to_owned(),
            log_format: LogFormat::Human,
        }
    }
}

impl ServerSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File layer (if `--config` was given) overridden by flags and env.
    pub fn resolve(args: &ServerArgs) -> Result<Self, ConfigError> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(args))
    }

    pub fn with_overrides(mut self, args: &ServerArgs) -> Self {
        if let Some(bind) = &args.bind {
            self.bind = bind.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(difficulty) = args.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(ttl_ms) = args.ttl_ms {
            self.ttl_ms = ttl_ms;
        }
        if let Some(timeout) = args.request_timeout_ms {
            self.request_timeout_ms = timeout;
        }
        if let Some(quotes) = &args.quotes {
            self.quotes = quotes.clone();
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = args.log_format {
            self.log_format = format;
        }
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            bits: self.difficulty,
            algorithm: self.algorithm,
            ..VerifierConfig::default()
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "powgate-client",
    about = "Solve a proof of work and exchange it for a quote"
)]
pub struct ClientArgs {
    /// Base URL of the quote server.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "POWGATE_SERVER")]
    pub server: String,

    /// Leading zero bits the server requires.
    #[arg(long, default_value_t = 20, env = "POWGATE_DIFFICULTY")]
    pub difficulty: u32,

    #[arg(long, default_value_t = HashAlgorithm::Sha1, env = "POWGATE_ALGORITHM")]
    pub algorithm: HashAlgorithm,

    /// Search workers, each with its own random prefix.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Give up a search after this many attempts.
    #[arg(long, env = "POWGATE_MAX_ATTEMPTS")]
    pub max_attempts: Option<u64>,

    /// Fresh searches to start after a search runs out of attempts.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Number of quotes to fetch.
    #[arg(long, default_value_t = 1)]
    pub count: u32,

    #[arg(long, default_value = "info", env = "POWGATE_LOG_LEVEL")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

impl ClientArgs {
    pub fn engine(&self) -> Result<ProofEngine, Error> {
        ProofEngineBuilder::default()
            .bits(self.difficulty)
            .algorithm(self.algorithm)
            .threads(self.threads)
            .max_attempts(self.max_attempts)
            .build_validated()
    }
}
