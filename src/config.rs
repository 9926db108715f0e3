//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// Longest allowed tick; timers must be recomputed at least once per second
pub const MAX_TICK_MS: u64 = 1000;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "cooking-timers")]
#[command(about = "Guided-cooking timer server with drift-free countdowns")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Recipe JSON file to cook from
    #[arg(short, long)]
    pub recipe: PathBuf,

    /// Precomputed timer orchestration JSON to use instead of local planning
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Open a cooking session for this many servings at startup
    #[arg(short, long)]
    pub servings: Option<u32>,

    /// Orchestration clock tick in milliseconds (1-1000)
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Tick interval clamped to at most one second
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(1, MAX_TICK_MS))
    }
}
