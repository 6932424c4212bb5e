//! Argument schema for the `groover` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Control core for a beat-driven self-balancing robot")]
pub struct Args {
    /// Path to a TOML config; built-in defaults are used when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Stop after this many milliseconds (overrides session.max_run_ms;
    /// 0 runs until ctrl-c).
    #[arg(long, global = true)]
    pub duration_ms: Option<u64>,

    /// Pre-queue command digits on the simulated link, e.g. --commands 5,7,3.
    #[arg(long, global = true, value_delimiter = ',')]
    pub commands: Vec<char>,

    /// Print the run summary as JSON on exit.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level: error|warn|info|debug|trace (RUST_LOG wins if set).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Append JSON-lines logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Request SCHED_FIFO scheduling and memory locking (Linux only).
    #[arg(long, global = true)]
    pub rt: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Remote-controlled locomotion; no sensing.
    Drive,
    /// Beat detection monitor: energy ratios and beat events on the console.
    Beat {
        /// Simulated beat spacing in milliseconds.
        #[arg(long, default_value_t = 660)]
        tempo_ms: u64,
    },
    /// Beat-driven dance routines, with drive commands still live.
    Dance {
        /// Simulated beat spacing in milliseconds.
        #[arg(long, default_value_t = 660)]
        tempo_ms: u64,
    },
    /// Self-balancing with remote steering commands.
    Balance {
        /// Initial tilt of the simulated pendulum, degrees.
        #[arg(long, default_value_t = 8.0)]
        tilt_deg: f32,
    },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Drive => "drive",
            Mode::Beat { .. } => "beat",
            Mode::Dance { .. } => "dance",
            Mode::Balance { .. } => "balance",
        }
    }
}
