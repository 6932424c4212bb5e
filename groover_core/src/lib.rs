#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Control core for a beat-driven self-balancing robot (hardware-agnostic).
//!
//! All peripheral interaction goes through the `groover_traits` seams
//! (`Microphone`, `Imu`, `Drive`, `CommandLink`, `StatusPanel`).
//!
//! ## Architecture
//!
//! - **Sampling**: interrupt-shaped ring fill + background producer thread
//!   (`ring`, `sampler` modules)
//! - **Beat path**: short-time energy, moving-window ratio, gated decision,
//!   phrase-scheduled routines (`beat` module)
//! - **Balance path**: complementary filter → PID → per-motor actuation
//!   (`pitch`, `pid`, `actuation` modules)
//! - **Commands**: fixed 10-byte frames, per-mode mapping tables (`command`)
//! - **Scheduling**: one cooperative loop per mode, balance over commands,
//!   brake-on-exit guard (`scheduler` module)
//!
//! Timing uses the `Clock` abstraction throughout, so every loop runs
//! identically on wall time and on virtual test time.

// Module declarations
pub mod actuation;
pub mod beat;
pub mod builder;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod locomotion;
pub mod mocks;
pub mod pid;
pub mod pitch;
pub mod ring;
pub mod sampler;
pub mod scheduler;
pub mod state;
pub mod util;

pub use beat::{BeatDecision, BeatDetector, EnergyWindow, Routine, block_energy};
pub use builder::{ConductorBuilder, assemble};
pub use command::{CommandAction, CommandDispatcher, CommandMap, FRAME_LEN, frame_for};
pub use config::{BalanceCfg, BeatCfg, DriveCfg, SamplingCfg, SessionCfg};
pub use error::{BuildError, CoreError};
pub use locomotion::Move;
pub use pid::PidStabilizer;
pub use pitch::PitchEstimator;
pub use ring::SampleRing;
pub use sampler::MicSampler;
pub use scheduler::{Conductor, RunSummary, StopCause};
pub use state::{BeatState, ControlState};
