//! Runtime configuration for the control core.
//!
//! These are the validated, in-memory structs consumed by the conductor and
//! its components. They are separate from the TOML-deserialized schema in
//! `groover_config`; see `conversions` for the mapping. Defaults are the
//! values the robot was tuned with.

use crate::beat::Routine;

/// Microphone sampling parameters.
#[derive(Debug, Clone)]
pub struct SamplingCfg {
    /// Sampling tick rate in Hz.
    pub rate_hz: u32,
    /// Samples per block ("epoch"); one energy value is computed per block.
    pub block_samples: usize,
    /// ADC reading of the microphone for silence; subtracted before squaring.
    pub mic_offset: u16,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            rate_hz: 8_000,
            block_samples: 160,
            mic_offset: 1_523,
        }
    }
}

/// Beat detection parameters.
#[derive(Debug, Clone)]
pub struct BeatCfg {
    /// A block whose energy ratio exceeds this fires a beat (once gated).
    pub threshold: f32,
    /// Minimum time between beat-path decisions. Derived from the assumed
    /// tempo (92 bpm is roughly 652 ms between beats).
    pub gate_ms: u64,
    /// Number of instantaneous-energy epochs in the moving sum.
    pub window_epochs: usize,
    /// Phrase schedule: `(until_ms, routine)` bands over cumulative elapsed
    /// time, ascending; elapsed times past the last band use `fallback`.
    pub phrase_bands: Vec<(u64, Routine)>,
    /// Routine selected once every phrase band has passed.
    pub fallback: Routine,
}

impl Default for BeatCfg {
    fn default() -> Self {
        Self {
            threshold: 2.4,
            gate_ms: 650,
            window_epochs: 50,
            phrase_bands: vec![(20_868, Routine::One), (62_592, Routine::Two)],
            fallback: Routine::Three,
        }
    }
}

/// Balance loop parameters: complementary filter, PID gains, actuation biases.
#[derive(Debug, Clone)]
pub struct BalanceCfg {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Pitch setpoint in degrees; slightly negative to counter the chassis
    /// center of mass.
    pub target_deg: f32,
    /// No corrective output while |error| is below this many degrees.
    pub dead_band_deg: f32,
    /// Output saturation bound (duty percent before biases).
    pub output_limit: f32,
    /// Optional clamp on the cumulative error term. `None` leaves the
    /// accumulator unbounded.
    pub integral_limit: Option<f32>,
    /// Complementary filter weight on the gyro-integrated term.
    pub filter_alpha: f32,
    /// Minimum period between stabilizer ticks, in microseconds.
    pub loop_period_us: u64,
    /// Static duty offsets compensating motor asymmetry (right ran slower).
    pub bias_right: f32,
    pub bias_left: f32,
    /// Setpoint adjustment per '5'/'6' command, degrees.
    pub target_step_deg: f32,
    /// Differential trim adjustment per '7'/'8' command.
    pub trim_step: f32,
}

impl Default for BalanceCfg {
    fn default() -> Self {
        Self {
            kp: 6.65,
            ki: 0.25,
            kd: 0.3,
            target_deg: -0.3,
            dead_band_deg: 2.0,
            output_limit: 100.0,
            integral_limit: None,
            filter_alpha: 0.9,
            loop_period_us: 20_000,
            bias_right: 7.0,
            bias_left: 5.0,
            target_step_deg: 0.2,
            trim_step: 0.2,
        }
    }
}

/// Open-loop locomotion parameters.
#[derive(Debug, Clone)]
pub struct DriveCfg {
    /// Duty percent for straight moves and the outer wheel in turns.
    pub duty_pct: f32,
    /// Inner-wheel duty scale while turning.
    pub turn_inner_scale: f32,
    /// How long the inner wheel stays slowed during a turn.
    pub turn_hold_ms: u64,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self {
            duty_pct: 60.0,
            turn_inner_scale: 0.5,
            turn_hold_ms: 1_700,
        }
    }
}

/// Per-run session parameters for the cooperative loop.
#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// Stop after this many milliseconds; 0 runs until shutdown.
    pub max_run_ms: u64,
    /// Sleep between idle polls of the command link / elapsed-time gates.
    pub poll_us: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            max_run_ms: 0,
            poll_us: 500,
        }
    }
}
