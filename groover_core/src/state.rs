//! Shared mutable control state.
//!
//! One explicit struct per concern, passed by reference into component calls
//! rather than living as ambient globals. Single writer per field: the
//! command dispatcher writes `target_deg` and the trims, the stabilizer
//! writes `integral_deg`/`last_error_deg`, and the beat detector owns
//! `BeatState`.

use crate::beat::Routine;

/// State shared between the command path and the balance path.
#[derive(Debug, Clone)]
pub struct ControlState {
    /// Pitch setpoint in degrees.
    pub target_deg: f32,
    /// Per-side multiplicative trim scalars ('A' right, 'B' left).
    pub trim_right: f32,
    pub trim_left: f32,
    /// Cumulative pitch error, accumulated every stabilizer tick.
    pub integral_deg: f32,
    /// Error from the most recent stabilizer tick.
    pub last_error_deg: f32,
}

impl ControlState {
    pub fn new(target_deg: f32) -> Self {
        Self {
            target_deg,
            trim_right: 1.0,
            trim_left: 1.0,
            integral_deg: 0.0,
            last_error_deg: 0.0,
        }
    }

    pub fn reset_trims(&mut self) {
        self.trim_right = 1.0;
        self.trim_left = 1.0;
    }
}

/// State owned by the beat detector's decision step.
#[derive(Debug, Clone)]
pub struct BeatState {
    /// Timestamp of the last fired beat decision (run-relative ms). The gate
    /// measures from here; initialized to the run start.
    pub last_beat_ms: u64,
    /// Run start (run-relative ms); phrase bands measure from here.
    pub start_ms: u64,
    /// Routine selected by the most recent beat.
    pub routine: Routine,
    /// Index into the current routine's move cycle.
    pub phase: usize,
}

impl BeatState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            last_beat_ms: now_ms,
            start_ms: now_ms,
            routine: Routine::Idle,
            phase: 0,
        }
    }
}
