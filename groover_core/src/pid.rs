//! Discrete PID stabilizer over pitch error.

use crate::config::BalanceCfg;
use crate::state::ControlState;

/// PID controller producing a signed drive magnitude with a dead-band and
/// hard saturation.
///
/// The integral uses the accumulation from *previous* ticks; the current
/// error is added after the output is formed, and it accumulates
/// unconditionally, inside the dead-band and at saturation too.
/// `integral_limit` is an opt-in clamp for deployments that cannot tolerate
/// windup.
#[derive(Debug, Clone)]
pub struct PidStabilizer {
    kp: f32,
    ki: f32,
    kd: f32,
    dead_band_deg: f32,
    output_limit: f32,
    integral_limit: Option<f32>,
}

impl PidStabilizer {
    pub fn new(cfg: &BalanceCfg) -> Self {
        Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            dead_band_deg: cfg.dead_band_deg,
            output_limit: cfg.output_limit,
            integral_limit: cfg.integral_limit,
        }
    }

    /// One control step. Writes `integral_deg` and `last_error_deg` on
    /// `state`; reads `target_deg`.
    pub fn compute(&self, state: &mut ControlState, pitch_deg: f32, rate_dps: f32) -> f32 {
        let error = pitch_deg - state.target_deg;
        let raw = self.kp * error + self.kd * rate_dps + self.ki * state.integral_deg;

        state.integral_deg += error;
        if let Some(limit) = self.integral_limit {
            state.integral_deg = state.integral_deg.clamp(-limit, limit);
        }
        state.last_error_deg = error;

        if error.abs() < self.dead_band_deg {
            return 0.0;
        }
        raw.clamp(-self.output_limit, self.output_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PidStabilizer {
        PidStabilizer::new(&BalanceCfg::default())
    }

    #[test]
    fn dead_band_zeroes_output_but_integral_advances() {
        let mut state = ControlState::new(0.0);
        let out = pid().compute(&mut state, 1.5, 0.0);
        assert_eq!(out, 0.0);
        assert!((state.integral_deg - 1.5).abs() < 1e-6);
        assert!((state.last_error_deg - 1.5).abs() < 1e-6);
    }

    #[test]
    fn saturates_at_exactly_the_limit() {
        let mut state = ControlState::new(0.0);
        let out = pid().compute(&mut state, 40.0, 0.0);
        assert_eq!(out, 100.0);
        let out = pid().compute(&mut state, -40.0, 0.0);
        assert_eq!(out, -100.0);
    }

    #[test]
    fn integral_term_uses_previous_accumulation() {
        let mut state = ControlState::new(0.0);
        let cfg = BalanceCfg {
            kp: 0.0,
            ki: 1.0,
            kd: 0.0,
            dead_band_deg: 0.0,
            ..BalanceCfg::default()
        };
        let pid = PidStabilizer::new(&cfg);
        // First tick: accumulator still zero when the output is formed.
        assert_eq!(pid.compute(&mut state, 5.0, 0.0), 0.0);
        // Second tick sees the 5.0 accumulated by the first.
        assert_eq!(pid.compute(&mut state, 5.0, 0.0), 5.0);
    }

    #[test]
    fn optional_integral_clamp_bounds_windup() {
        let cfg = BalanceCfg {
            integral_limit: Some(10.0),
            ..BalanceCfg::default()
        };
        let pid = PidStabilizer::new(&cfg);
        let mut state = ControlState::new(0.0);
        for _ in 0..100 {
            pid.compute(&mut state, 5.0, 0.0);
        }
        assert!((state.integral_deg - 10.0).abs() < 1e-6);
    }
}
