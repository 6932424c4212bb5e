//! Mappings from the TOML schema in `groover_config` to the runtime config
//! structs consumed by the conductor.

use crate::beat::Routine;
use crate::config::{BalanceCfg, BeatCfg, DriveCfg, SamplingCfg, SessionCfg};

impl From<&groover_config::SamplingCfg> for SamplingCfg {
    fn from(c: &groover_config::SamplingCfg) -> Self {
        Self {
            rate_hz: c.rate_hz,
            block_samples: c.block_samples,
            mic_offset: c.mic_offset,
        }
    }
}

impl From<&groover_config::BeatCfg> for BeatCfg {
    fn from(c: &groover_config::BeatCfg) -> Self {
        Self {
            threshold: c.threshold,
            gate_ms: c.gate_ms,
            window_epochs: c.window_epochs,
            phrase_bands: c
                .phrase_bands
                .iter()
                .map(|b| {
                    (
                        b.until_ms,
                        Routine::from_index(b.routine).unwrap_or(Routine::Three),
                    )
                })
                .collect(),
            fallback: Routine::from_index(c.fallback_routine).unwrap_or(Routine::Three),
        }
    }
}

impl From<&groover_config::BalanceCfg> for BalanceCfg {
    fn from(c: &groover_config::BalanceCfg) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
            target_deg: c.target_deg,
            dead_band_deg: c.dead_band_deg,
            output_limit: c.output_limit,
            integral_limit: c.integral_limit,
            filter_alpha: c.filter_alpha,
            loop_period_us: c.loop_period_us,
            bias_right: c.bias_right,
            bias_left: c.bias_left,
            target_step_deg: c.target_step_deg,
            trim_step: c.trim_step,
        }
    }
}

impl From<&groover_config::DriveCfg> for DriveCfg {
    fn from(c: &groover_config::DriveCfg) -> Self {
        Self {
            duty_pct: c.duty_pct,
            turn_inner_scale: c.turn_inner_scale,
            turn_hold_ms: c.turn_hold_ms,
        }
    }
}

impl From<&groover_config::SessionCfg> for SessionCfg {
    fn from(c: &groover_config::SessionCfg) -> Self {
        Self {
            max_run_ms: c.max_run_ms,
            poll_us: c.poll_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_round_into_runtime_defaults() {
        let toml_cfg = groover_config::Config::default();
        let beat: BeatCfg = (&toml_cfg.beat).into();
        assert_eq!(beat.threshold, BeatCfg::default().threshold);
        assert_eq!(beat.phrase_bands, BeatCfg::default().phrase_bands);

        let balance: BalanceCfg = (&toml_cfg.balance).into();
        assert_eq!(balance.kp, BalanceCfg::default().kp);
        assert_eq!(balance.loop_period_us, BalanceCfg::default().loop_period_us);
    }
}
