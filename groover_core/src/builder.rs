//! Builder and generic assembly for [`Conductor`].
//!
//! `ConductorBuilder` is the boxed, dynamic-dispatch path the CLI uses;
//! `assemble` is the statically dispatched constructor tests and embedded
//! callers prefer. Both funnel through the same validation.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use groover_traits::clock::{Clock, MonotonicClock};
use groover_traits::{CommandLink, Drive, StatusPanel};

use crate::config::{BalanceCfg, BeatCfg, DriveCfg, SamplingCfg, SessionCfg};
use crate::error::{BuildError, Result};
use crate::mocks::NullPanel;
use crate::scheduler::Conductor;
use crate::state::ControlState;

/// Builder collecting boxed peripherals and configuration.
#[derive(Default)]
pub struct ConductorBuilder {
    drive: Option<Box<dyn Drive>>,
    link: Option<Box<dyn CommandLink>>,
    panel: Option<Box<dyn StatusPanel>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    sampling: Option<SamplingCfg>,
    beat: Option<BeatCfg>,
    balance: Option<BalanceCfg>,
    drive_cfg: Option<DriveCfg>,
    session: Option<SessionCfg>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl ConductorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drive(mut self, drive: impl Drive + 'static) -> Self {
        self.drive = Some(Box::new(drive));
        self
    }

    pub fn with_link(mut self, link: impl CommandLink + 'static) -> Self {
        self.link = Some(Box::new(link));
        self
    }

    pub fn with_panel(mut self, panel: impl StatusPanel + 'static) -> Self {
        self.panel = Some(Box::new(panel));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn with_sampling(mut self, cfg: SamplingCfg) -> Self {
        self.sampling = Some(cfg);
        self
    }

    pub fn with_beat(mut self, cfg: BeatCfg) -> Self {
        self.beat = Some(cfg);
        self
    }

    pub fn with_balance(mut self, cfg: BalanceCfg) -> Self {
        self.balance = Some(cfg);
        self
    }

    pub fn with_drive_cfg(mut self, cfg: DriveCfg) -> Self {
        self.drive_cfg = Some(cfg);
        self
    }

    pub fn with_session(mut self, cfg: SessionCfg) -> Self {
        self.session = Some(cfg);
        self
    }

    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Validate and construct. Drive and command link are mandatory; the
    /// panel defaults to a null sink, the clock to real time.
    pub fn build(
        self,
    ) -> Result<Conductor<Box<dyn Drive>, Box<dyn CommandLink>, Box<dyn StatusPanel>>> {
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrive))?;
        let link = self
            .link
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLink))?;
        let panel = self
            .panel
            .unwrap_or_else(|| Box::new(NullPanel) as Box<dyn StatusPanel>);
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        assemble(
            drive,
            link,
            panel,
            clock,
            self.sampling.unwrap_or_default(),
            self.beat.unwrap_or_default(),
            self.balance.unwrap_or_default(),
            self.drive_cfg.unwrap_or_default(),
            self.session.unwrap_or_default(),
            self.shutdown
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        )
    }
}

/// Validate configuration and construct a `Conductor` (static dispatch).
#[allow(clippy::too_many_arguments)]
pub fn assemble<D: Drive, L: CommandLink, P: StatusPanel>(
    drive: D,
    link: L,
    panel: P,
    clock: Arc<dyn Clock + Send + Sync>,
    sampling: SamplingCfg,
    beat: BeatCfg,
    balance: BalanceCfg,
    drive_cfg: DriveCfg,
    session: SessionCfg,
    shutdown: Arc<AtomicBool>,
) -> Result<Conductor<D, L, P>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if sampling.rate_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampling rate_hz must be > 0",
        )));
    }
    if sampling.block_samples == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "block_samples must be > 0",
        )));
    }
    if !beat.threshold.is_finite() || beat.threshold <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "beat threshold must be finite and > 0",
        )));
    }
    if beat.gate_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gate_ms must be >= 1",
        )));
    }
    if beat.window_epochs == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "window_epochs must be >= 1",
        )));
    }
    if !beat.phrase_bands.windows(2).all(|w| w[0].0 < w[1].0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "phrase bands must be strictly ascending",
        )));
    }
    for gain in [balance.kp, balance.ki, balance.kd] {
        if !gain.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "PID gains must be finite",
            )));
        }
    }
    if !(0.0..=1.0).contains(&balance.filter_alpha) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "filter_alpha must be within 0..=1",
        )));
    }
    if balance.dead_band_deg.is_sign_negative() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "dead_band_deg must be >= 0",
        )));
    }
    if !(balance.output_limit > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "output_limit must be > 0",
        )));
    }
    if balance.loop_period_us == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "loop_period_us must be >= 1",
        )));
    }
    if balance.bias_right.is_sign_negative() || balance.bias_left.is_sign_negative() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duty biases must be >= 0",
        )));
    }
    if !(0.0..=100.0).contains(&drive_cfg.duty_pct) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duty_pct must be within 0..=100",
        )));
    }
    if !(0.0..=1.0).contains(&drive_cfg.turn_inner_scale) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "turn_inner_scale must be within 0..=1",
        )));
    }
    if session.poll_us == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll_us must be >= 1",
        )));
    }

    let state = ControlState::new(balance.target_deg);
    Ok(Conductor {
        drive,
        link,
        panel,
        clock,
        sampling,
        beat,
        balance,
        drive_cfg,
        session,
        state,
        shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{NoopLink, NullPanel};
    use groover_traits::{Direction, Side};

    struct NoopDrive;
    impl Drive for NoopDrive {
        fn set_direction(
            &mut self,
            _side: Side,
            _dir: Direction,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
        fn set_duty(
            &mut self,
            _side: Side,
            _pct: f32,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
        fn brake(
            &mut self,
            _side: Side,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    #[test]
    fn build_requires_drive_and_link() {
        let err = ConductorBuilder::new().build().expect_err("missing drive");
        assert!(err.downcast_ref::<BuildError>().is_some());

        let err = ConductorBuilder::new()
            .with_drive(NoopDrive)
            .build()
            .expect_err("missing link");
        let be = err.downcast_ref::<BuildError>().expect("typed error");
        assert!(matches!(be, BuildError::MissingLink));
    }

    #[test]
    fn rejects_out_of_range_config() {
        let bad = BalanceCfg {
            filter_alpha: 1.5,
            ..BalanceCfg::default()
        };
        let err = ConductorBuilder::new()
            .with_drive(NoopDrive)
            .with_link(NoopLink)
            .with_panel(NullPanel)
            .with_balance(bad)
            .build()
            .expect_err("alpha out of range");
        let be = err.downcast_ref::<BuildError>().expect("typed error");
        assert!(matches!(be, BuildError::InvalidConfig(_)));
    }

    #[test]
    fn defaults_build_cleanly() {
        let conductor = ConductorBuilder::new()
            .with_drive(NoopDrive)
            .with_link(NoopLink)
            .build()
            .expect("default config is valid");
        assert_eq!(conductor.state().target_deg, -0.3);
        assert_eq!(conductor.state().trim_right, 1.0);
    }
}
