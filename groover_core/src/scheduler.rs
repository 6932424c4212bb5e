//! The cooperative control loop (`Conductor`).
//!
//! One single-threaded loop coordinates three real-time concerns: the beat
//! path (full sample blocks → energy detector → routine dispatch), the
//! balance path (pitch estimator → PID → actuation, on a minimum-period
//! gate), and asynchronous command frames. Priorities are explicit: in
//! balance mode the stabilizer is never pre-empted by command handling, and
//! commands are only polled between stabilizer ticks, so command latency is
//! bounded by the stabilizer period.
//!
//! Every run method that actuates holds a `NeutralGuard` for the lifetime
//! of the loop; whatever the exit path (shutdown flag, session expiry, or a
//! hardware error propagating out), the wheels are forced to the braking
//! state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use groover_traits::clock::Clock;
use groover_traits::{CommandLink, Drive, Imu, Side, StatusPanel};

use crate::actuation::{DriveMapper, apply_plan, brake_all};
use crate::beat::{BeatDecision, BeatDetector};
use crate::command::{CommandAction, CommandDispatcher, CommandMap, FRAME_LEN};
use crate::config::{BalanceCfg, BeatCfg, DriveCfg, SamplingCfg, SessionCfg};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::locomotion::{Move, perform};
use crate::pid::PidStabilizer;
use crate::pitch::PitchEstimator;
use crate::sampler::MicSampler;
use crate::state::ControlState;
use crate::util::us_to_secs;

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The shared shutdown flag was raised (ctrl-c, supervisor, ...).
    Shutdown,
    /// The configured `max_run_ms` elapsed.
    Expired,
}

/// Counters describing one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cause: StopCause,
    pub blocks: u64,
    pub beats: u64,
    pub commands: u64,
    pub stabilizer_ticks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    blocks: u64,
    beats: u64,
    commands: u64,
    stabilizer_ticks: u64,
}

impl Counters {
    fn finish(self, cause: StopCause) -> RunSummary {
        RunSummary {
            cause,
            blocks: self.blocks,
            beats: self.beats,
            commands: self.commands,
            stabilizer_ticks: self.stabilizer_ticks,
        }
    }
}

/// Forces both wheels to a safe stop when dropped: duty zero, then the
/// short-brake. Errors are logged, not propagated, since this runs on
/// unwind paths too.
struct NeutralGuard<'a, D: Drive> {
    drive: &'a mut D,
}

impl<'a, D: Drive> NeutralGuard<'a, D> {
    fn new(drive: &'a mut D) -> Self {
        Self { drive }
    }

    fn drive(&mut self) -> &mut D {
        self.drive
    }
}

impl<D: Drive> Drop for NeutralGuard<'_, D> {
    fn drop(&mut self) {
        for side in [Side::Right, Side::Left] {
            if let Err(e) = self.drive.set_duty(side, 0.0) {
                tracing::warn!(?side, error = %e, "failed to zero duty on exit");
            }
            if let Err(e) = self.drive.brake(side) {
                tracing::warn!(?side, error = %e, "failed to brake on exit");
            }
        }
        tracing::info!("actuators forced to neutral");
    }
}

/// The assembled control core. Construct through [`crate::ConductorBuilder`]
/// or [`crate::builder::assemble`].
pub struct Conductor<D: Drive, L: CommandLink, P: StatusPanel> {
    pub(crate) drive: D,
    pub(crate) link: L,
    pub(crate) panel: P,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) sampling: SamplingCfg,
    pub(crate) beat: BeatCfg,
    pub(crate) balance: BalanceCfg,
    pub(crate) drive_cfg: DriveCfg,
    pub(crate) session: SessionCfg,
    pub(crate) state: ControlState,
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl<D: Drive, L: CommandLink, P: StatusPanel> core::fmt::Debug for Conductor<D, L, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Conductor")
            .field("target_deg", &self.state.target_deg)
            .field("trim_right", &self.state.trim_right)
            .field("trim_left", &self.state.trim_left)
            .finish()
    }
}

impl<D: Drive, L: CommandLink, P: StatusPanel> Conductor<D, L, P> {
    /// Shared control state (setpoint, trims, integral).
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// The drive peripheral, for inspection after a run.
    pub fn drive_ref(&self) -> &D {
        &self.drive
    }

    /// Sampling parameters this conductor was assembled with, for spawning a
    /// matching [`MicSampler`].
    pub fn sampling_cfg(&self) -> &SamplingCfg {
        &self.sampling
    }

    /// Raise the shutdown flag; any running loop returns at its next poll.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Remote-controlled locomotion: poll for command frames and execute
    /// moves. No sensing.
    pub fn run_drive(&mut self) -> Result<RunSummary> {
        let Self {
            drive,
            link,
            panel,
            clock,
            drive_cfg,
            session,
            state,
            shutdown,
            ..
        } = self;
        let dispatcher = CommandDispatcher::new(CommandMap::drive(), 0.0);
        let poll = Duration::from_micros(session.poll_us.max(1));
        let start = clock.now();
        let mut counters = Counters::default();
        let mut guard = NeutralGuard::new(drive);

        panel.show("drive: ready");
        tracing::info!("drive loop start");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(counters.finish(StopCause::Shutdown));
            }
            if run_expired(session, clock.as_ref(), start) {
                return Ok(counters.finish(StopCause::Expired));
            }
            if let Some(frame) = read_frame(link)? {
                if let Some(CommandAction::Locomote(mv)) = dispatcher.dispatch(&frame, state) {
                    counters.commands += 1;
                    perform(guard.drive(), mv, drive_cfg, clock.as_ref())?;
                }
            } else {
                clock.sleep(poll);
            }
        }
    }

    /// Beat monitoring only: service full sample blocks and report the
    /// energy ratio and beat events on the status panel. No locomotion.
    pub fn run_beat(&mut self, sampler: &MicSampler) -> Result<RunSummary> {
        let Self {
            panel,
            clock,
            sampling,
            beat,
            session,
            shutdown,
            ..
        } = self;
        let mut detector = BeatDetector::new(beat.clone(), sampling.mic_offset, 0);
        let poll = Duration::from_micros(session.poll_us.max(1));
        let epoch = clock.now();
        let mut counters = Counters::default();

        panel.show("beat: listening");
        tracing::info!("beat loop start");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(counters.finish(StopCause::Shutdown));
            }
            if run_expired(session, clock.as_ref(), epoch) {
                return Ok(counters.finish(StopCause::Expired));
            }
            if let Some(block) = sampler.try_block() {
                counters.blocks += 1;
                let now_ms = clock.ms_since(epoch);
                match detector.process_block(&block, now_ms) {
                    BeatDecision::Beat { ratio, .. } => {
                        counters.beats += 1;
                        panel.show(&format!("beat  c = {ratio:.2}"));
                    }
                    BeatDecision::NoBeat { ratio } | BeatDecision::Pending { ratio } => {
                        panel.show(&format!("c = {ratio:.2}"));
                    }
                    BeatDecision::Indeterminate => {}
                }
            } else {
                clock.sleep(poll);
            }
        }
    }

    /// Dancing with stabilisers: the beat path selects and steps routines,
    /// and drive commands remain live between blocks.
    pub fn run_dance(&mut self, sampler: &MicSampler) -> Result<RunSummary> {
        let Self {
            drive,
            link,
            panel,
            clock,
            sampling,
            beat,
            drive_cfg,
            session,
            state,
            shutdown,
            ..
        } = self;
        let dispatcher = CommandDispatcher::new(CommandMap::drive(), 0.0);
        let mut detector = BeatDetector::new(beat.clone(), sampling.mic_offset, 0);
        let poll = Duration::from_micros(session.poll_us.max(1));
        let epoch = clock.now();
        let mut counters = Counters::default();
        let mut guard = NeutralGuard::new(drive);

        panel.show("dance: waiting for beat");
        tracing::info!("dance loop start");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(counters.finish(StopCause::Shutdown));
            }
            if run_expired(session, clock.as_ref(), epoch) {
                return Ok(counters.finish(StopCause::Expired));
            }

            // At most one beat-path evaluation and one command dispatch per
            // iteration; the full-block handoff is consumed exactly once.
            let mut serviced = false;
            if let Some(block) = sampler.try_block() {
                serviced = true;
                counters.blocks += 1;
                let now_ms = clock.ms_since(epoch);
                match detector.process_block(&block, now_ms) {
                    BeatDecision::Beat { ratio, routine, mv } => {
                        counters.beats += 1;
                        panel.show(&format!("{routine}  c = {ratio:.2}"));
                        perform(guard.drive(), mv, drive_cfg, clock.as_ref())?;
                    }
                    BeatDecision::NoBeat { ratio } => {
                        tracing::trace!(ratio, "search interval expired without beat");
                        panel.show("waiting for beat...");
                        perform(guard.drive(), Move::Stop, drive_cfg, clock.as_ref())?;
                    }
                    BeatDecision::Pending { .. } | BeatDecision::Indeterminate => {}
                }
            }
            if let Some(frame) = read_frame(link)? {
                serviced = true;
                if let Some(CommandAction::Locomote(mv)) = dispatcher.dispatch(&frame, state) {
                    counters.commands += 1;
                    perform(guard.drive(), mv, drive_cfg, clock.as_ref())?;
                }
            }
            if !serviced {
                clock.sleep(poll);
            }
        }
    }

    /// Self-balancing with remote steering. The stabilizer runs whenever at
    /// least `loop_period_us` has elapsed since its last tick; a pending
    /// command frame is only read between ticks.
    pub fn run_balance<I: Imu>(&mut self, imu: &mut I) -> Result<RunSummary> {
        let Self {
            drive,
            link,
            panel,
            clock,
            balance,
            session,
            state,
            shutdown,
            ..
        } = self;
        let dispatcher = CommandDispatcher::new(CommandMap::balance(balance), balance.target_deg);
        let mut estimator = PitchEstimator::new(balance.filter_alpha);
        let pid = PidStabilizer::new(balance);
        let mapper = DriveMapper::new(balance.bias_right, balance.bias_left);
        let poll = Duration::from_micros(session.poll_us.max(1));
        let start = clock.now();
        let mut last_tick = clock.now();
        let mut counters = Counters::default();
        let mut guard = NeutralGuard::new(drive);

        panel.show("balance: running");
        tracing::info!(target_deg = state.target_deg, "balance loop start");
        loop {
            // Balance outranks commands: stabilize until a complete frame is
            // pending, checking the link only between ticks.
            while link.available() < FRAME_LEN {
                if shutdown.load(Ordering::Relaxed) {
                    return Ok(counters.finish(StopCause::Shutdown));
                }
                if run_expired(session, clock.as_ref(), start) {
                    return Ok(counters.finish(StopCause::Expired));
                }
                let dt_us = clock.us_since(last_tick);
                if dt_us >= balance.loop_period_us {
                    let raw_pitch = imu
                        .pitch()
                        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                        .wrap_err("reading imu pitch")?;
                    let rate = imu
                        .angular_rate()
                        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                        .wrap_err("reading imu rate")?;
                    last_tick = clock.now();
                    let pitch = estimator.update(raw_pitch, rate, us_to_secs(dt_us));
                    let output = pid.compute(state, pitch, rate);
                    let plan = mapper.plan(output, state.trim_right, state.trim_left);
                    apply_plan(guard.drive(), &plan)?;
                    counters.stabilizer_ticks += 1;
                    tracing::trace!(pitch, rate, output, "stabilizer tick");
                } else {
                    clock.sleep(poll);
                }
            }

            if let Some(frame) = read_frame(link)? {
                if let Some(action) = dispatcher.dispatch(&frame, state) {
                    counters.commands += 1;
                    if action == CommandAction::Brake {
                        brake_all(guard.drive())?;
                    }
                    panel.show(&format!(
                        "target {:+.1}  trim {:.1}/{:.1}",
                        state.target_deg, state.trim_right, state.trim_left
                    ));
                }
            }
        }
    }
}

fn run_expired(session: &SessionCfg, clock: &(dyn Clock + Send + Sync), start: Instant) -> bool {
    session.max_run_ms > 0 && clock.ms_since(start) >= session.max_run_ms
}

/// Read one complete frame if available. Frames are "the next 10 bytes":
/// there is no resynchronization after a short or misaligned read.
fn read_frame<L: CommandLink>(link: &mut L) -> Result<Option<[u8; FRAME_LEN]>> {
    if link.available() < FRAME_LEN {
        return Ok(None);
    }
    let mut frame = [0u8; FRAME_LEN];
    let n = link
        .read(&mut frame)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("reading command link")?;
    if n < FRAME_LEN {
        tracing::warn!(n, "short frame read; bytes discarded");
        return Ok(None);
    }
    Ok(Some(frame))
}
