//! Config mapping, peripheral assembly, and mode execution.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use groover_core::config::{BalanceCfg, BeatCfg, DriveCfg, SamplingCfg, SessionCfg};
use groover_core::{ConductorBuilder, MicSampler, RunSummary};
use groover_hardware::{ConsolePanel, SimulatedImu, SimulatedMic};
use groover_traits::clock::MonotonicClock;

use crate::cli::{Args, Mode};

pub fn run(
    args: &Args,
    cfg: &groover_config::Config,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let sampling: SamplingCfg = (&cfg.sampling).into();
    let beat: BeatCfg = (&cfg.beat).into();
    let balance: BalanceCfg = (&cfg.balance).into();
    let drive_cfg: DriveCfg = (&cfg.drive).into();
    let mut session: SessionCfg = (&cfg.session).into();
    if let Some(ms) = args.duration_ms {
        session.max_run_ms = ms;
    }

    // Choose hardware or simulation. The microphone and IMU stay simulated
    // either way: their register drivers live outside this stack, behind the
    // traits.
    #[cfg(feature = "hardware")]
    let drive: Box<dyn groover_traits::Drive> = {
        use groover_hardware::gpio::{BridgePins, GpioDrive};
        Box::new(GpioDrive::new(
            BridgePins {
                dir_a: cfg.pins.right_dir_a,
                dir_b: cfg.pins.right_dir_b,
            },
            BridgePins {
                dir_a: cfg.pins.left_dir_a,
                dir_b: cfg.pins.left_dir_b,
            },
        )?)
    };
    #[cfg(not(feature = "hardware"))]
    let drive: Box<dyn groover_traits::Drive> = Box::new(groover_hardware::SimulatedDrive::new());

    #[cfg(feature = "hardware")]
    let link: Box<dyn groover_traits::CommandLink> = Box::new(groover_hardware::gpio::UartLink::new(
        &cfg.serial.device,
        cfg.serial.baud,
    )?);
    #[cfg(not(feature = "hardware"))]
    let link: Box<dyn groover_traits::CommandLink> = {
        let mut scripted = groover_hardware::ScriptedLink::new();
        for &c in &args.commands {
            scripted.push_frame(c as u8);
        }
        Box::new(scripted)
    };

    let mut conductor = ConductorBuilder::new()
        .with_drive(drive)
        .with_link(link)
        .with_panel(ConsolePanel::new())
        .with_clock(MonotonicClock::new())
        .with_sampling(sampling.clone())
        .with_beat(beat)
        .with_balance(balance.clone())
        .with_drive_cfg(drive_cfg)
        .with_session(session)
        .with_shutdown(shutdown)
        .build()?;

    match &args.mode {
        Mode::Drive => conductor.run_drive(),
        Mode::Beat { tempo_ms } => {
            let mic =
                SimulatedMic::new(sampling.mic_offset, sampling.rate_hz).with_tempo(*tempo_ms);
            let sampler = MicSampler::spawn(mic, &sampling, MonotonicClock::new());
            conductor.run_beat(&sampler)
        }
        Mode::Dance { tempo_ms } => {
            let mic =
                SimulatedMic::new(sampling.mic_offset, sampling.rate_hz).with_tempo(*tempo_ms);
            let sampler = MicSampler::spawn(mic, &sampling, MonotonicClock::new());
            conductor.run_dance(&sampler)
        }
        Mode::Balance { tilt_deg } => {
            let dt_s = balance.loop_period_us as f32 / 1_000_000.0;
            let mut imu =
                SimulatedImu::new(*tilt_deg, 1.2, 0.8, dt_s).with_rest(balance.target_deg);
            conductor.run_balance(&mut imu)
        }
    }
}
