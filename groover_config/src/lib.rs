#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the robot control stack.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. Every
//! field defaults to the constants the robot was tuned with, so an absent or
//! empty file yields a working configuration. Config is startup input only;
//! nothing is ever written back.
use serde::Deserialize;
use serde::de::Deserializer;

/// Microphone sampling parameters.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplingCfg {
    /// Sampling tick rate in Hz.
    pub rate_hz: u32,
    /// Samples per energy epoch.
    pub block_samples: usize,
    /// ADC reading of the microphone for silence.
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

/// One phrase-schedule band: `routine` is active while cumulative elapsed
/// time is below `until_ms`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PhraseBand {
    pub until_ms: u64,
    pub routine: u8,
}

/// Beat detection parameters.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BeatCfg {
    pub threshold: f32,
    pub gate_ms: u64,
    pub window_epochs: usize,
    /// Accepts either an array of tables
    /// `[{ until_ms = 20868, routine = 1 }, ...]` or an array of tuples
    /// `[[20868, 1], [62592, 2]]`.
    #[serde(deserialize_with = "de_phrase_bands")]
    pub phrase_bands: Vec<PhraseBand>,
    /// Routine index used once every band has passed.
    pub fallback_routine: u8,
}

impl Default for BeatCfg {
    fn default() -> Self {
        Self {
            threshold: 2.4,
            gate_ms: 650,
            window_epochs: 50,
            phrase_bands: vec![
                PhraseBand {
                    until_ms: 20_868,
                    routine: 1,
                },
                PhraseBand {
                    until_ms: 62_592,
                    routine: 2,
                },
            ],
            fallback_routine: 3,
        }
    }
}

/// Balance loop parameters.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BalanceCfg {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub target_deg: f32,
    pub dead_band_deg: f32,
    pub output_limit: f32,
    /// Optional clamp on the cumulative error term; absent leaves the
    /// accumulator unbounded.
    pub integral_limit: Option<f32>,
    pub filter_alpha: f32,
    pub loop_period_us: u64,
    pub bias_right: f32,
    pub bias_left: f32,
    pub target_step_deg: f32,
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
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriveCfg {
    pub duty_pct: f32,
    pub turn_inner_scale: f32,
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

/// Session pacing for the cooperative loop.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionCfg {
    /// Stop after this many milliseconds; 0 runs until shutdown.
    pub max_run_ms: u64,
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

/// UART command link settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SerialCfg {
    pub device: String,
    pub baud: u32,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".to_string(),
            baud: 9_600,
        }
    }
}

/// GPIO pin assignments (BCM numbering) for the H-bridge driver.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    pub right_dir_a: u8,
    pub right_dir_b: u8,
    pub left_dir_a: u8,
    pub left_dir_b: u8,
    pub right_pwm: u8,
    pub left_pwm: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            right_dir_a: 17,
            right_dir_b: 27,
            left_dir_a: 23,
            left_dir_b: 24,
            right_pwm: 12,
            left_pwm: 13,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingCfg,
    pub beat: BeatCfg,
    pub balance: BalanceCfg,
    pub drive: DriveCfg,
    pub session: SessionCfg,
    pub serial: SerialCfg,
    pub pins: Pins,
    pub logging: Logging,
}

impl Config {
    /// Range and consistency checks beyond what serde enforces.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.sampling.rate_hz == 0 {
            eyre::bail!("sampling.rate_hz must be > 0");
        }
        if self.sampling.block_samples == 0 {
            eyre::bail!("sampling.block_samples must be > 0");
        }
        if !self.beat.threshold.is_finite() || self.beat.threshold <= 0.0 {
            eyre::bail!("beat.threshold must be finite and > 0");
        }
        if self.beat.gate_ms == 0 {
            eyre::bail!("beat.gate_ms must be >= 1");
        }
        if self.beat.window_epochs == 0 {
            eyre::bail!("beat.window_epochs must be >= 1");
        }
        for w in self.beat.phrase_bands.windows(2) {
            if w[0].until_ms >= w[1].until_ms {
                eyre::bail!(
                    "beat.phrase_bands must be strictly ascending ({} then {})",
                    w[0].until_ms,
                    w[1].until_ms
                );
            }
        }
        for band in &self.beat.phrase_bands {
            if band.routine > 3 {
                eyre::bail!("beat.phrase_bands routine index {} out of 0..=3", band.routine);
            }
        }
        if self.beat.fallback_routine > 3 {
            eyre::bail!("beat.fallback_routine index out of 0..=3");
        }
        for (name, gain) in [
            ("kp", self.balance.kp),
            ("ki", self.balance.ki),
            ("kd", self.balance.kd),
        ] {
            if !gain.is_finite() {
                eyre::bail!("balance.{name} must be finite");
            }
        }
        if !(0.0..=1.0).contains(&self.balance.filter_alpha) {
            eyre::bail!("balance.filter_alpha must be within 0..=1");
        }
        if self.balance.dead_band_deg < 0.0 {
            eyre::bail!("balance.dead_band_deg must be >= 0");
        }
        if self.balance.output_limit <= 0.0 {
            eyre::bail!("balance.output_limit must be > 0");
        }
        if self.balance.loop_period_us == 0 {
            eyre::bail!("balance.loop_period_us must be >= 1");
        }
        if let Some(limit) = self.balance.integral_limit
            && limit <= 0.0
        {
            eyre::bail!("balance.integral_limit must be > 0 when set");
        }
        if !(0.0..=100.0).contains(&self.drive.duty_pct) {
            eyre::bail!("drive.duty_pct must be within 0..=100");
        }
        if !(0.0..=1.0).contains(&self.drive.turn_inner_scale) {
            eyre::bail!("drive.turn_inner_scale must be within 0..=1");
        }
        if self.session.poll_us == 0 {
            eyre::bail!("session.poll_us must be >= 1");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        Ok(())
    }

    /// Read and parse a TOML file. Validation is a separate, explicit step.
    pub fn load(path: &std::path::Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
        load_toml(&text).map_err(|e| eyre::eyre!("failed to parse config: {e}"))
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BandToml {
    Tuple((u64, u8)),
    Table { until_ms: u64, routine: u8 },
}

fn de_phrase_bands<'de, D>(deserializer: D) -> Result<Vec<PhraseBand>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<BandToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for b in items {
            match b {
                BandToml::Tuple((until_ms, routine)) => out.push(PhraseBand { until_ms, routine }),
                BandToml::Table { until_ms, routine } => out.push(PhraseBand { until_ms, routine }),
            }
        }
    }
    Ok(out)
}
