//! Peripheral implementations behind the `groover_traits` seams.
//!
//! Simulations are always available and deterministic, so the whole control
//! stack runs (and is tested) without a robot attached. Real GPIO/PWM/UART
//! drivers are Linux-only behind the `hardware` feature. ADC microphone and
//! IMU register drivers are deliberately absent: those live outside the core
//! (the traits are the boundary), and the simulations stand in for them.

pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;

use std::collections::VecDeque;

use groover_traits::{CommandLink, Direction, Drive, Imu, Microphone, Side, StatusPanel};

/// Command frames on the wire are 10 bytes, opcode at index 2.
const FRAME_LEN: usize = 10;
const OPCODE_INDEX: usize = 2;

// Tiny xorshift PRNG; deterministic per seed, no rand dependency.
fn xorshift(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

/// Simulated microphone: a quiet noise floor around the DC offset with loud
/// bursts on a fixed tempo. One `read_sample` call is one sampling tick.
pub struct SimulatedMic {
    offset: u16,
    rate_hz: u32,
    burst_period_ms: u64,
    burst_ms: u64,
    burst_amp: i32,
    noise_amp: i32,
    tick: u64,
    prng: u32,
}

impl SimulatedMic {
    pub fn new(offset: u16, rate_hz: u32) -> Self {
        Self {
            offset,
            rate_hz: rate_hz.max(1),
            burst_period_ms: 660,
            burst_ms: 40,
            burst_amp: 600,
            noise_amp: 40,
            tick: 0,
            prng: 0x2545_f491,
        }
    }

    /// Beat spacing in milliseconds.
    pub fn with_tempo(mut self, burst_period_ms: u64) -> Self {
        self.burst_period_ms = burst_period_ms.max(1);
        self
    }

    /// Burst length and amplitude over the noise floor.
    pub fn with_burst(mut self, burst_ms: u64, burst_amp: i32) -> Self {
        self.burst_ms = burst_ms;
        self.burst_amp = burst_amp;
        self
    }

    fn amplitude_now(&self) -> i32 {
        let t_ms = self.tick * 1_000 / u64::from(self.rate_hz);
        if t_ms % self.burst_period_ms < self.burst_ms {
            self.burst_amp
        } else {
            self.noise_amp
        }
    }
}

impl Microphone for SimulatedMic {
    fn read_sample(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let amp = self.amplitude_now();
        self.tick += 1;
        let span = 2 * amp + 1;
        let noise = (xorshift(&mut self.prng) % span as u32) as i32 - amp;
        let value = (i32::from(self.offset) + noise).clamp(0, 4_095);
        Ok(value as u16)
    }
}

/// Simulated IMU: a damped pendulum released from an initial tilt. Each
/// `pitch` call advances the model by one step of `dt_s`; `angular_rate`
/// reports the analytic derivative at the same instant.
pub struct SimulatedImu {
    amplitude_deg: f32,
    damping: f32,
    omega: f32,
    rest_deg: f32,
    dt_s: f32,
    t_s: f32,
}

impl SimulatedImu {
    pub fn new(amplitude_deg: f32, damping: f32, freq_hz: f32, dt_s: f32) -> Self {
        Self {
            amplitude_deg,
            damping,
            omega: 2.0 * std::f32::consts::PI * freq_hz,
            rest_deg: 0.0,
            dt_s,
            t_s: 0.0,
        }
    }

    /// Resting tilt, for modelling an off-center chassis.
    pub fn with_rest(mut self, rest_deg: f32) -> Self {
        self.rest_deg = rest_deg;
        self
    }

    fn envelope(&self) -> f32 {
        self.amplitude_deg * (-self.damping * self.t_s).exp()
    }
}

impl Imu for SimulatedImu {
    fn pitch(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        self.t_s += self.dt_s;
        Ok(self.rest_deg + self.envelope() * (self.omega * self.t_s).cos())
    }

    fn angular_rate(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let e = self.envelope();
        let (s, c) = (self.omega * self.t_s).sin_cos();
        Ok(-e * (self.damping * c + self.omega * s))
    }
}

/// One wheel's last commanded state, as seen by the simulated driver.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WheelState {
    pub direction: Option<Direction>,
    pub duty_pct: f32,
    pub braked: bool,
}

/// Records drive commands instead of moving motors.
#[derive(Debug, Default)]
pub struct SimulatedDrive {
    right: WheelState,
    left: WheelState,
}

impl SimulatedDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wheel(&self, side: Side) -> &WheelState {
        match side {
            Side::Right => &self.right,
            Side::Left => &self.left,
        }
    }

    fn wheel_mut(&mut self, side: Side) -> &mut WheelState {
        match side {
            Side::Right => &mut self.right,
            Side::Left => &mut self.left,
        }
    }
}

impl Drive for SimulatedDrive {
    fn set_direction(
        &mut self,
        side: Side,
        dir: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?side, ?dir, "sim drive direction");
        let wheel = self.wheel_mut(side);
        wheel.direction = Some(dir);
        wheel.braked = false;
        Ok(())
    }

    fn set_duty(
        &mut self,
        side: Side,
        percent: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?side, percent, "sim drive duty");
        let wheel = self.wheel_mut(side);
        wheel.duty_pct = percent;
        wheel.braked = false;
        Ok(())
    }

    fn brake(&mut self, side: Side) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?side, "sim drive brake");
        let wheel = self.wheel_mut(side);
        wheel.braked = true;
        wheel.duty_pct = 0.0;
        Ok(())
    }
}

/// Command link fed from a pre-scripted byte queue.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    queue: VecDeque<u8>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one well-formed frame carrying `opcode`; the other nine bytes
    /// are padding the protocol ignores.
    pub fn push_frame(&mut self, opcode: u8) {
        let mut frame = [0u8; FRAME_LEN];
        frame[OPCODE_INDEX] = opcode;
        self.queue.extend(frame);
    }

    /// Queue raw bytes, for exercising misaligned traffic.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes);
    }
}

impl CommandLink for ScriptedLink {
    fn available(&mut self) -> usize {
        self.queue.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let n = buf.len().min(self.queue.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.queue.pop_front().unwrap_or(0);
        }
        Ok(n)
    }
}

/// Prints status lines to stdout (the OLED stand-in).
#[derive(Debug, Default)]
pub struct ConsolePanel;

impl ConsolePanel {
    pub fn new() -> Self {
        Self
    }
}

impl StatusPanel for ConsolePanel {
    fn show(&mut self, text: &str) {
        println!("[status] {text}");
    }
}
