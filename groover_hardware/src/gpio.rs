//! Raspberry Pi peripherals: H-bridge drive over GPIO + hardware PWM, and a
//! UART command link. Linux-only, behind the `hardware` feature.

use std::time::Duration;

use groover_traits::{CommandLink, Direction, Drive, Side};
use rppal::gpio::{Gpio, OutputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use rppal::uart::{Parity, Uart};

use crate::error::{HwError, Result};

/// Pin assignment for one H-bridge channel.
#[derive(Debug, Clone, Copy)]
pub struct BridgePins {
    pub dir_a: u8,
    pub dir_b: u8,
}

struct BridgeSide {
    dir_a: OutputPin,
    dir_b: OutputPin,
    pwm: Pwm,
}

/// Dual H-bridge drive: two direction pins plus a hardware PWM channel per
/// side. Short-brake is both direction pins high.
pub struct GpioDrive {
    right: BridgeSide,
    left: BridgeSide,
}

impl GpioDrive {
    /// PWM carrier frequency; the motor timer runs at 1 kHz.
    const PWM_HZ: f64 = 1_000.0;

    pub fn new(right: BridgePins, left: BridgePins) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut setup = |pins: BridgePins, channel: Channel| -> Result<BridgeSide> {
            let dir_a = gpio
                .get(pins.dir_a)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            let dir_b = gpio
                .get(pins.dir_b)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            let pwm = Pwm::with_frequency(channel, Self::PWM_HZ, 0.0, Polarity::Normal, true)
                .map_err(|e| HwError::Pwm(e.to_string()))?;
            Ok(BridgeSide { dir_a, dir_b, pwm })
        };
        Ok(Self {
            right: setup(right, Channel::Pwm0)?,
            left: setup(left, Channel::Pwm1)?,
        })
    }

    fn side_mut(&mut self, side: Side) -> &mut BridgeSide {
        match side {
            Side::Right => &mut self.right,
            Side::Left => &mut self.left,
        }
    }
}

impl Drive for GpioDrive {
    fn set_direction(
        &mut self,
        side: Side,
        dir: Direction,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bridge = self.side_mut(side);
        match dir {
            Direction::Forward => {
                bridge.dir_a.set_high();
                bridge.dir_b.set_low();
            }
            Direction::Reverse => {
                bridge.dir_a.set_low();
                bridge.dir_b.set_high();
            }
        }
        Ok(())
    }

    fn set_duty(
        &mut self,
        side: Side,
        percent: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bridge = self.side_mut(side);
        let duty = f64::from(percent.clamp(0.0, 100.0)) / 100.0;
        bridge
            .pwm
            .set_duty_cycle(duty)
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
    }

    fn brake(
        &mut self,
        side: Side,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bridge = self.side_mut(side);
        bridge.dir_a.set_high();
        bridge.dir_b.set_high();
        bridge
            .pwm
            .set_duty_cycle(0.0)
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
    }
}

/// Non-blocking UART command link.
pub struct UartLink {
    uart: Uart,
}

impl UartLink {
    pub fn new(device: &str, baud: u32) -> Result<Self> {
        let mut uart = Uart::with_path(device, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        // Zero read timeout: read() returns whatever is buffered.
        uart.set_read_mode(0, Duration::ZERO)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        Ok(Self { uart })
    }
}

impl CommandLink for UartLink {
    fn available(&mut self) -> usize {
        match self.uart.input_len() {
            Ok(n) => n,
            Err(e) => {
                tracing::trace!(error = %e, "uart input_len failed");
                0
            }
        }
    }

    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> std::result::Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        self.uart
            .read(buf)
            .map_err(|e| Box::new(HwError::Uart(e.to_string())) as _)
    }
}
