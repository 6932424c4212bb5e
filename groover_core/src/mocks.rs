//! Test and helper mocks for groover_core

use groover_traits::{CommandLink, Imu, Microphone, StatusPanel};

/// Microphone pinned at the silence offset; every block has zero energy.
pub struct SilentMic {
    pub offset: u16,
}

impl Microphone for SilentMic {
    fn read_sample(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.offset)
    }
}

/// IMU that always reads level and motionless.
pub struct StillImu;

impl Imu for StillImu {
    fn pitch(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(0.0)
    }
    fn angular_rate(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(0.0)
    }
}

/// Command link with no traffic.
pub struct NoopLink;

impl CommandLink for NoopLink {
    fn available(&mut self) -> usize {
        0
    }
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(0)
    }
}

/// Discards status lines.
pub struct NullPanel;

impl StatusPanel for NullPanel {
    fn show(&mut self, _text: &str) {}
}
