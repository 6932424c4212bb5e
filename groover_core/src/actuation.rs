//! Mapping from a signed drive magnitude to per-motor commands.

use groover_traits::{Direction, Drive, Side};

use crate::error::Result;
use crate::hw_error::map_hw_error;

/// One wheel's commanded state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    Run { direction: Direction, duty_pct: f32 },
    /// Short-brake: both direction pins high. Not the same as duty 0.
    Brake,
}

/// Both wheels for one stabilizer tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivePlan {
    pub right: MotorCommand,
    pub left: MotorCommand,
}

/// Converts stabilizer output into per-side direction and duty.
///
/// Each side gets a static bias added to the magnitude (the motors are not
/// identical, so the slower right motor carries a larger offset) and is then
/// scaled by that side's trim before clamping.
#[derive(Debug, Clone)]
pub struct DriveMapper {
    bias_right: f32,
    bias_left: f32,
}

impl DriveMapper {
    pub fn new(bias_right: f32, bias_left: f32) -> Self {
        Self {
            bias_right,
            bias_left,
        }
    }

    /// Zero output is the braking state; any other output drives both wheels
    /// in the sign's direction.
    pub fn plan(&self, output: f32, trim_right: f32, trim_left: f32) -> DrivePlan {
        if output == 0.0 {
            return DrivePlan {
                right: MotorCommand::Brake,
                left: MotorCommand::Brake,
            };
        }
        let direction = if output > 0.0 {
            Direction::Forward
        } else {
            Direction::Reverse
        };
        let magnitude = output.abs();
        DrivePlan {
            right: MotorCommand::Run {
                direction,
                duty_pct: ((magnitude + self.bias_right) * trim_right).clamp(0.0, 100.0),
            },
            left: MotorCommand::Run {
                direction,
                duty_pct: ((magnitude + self.bias_left) * trim_left).clamp(0.0, 100.0),
            },
        }
    }
}

/// Issue a plan to the driver hardware.
pub fn apply_plan<D: Drive>(drive: &mut D, plan: &DrivePlan) -> Result<()> {
    apply_side(drive, Side::Right, plan.right)?;
    apply_side(drive, Side::Left, plan.left)?;
    Ok(())
}

fn apply_side<D: Drive>(drive: &mut D, side: Side, cmd: MotorCommand) -> Result<()> {
    match cmd {
        MotorCommand::Run {
            direction,
            duty_pct,
        } => {
            drive
                .set_direction(side, direction)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
            drive
                .set_duty(side, duty_pct)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        }
        MotorCommand::Brake => {
            drive
                .brake(side)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        }
    }
    Ok(())
}

/// Force both wheels to the braking state.
pub fn brake_all<D: Drive>(drive: &mut D) -> Result<()> {
    for side in [Side::Right, Side::Left] {
        drive
            .brake(side)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
    }
    Ok(())
}
