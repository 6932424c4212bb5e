//! Open-loop locomotion moves driven by commands and dance routines.

use groover_traits::clock::Clock;
use groover_traits::{Direction, Drive, Side};

use crate::config::DriveCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;

/// Move vocabulary of the drive command set and the dance routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    CircleLeft,
    CircleRight,
    /// Coast to rest: duty 0 on both sides (the shutdown path uses the
    /// short-brake instead).
    Stop,
}

/// Execute one move against the drive hardware.
///
/// Turns slow the inner wheel, hold for `turn_hold_ms`, then restore it.
/// This blocks the caller for the hold; commands are rare relative to the
/// hold time.
pub fn perform<D: Drive>(
    drive: &mut D,
    mv: Move,
    cfg: &DriveCfg,
    clock: &(dyn Clock + Send + Sync),
) -> Result<()> {
    let duty = cfg.duty_pct;
    tracing::debug!(?mv, duty, "perform move");
    match mv {
        Move::Forward => {
            run_side(drive, Side::Right, Direction::Forward, duty)?;
            run_side(drive, Side::Left, Direction::Forward, duty)?;
        }
        Move::Backward => {
            run_side(drive, Side::Right, Direction::Reverse, duty)?;
            run_side(drive, Side::Left, Direction::Reverse, duty)?;
        }
        Move::TurnLeft => {
            run_side(drive, Side::Left, Direction::Forward, duty * cfg.turn_inner_scale)?;
            run_side(drive, Side::Right, Direction::Forward, duty)?;
            clock.sleep(std::time::Duration::from_millis(cfg.turn_hold_ms));
            run_side(drive, Side::Left, Direction::Forward, duty)?;
        }
        Move::TurnRight => {
            run_side(drive, Side::Right, Direction::Forward, duty * cfg.turn_inner_scale)?;
            run_side(drive, Side::Left, Direction::Forward, duty)?;
            clock.sleep(std::time::Duration::from_millis(cfg.turn_hold_ms));
            run_side(drive, Side::Right, Direction::Forward, duty)?;
        }
        Move::CircleLeft => {
            run_side(drive, Side::Right, Direction::Forward, duty)?;
            run_side(drive, Side::Left, Direction::Reverse, duty)?;
        }
        Move::CircleRight => {
            run_side(drive, Side::Left, Direction::Forward, duty)?;
            run_side(drive, Side::Right, Direction::Reverse, duty)?;
        }
        Move::Stop => {
            set_duty(drive, Side::Right, 0.0)?;
            set_duty(drive, Side::Left, 0.0)?;
        }
    }
    Ok(())
}

fn run_side<D: Drive>(drive: &mut D, side: Side, dir: Direction, duty: f32) -> Result<()> {
    drive
        .set_direction(side, dir)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
    set_duty(drive, side, duty)
}

fn set_duty<D: Drive>(drive: &mut D, side: Side, duty: f32) -> Result<()> {
    drive
        .set_duty(side, duty.clamp(0.0, 100.0))
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
}
