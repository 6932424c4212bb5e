//! Fixed-length command frame parsing and dispatch.
//!
//! Frames are 10 raw bytes; only byte index 2 is semantic, an ASCII digit.
//! There is no checksum and no resynchronization; a dropped byte shifts
//! every later frame. Command effects are a table selected per mode, so the
//! same digit means "drive forward" in drive mode and "lean further forward"
//! in balance mode.

use crate::config::BalanceCfg;
use crate::locomotion::Move;
use crate::state::ControlState;

/// Command frames are exactly this many bytes.
pub const FRAME_LEN: usize = 10;
/// The single semantic byte within a frame.
pub const OPCODE_INDEX: usize = 2;

/// Effect of a recognized command digit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandAction {
    /// Execute a locomotion move (drive/dance modes).
    Locomote(Move),
    /// Shift the pitch setpoint by this many degrees.
    NudgeTarget(f32),
    /// Differential trim: add to the right scalar, subtract from the left.
    NudgeTrim(f32),
    /// Restore the configured initial setpoint.
    ResetTarget,
    /// Restore both trim scalars to 1.0.
    ResetTrims,
    /// Force the short-brake state on both wheels.
    Brake,
}

/// Digit → action table for one mode.
#[derive(Debug, Clone)]
pub struct CommandMap {
    entries: Vec<(u8, CommandAction)>,
}

impl CommandMap {
    pub fn new(entries: Vec<(u8, CommandAction)>) -> Self {
        Self { entries }
    }

    /// Locomotion mode: digits select dance moves.
    pub fn drive() -> Self {
        Self::new(vec![
            (b'5', CommandAction::Locomote(Move::Forward)),
            (b'6', CommandAction::Locomote(Move::Backward)),
            (b'7', CommandAction::Locomote(Move::TurnLeft)),
            (b'8', CommandAction::Locomote(Move::TurnRight)),
            (b'1', CommandAction::Locomote(Move::CircleLeft)),
            (b'2', CommandAction::Locomote(Move::CircleRight)),
            (b'3', CommandAction::Locomote(Move::Stop)),
        ])
    }

    /// Balance mode: digits steer by mutating setpoint and trims.
    pub fn balance(cfg: &BalanceCfg) -> Self {
        Self::new(vec![
            (b'5', CommandAction::NudgeTarget(cfg.target_step_deg)),
            (b'6', CommandAction::NudgeTarget(-cfg.target_step_deg)),
            (b'7', CommandAction::NudgeTrim(cfg.trim_step)),
            (b'8', CommandAction::NudgeTrim(-cfg.trim_step)),
            (b'1', CommandAction::ResetTarget),
            (b'2', CommandAction::ResetTrims),
            (b'3', CommandAction::Brake),
        ])
    }

    pub fn lookup(&self, opcode: u8) -> Option<CommandAction> {
        self.entries
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|&(_, action)| action)
    }
}

/// Applies command frames to the shared control state.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    map: CommandMap,
    initial_target_deg: f32,
}

impl CommandDispatcher {
    pub fn new(map: CommandMap, initial_target_deg: f32) -> Self {
        Self {
            map,
            initial_target_deg,
        }
    }

    /// Validate a frame (by length only), look up its opcode, and apply any
    /// state mutation. Returns the action for the caller to actuate;
    /// unmapped digits are silent no-ops by design.
    pub fn dispatch(&self, frame: &[u8], state: &mut ControlState) -> Option<CommandAction> {
        if frame.len() != FRAME_LEN {
            tracing::warn!(len = frame.len(), "discarding malformed command frame");
            return None;
        }
        let opcode = frame[OPCODE_INDEX];
        let action = self.map.lookup(opcode)?;
        match action {
            CommandAction::NudgeTarget(delta) => state.target_deg += delta,
            CommandAction::NudgeTrim(delta) => {
                state.trim_right += delta;
                state.trim_left -= delta;
            }
            CommandAction::ResetTarget => state.target_deg = self.initial_target_deg,
            CommandAction::ResetTrims => state.reset_trims(),
            CommandAction::Locomote(_) | CommandAction::Brake => {}
        }
        let digit = opcode as char;
        tracing::debug!(%digit, ?action, "command dispatched");
        Some(action)
    }
}

/// Build a well-formed frame around an opcode; the other nine bytes are
/// padding the protocol ignores.
pub fn frame_for(opcode: u8) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[OPCODE_INDEX] = opcode;
    frame
}
