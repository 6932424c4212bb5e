//! Short-time energy beat detection.
//!
//! Each full sample block ("epoch") yields one instantaneous energy value. A
//! moving window of the last M epochs maintains a running sum, and the ratio
//! of the newest energy to the window average is compared against a threshold
//! behind a refractory gate: after one decision, no further decision is
//! considered until the gate interval has elapsed. Firing is edge-on-first,
//! not peak-picking: the first above-threshold block after the gate expires
//! wins.

use crate::config::BeatCfg;
use crate::locomotion::Move;
use crate::state::BeatState;

/// Locomotion routine selected by the phrase schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    /// No beat found within the search interval; hold still.
    Idle,
    One,
    Two,
    Three,
}

impl Routine {
    /// Move cycle stepped one entry per beat while this routine is active.
    /// Bodies are deliberately small; choreography beyond dispatch is not
    /// this crate's business.
    pub fn moves(self) -> &'static [Move] {
        match self {
            Routine::Idle => &[Move::Stop],
            Routine::One => &[Move::Forward, Move::Backward],
            Routine::Two => &[Move::CircleLeft, Move::CircleRight],
            Routine::Three => &[
                Move::Forward,
                Move::CircleLeft,
                Move::Backward,
                Move::CircleRight,
            ],
        }
    }

    /// Map a config-file index (0..=3) to a routine.
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Routine::Idle),
            1 => Some(Routine::One),
            2 => Some(Routine::Two),
            3 => Some(Routine::Three),
            _ => None,
        }
    }
}

impl std::fmt::Display for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Routine::Idle => write!(f, "idle"),
            Routine::One => write!(f, "routine 1"),
            Routine::Two => write!(f, "routine 2"),
            Routine::Three => write!(f, "routine 3"),
        }
    }
}

/// Sum of squared DC-offset-corrected samples over one block.
///
/// A full-range u16 excursion squared is ~4.3e9; 160 of them stay far inside
/// u64, so the accumulation cannot overflow.
pub fn block_energy(block: &[u16], dc_offset: u16) -> u64 {
    block
        .iter()
        .map(|&s| {
            let d = i64::from(s) - i64::from(dc_offset);
            (d * d) as u64
        })
        .sum()
}

/// Circular window of the M most recent epoch energies with an incrementally
/// maintained sum. Every insertion subtracts the evicted value before adding
/// the new one, so the sum never drifts from the stored contents.
#[derive(Debug, Clone)]
pub struct EnergyWindow {
    buf: Vec<u64>,
    cursor: usize,
    sum: u64,
}

impl EnergyWindow {
    /// Starts zero-filled; early ratios run against a partially warmed
    /// window.
    pub fn new(epochs: usize) -> Self {
        assert!(epochs > 0, "energy window needs at least one epoch");
        Self {
            buf: vec![0; epochs],
            cursor: 0,
            sum: 0,
        }
    }

    pub fn epochs(&self) -> usize {
        self.buf.len()
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Evict the oldest entry, insert `energy`, advance with wraparound.
    pub fn push(&mut self, energy: u64) {
        self.sum = self.sum - self.buf[self.cursor] + energy;
        self.buf[self.cursor] = energy;
        self.cursor = (self.cursor + 1) % self.buf.len();
    }

    /// Ratio of `energy` to the window average: `energy * M / sum`.
    /// `None` when the sum is zero; the ratio is undefined, not infinite.
    pub fn ratio(&self, energy: u64) -> Option<f32> {
        if self.sum == 0 {
            return None;
        }
        Some((energy as f64 * self.buf.len() as f64 / self.sum as f64) as f32)
    }
}

/// Outcome of one beat-path evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeatDecision {
    /// Gate expired and the ratio cleared the threshold.
    Beat {
        ratio: f32,
        routine: Routine,
        mv: Move,
    },
    /// Gate expired but nothing cleared the threshold: the search interval
    /// ran dry, downstream should idle.
    NoBeat { ratio: f32 },
    /// Gate still closed; nothing to decide yet.
    Pending { ratio: f32 },
    /// Window sum is zero, ratio undefined. Surfaced as a distinct outcome
    /// instead of dividing.
    Indeterminate,
}

/// Moving-window energy-ratio detector with a time-gated decision policy and
/// a phrase-based routine schedule.
#[derive(Debug)]
pub struct BeatDetector {
    cfg: BeatCfg,
    dc_offset: u16,
    window: EnergyWindow,
    state: BeatState,
}

impl BeatDetector {
    pub fn new(cfg: BeatCfg, dc_offset: u16, now_ms: u64) -> Self {
        let window = EnergyWindow::new(cfg.window_epochs);
        Self {
            cfg,
            dc_offset,
            window,
            state: BeatState::new(now_ms),
        }
    }

    pub fn state(&self) -> &BeatState {
        &self.state
    }

    /// Consume one full sample block and run the gated decision step.
    /// `now_ms` is run-relative wall time.
    pub fn process_block(&mut self, block: &[u16], now_ms: u64) -> BeatDecision {
        let energy = block_energy(block, self.dc_offset);
        self.window.push(energy);

        let Some(ratio) = self.window.ratio(energy) else {
            tracing::warn!("energy window sum is zero; beat ratio indeterminate");
            return BeatDecision::Indeterminate;
        };
        tracing::trace!(ratio, energy, "epoch energy");

        if now_ms.saturating_sub(self.state.last_beat_ms) < self.cfg.gate_ms {
            return BeatDecision::Pending { ratio };
        }
        if ratio <= self.cfg.threshold {
            return BeatDecision::NoBeat { ratio };
        }

        self.state.last_beat_ms = now_ms;
        let routine = self.routine_for(now_ms.saturating_sub(self.state.start_ms));
        if routine == self.state.routine {
            self.state.phase = self.state.phase.wrapping_add(1);
        } else {
            self.state.routine = routine;
            self.state.phase = 0;
        }
        let moves = routine.moves();
        let mv = moves[self.state.phase % moves.len()];
        tracing::debug!(ratio, %routine, phase = self.state.phase, "beat");
        BeatDecision::Beat { ratio, routine, mv }
    }

    /// Phrase schedule: pick the routine by cumulative elapsed time since the
    /// run started. Bands are configuration, not music analysis.
    fn routine_for(&self, elapsed_ms: u64) -> Routine {
        for &(until_ms, routine) in &self.cfg.phrase_bands {
            if elapsed_ms < until_ms {
                return routine;
            }
        }
        self.cfg.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_subtracts_dc_offset() {
        // Samples equal to the offset contribute nothing.
        assert_eq!(block_energy(&[1523, 1523, 1523], 1523), 0);
        // 1525-1523 = 2 -> 4 per sample.
        assert_eq!(block_energy(&[1525, 1525], 1523), 8);
        // Offset-symmetric excursions contribute equally.
        assert_eq!(block_energy(&[1520, 1526], 1523), 9 + 9);
    }

    #[test]
    fn window_ratio_is_undefined_on_zero_sum() {
        let mut w = EnergyWindow::new(50);
        w.push(0);
        assert_eq!(w.ratio(0), None);
    }

    #[test]
    fn window_ratio_is_the_scaled_average() {
        let mut w = EnergyWindow::new(4);
        for e in [10u64, 10, 10, 10] {
            w.push(e);
        }
        // E*M/sum = 10*4/40
        let c = w.ratio(10).unwrap();
        assert!((c - 1.0).abs() < 1e-6);
        w.push(120);
        // sum is now 10+10+10+120 = 150; c = 120*4/150 = 3.2
        let c = w.ratio(120).unwrap();
        assert!((c - 3.2).abs() < 1e-6);
    }

    #[test]
    fn phrase_bands_pick_routine_by_elapsed_time() {
        let det = BeatDetector::new(BeatCfg::default(), 1523, 0);
        assert_eq!(det.routine_for(0), Routine::One);
        assert_eq!(det.routine_for(20_867), Routine::One);
        assert_eq!(det.routine_for(20_868), Routine::Two);
        assert_eq!(det.routine_for(62_592), Routine::Three);
    }
}
