use groover_core::beat::{BeatDecision, BeatDetector, Routine};
use groover_core::config::BeatCfg;

const OFFSET: u16 = 1523;

/// A block whose every sample sits `excursion` counts above the DC offset.
fn block(excursion: u16) -> Vec<u16> {
    vec![OFFSET + excursion; 160]
}

fn quiet() -> Vec<u16> {
    block(2)
}

fn loud() -> Vec<u16> {
    block(40)
}

#[test]
fn first_block_after_start_is_gated() {
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    // Gate measures from the run start, so an immediate loud block pends.
    match det.process_block(&loud(), 0) {
        BeatDecision::Pending { .. } => {}
        other => panic!("expected Pending, got {other:?}"),
    }
}

#[test]
fn one_beat_within_gate_two_beats_at_gate() {
    // Two above-threshold blocks closer than the gate: only the first fires.
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    for t in [20, 40, 60] {
        det.process_block(&quiet(), t);
    }
    assert!(matches!(
        det.process_block(&loud(), 700),
        BeatDecision::Beat { .. }
    ));
    assert!(matches!(
        det.process_block(&loud(), 1200),
        BeatDecision::Pending { .. }
    ));

    // Exactly one gate interval apart: both fire.
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    for t in [20, 40, 60] {
        det.process_block(&quiet(), t);
    }
    assert!(matches!(
        det.process_block(&loud(), 700),
        BeatDecision::Beat { .. }
    ));
    assert!(matches!(
        det.process_block(&loud(), 1350),
        BeatDecision::Beat { .. }
    ));
}

#[test]
fn expired_search_without_beat_reports_no_beat() {
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    // Warm the window with a steady floor while the gate is still closed;
    // a nearly empty window would make any block look loud.
    for k in 0..33u64 {
        det.process_block(&quiet(), k * 20);
    }
    match det.process_block(&quiet(), 660) {
        BeatDecision::NoBeat { ratio } => assert!(ratio <= 2.4),
        other => panic!("expected NoBeat, got {other:?}"),
    }
}

#[test]
fn all_silent_window_is_indeterminate_not_a_crash() {
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    // Samples equal to the offset contribute zero energy; the window sum
    // stays zero and the ratio is undefined.
    for t in (0..2_000).step_by(20) {
        assert_eq!(
            det.process_block(&block(0), t),
            BeatDecision::Indeterminate
        );
    }
}

#[test]
fn routines_follow_the_phrase_schedule() {
    let cfg = BeatCfg {
        phrase_bands: vec![(2_000, Routine::One), (4_000, Routine::Two)],
        ..BeatCfg::default()
    };
    let mut det = BeatDetector::new(cfg, OFFSET, 0);
    det.process_block(&quiet(), 0);

    let routine_at = |det: &mut BeatDetector, t: u64| match det.process_block(&loud(), t) {
        BeatDecision::Beat { routine, .. } => routine,
        other => panic!("expected a beat at {t}, got {other:?}"),
    };
    assert_eq!(routine_at(&mut det, 700), Routine::One);
    assert_eq!(routine_at(&mut det, 2_100), Routine::Two);
    assert_eq!(routine_at(&mut det, 4_500), Routine::Three);
}

#[test]
fn beat_moves_cycle_through_the_routine() {
    let cfg = BeatCfg {
        // Single never-ending band keeps the routine fixed.
        phrase_bands: vec![(u64::MAX, Routine::One)],
        ..BeatCfg::default()
    };
    let mut det = BeatDetector::new(cfg, OFFSET, 0);
    det.process_block(&quiet(), 0);
    let mut moves = Vec::new();
    for k in 1..=4u64 {
        match det.process_block(&loud(), k * 700) {
            BeatDecision::Beat { mv, .. } => moves.push(mv),
            other => panic!("expected beat, got {other:?}"),
        }
    }
    let cycle = Routine::One.moves();
    assert_eq!(moves[0], cycle[0]);
    assert_eq!(moves[1], cycle[1 % cycle.len()]);
    assert_eq!(moves[0], moves[cycle.len() % moves.len()]);
}

#[test]
fn steady_tempo_yields_one_beat_per_loud_block() {
    // Blocks arrive every 20 ms; every 33rd (660 ms) is a beat-loud block.
    // Gate 650 ms, threshold 2.4: expect exactly one beat per loud block,
    // spacings >= 650 ms.
    let mut det = BeatDetector::new(BeatCfg::default(), OFFSET, 0);
    let mut beat_times = Vec::new();
    let mut loud_blocks = 0;
    for k in 1..=1_650u64 {
        let t = k * 20;
        let is_loud = t % 660 == 0;
        let blk = if is_loud { loud() } else { quiet() };
        loud_blocks += u64::from(is_loud);
        if let BeatDecision::Beat { .. } = det.process_block(&blk, t) {
            beat_times.push(t);
        }
    }
    assert_eq!(beat_times.len() as u64, loud_blocks);
    for pair in beat_times.windows(2) {
        assert!(pair[1] - pair[0] >= 650, "beats too close: {pair:?}");
    }
}
