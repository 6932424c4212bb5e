//! Per-digit command mapping checks against the two mode tables.

use groover_core::command::{CommandAction, CommandDispatcher, CommandMap, frame_for};
use groover_core::config::BalanceCfg;
use groover_core::locomotion::Move;
use groover_core::state::ControlState;
use rstest::rstest;

#[rstest]
#[case(b'5', Move::Forward)]
#[case(b'6', Move::Backward)]
#[case(b'7', Move::TurnLeft)]
#[case(b'8', Move::TurnRight)]
#[case(b'1', Move::CircleLeft)]
#[case(b'2', Move::CircleRight)]
#[case(b'3', Move::Stop)]
fn drive_table_maps_every_digit(#[case] opcode: u8, #[case] expected: Move) {
    let dispatcher = CommandDispatcher::new(CommandMap::drive(), 0.0);
    let mut state = ControlState::new(0.0);
    assert_eq!(
        dispatcher.dispatch(&frame_for(opcode), &mut state),
        Some(CommandAction::Locomote(expected))
    );
}

fn balance_dispatcher() -> CommandDispatcher {
    CommandDispatcher::new(CommandMap::balance(&BalanceCfg::default()), -0.3)
}

#[test]
fn target_nudges_step_by_two_tenths() {
    let dispatcher = balance_dispatcher();
    let mut state = ControlState::new(-0.3);
    dispatcher.dispatch(&frame_for(b'5'), &mut state);
    assert!((state.target_deg + 0.1).abs() < 1e-6, "-0.3 + 0.2");
    dispatcher.dispatch(&frame_for(b'6'), &mut state);
    dispatcher.dispatch(&frame_for(b'6'), &mut state);
    assert!((state.target_deg + 0.5).abs() < 1e-6);
}

#[test]
fn trim_nudges_are_differential() {
    let dispatcher = balance_dispatcher();
    let mut state = ControlState::new(-0.3);
    dispatcher.dispatch(&frame_for(b'7'), &mut state);
    assert!((state.trim_right - 1.2).abs() < 1e-6);
    assert!((state.trim_left - 0.8).abs() < 1e-6);
    dispatcher.dispatch(&frame_for(b'8'), &mut state);
    dispatcher.dispatch(&frame_for(b'8'), &mut state);
    assert!((state.trim_right - 0.8).abs() < 1e-6);
    assert!((state.trim_left - 1.2).abs() < 1e-6);
}

#[test]
fn resets_restore_initial_target_and_unit_trims() {
    let dispatcher = balance_dispatcher();
    let mut state = ControlState::new(-0.3);
    for op in [b'5', b'5', b'7', b'8', b'8'] {
        dispatcher.dispatch(&frame_for(op), &mut state);
    }
    dispatcher.dispatch(&frame_for(b'1'), &mut state);
    assert!((state.target_deg + 0.3).abs() < 1e-6);
    dispatcher.dispatch(&frame_for(b'2'), &mut state);
    assert_eq!(state.trim_right, 1.0);
    assert_eq!(state.trim_left, 1.0);
}

#[test]
fn brake_digit_returns_an_action_without_touching_state() {
    let dispatcher = balance_dispatcher();
    let mut state = ControlState::new(-0.3);
    let before = state.clone();
    assert_eq!(
        dispatcher.dispatch(&frame_for(b'3'), &mut state),
        Some(CommandAction::Brake)
    );
    assert_eq!(state.target_deg, before.target_deg);
    assert_eq!(state.trim_right, before.trim_right);
}

#[rstest]
#[case(b'0')]
#[case(b'4')]
#[case(b'9')]
#[case(b'x')]
fn undefined_digits_are_ignored_in_both_tables(#[case] opcode: u8) {
    for dispatcher in [
        CommandDispatcher::new(CommandMap::drive(), 0.0),
        balance_dispatcher(),
    ] {
        let mut state = ControlState::new(-0.3);
        let before = state.clone();
        assert_eq!(dispatcher.dispatch(&frame_for(opcode), &mut state), None);
        assert_eq!(state.target_deg, before.target_deg);
        assert_eq!(state.trim_right, before.trim_right);
        assert_eq!(state.trim_left, before.trim_left);
    }
}
