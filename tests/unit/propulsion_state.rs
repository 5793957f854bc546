//! Reading the propulsion board state machine

use crate::common::{create_gateway, PRB_ADDR};
use avionics_intranet::{current_state, DeviceClass, DeviceInstance, Error, PropulsionState};
use rstest::rstest;

#[rstest]
#[case(0, PropulsionState::Idle)]
#[case(1, PropulsionState::ClearToIgnite)]
#[case(2, PropulsionState::IgnitionSequence)]
#[case(3, PropulsionState::PassivationSequence)]
#[case(4, PropulsionState::Abort)]
#[case(5, PropulsionState::Error)]
fn published_states_decode(#[case] raw: u32, #[case] expected: PropulsionState) {
    let (mut gateway, transport) = create_gateway();
    transport.set_word(PRB_ADDR, 0x04, raw);

    assert_eq!(current_state(&mut gateway, DeviceInstance::Prb), Ok(expected));
}

#[test]
fn state_outside_enumeration_is_reported() {
    let (mut gateway, transport) = create_gateway();
    transport.set_word(PRB_ADDR, 0x04, 6);

    assert_eq!(
        current_state(&mut gateway, DeviceInstance::Prb),
        Err(Error::UnknownState(6))
    );
}

#[test]
fn ignition_gated_on_clear_to_ignite() {
    let (mut gateway, transport) = create_gateway();

    transport.set_word(PRB_ADDR, 0x04, PropulsionState::Idle.raw());
    let state = current_state(&mut gateway, DeviceInstance::Prb).unwrap();
    assert!(!state.may_ignite());

    transport.set_word(PRB_ADDR, 0x04, PropulsionState::ClearToIgnite.raw());
    let state = current_state(&mut gateway, DeviceInstance::Prb).unwrap();
    assert!(state.may_ignite());
}

#[test]
fn trigger_board_has_no_state_register() {
    let (mut gateway, transport) = create_gateway();

    assert_eq!(
        current_state(&mut gateway, DeviceInstance::Trb),
        Err(Error::UnknownRegister(DeviceClass::TriggerBoard))
    );
    assert_eq!(transport.transaction_count(), 0);
}
