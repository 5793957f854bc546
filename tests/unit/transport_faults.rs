//! Transport failures surface unchanged and are never retried

use crate::common::{create_gateway, MockFault, Operation, CAM_SEP_ADDR, PRB_ADDR};
use avionics_intranet::registers::names;
use avionics_intranet::{
    CameraPosition, DeviceInstance, Error, MapError, RevisionId, SharedBusError,
};
use rstest::rstest;

#[rstest]
#[case(MockFault::Nack)]
#[case(MockFault::Timeout)]
fn read_fault_is_returned_verbatim(#[case] fault: MockFault) {
    let (mut gateway, transport) = create_gateway();
    transport.fail_next_read(fault);

    assert_eq!(
        gateway.read_scalar(DeviceInstance::Prb, names::P_CCC),
        Err(Error::Transport(fault))
    );
    assert_eq!(
        transport.operations(),
        vec![Operation::Read {
            bus: PRB_ADDR,
            register: 0x09,
        }]
    );
}

#[rstest]
#[case(MockFault::Nack)]
#[case(MockFault::Timeout)]
fn write_fault_is_returned_verbatim(#[case] fault: MockFault) {
    let (mut gateway, transport) = create_gateway();
    let cam = DeviceInstance::Cam(CameraPosition::Sep);
    transport.fail_next_write(fault);

    assert_eq!(
        gateway.write_flag(cam, names::RECORDING, true),
        Err(Error::Transport(fault))
    );
    assert_eq!(transport.transaction_count(), 1);
    assert_eq!(transport.word(CAM_SEP_ADDR, 0x03), None);
}

#[test]
fn next_request_goes_through_after_a_fault() {
    let (mut gateway, transport) = create_gateway();
    transport.set_word(PRB_ADDR, 0x09, 3150);
    transport.fail_next_read(MockFault::Timeout);

    assert!(gateway.read_scalar(DeviceInstance::Prb, names::P_CCC).is_err());
    assert_eq!(
        gateway.read_scalar(DeviceInstance::Prb, names::P_CCC),
        Ok(3150)
    );
    assert_eq!(transport.transaction_count(), 2);
}

#[test]
fn scan_continues_past_a_faulted_register() {
    let (mut gateway, transport) = create_gateway();
    transport.fail_next_read(MockFault::Nack);

    let mut outcomes = Vec::new();
    gateway
        .scan(DeviceInstance::Trb, |register, result| {
            outcomes.push((register.name, result.is_ok()))
        })
        .unwrap();

    // IS_WOKEN_UP faults; a zero PYROS word decodes; IS_TRIGGERED zero is not a sentinel
    assert_eq!(
        outcomes,
        vec![
            (names::IS_WOKEN_UP, false),
            (names::PYROS, true),
            (names::IS_TRIGGERED, false),
        ]
    );
}

fn is_std_error<T: std::error::Error>(_: &T) {}

#[test]
fn errors_render_for_operators() {
    let fault: Error<MockFault> = Error::Transport(MockFault::Nack);
    is_std_error(&fault);
    assert_eq!(fault.to_string(), "transport fault: Nack");

    let reserved: Error<MockFault> = Error::ReservedBits(0xDEAD_0102);
    assert_eq!(reserved.to_string(), "word 0xdead0102 has reserved bits set");

    let unsupported: Error<MockFault> = MapError::UnsupportedRevision(RevisionId(9)).into();
    assert_eq!(unsupported.to_string(), "register map r9 is not supported");

    let busy: SharedBusError<MockFault> = SharedBusError::Busy;
    is_std_error(&busy);
    assert_eq!(busy.to_string(), "bus busy");
}
