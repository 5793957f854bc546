//! Boolean sentinel registers on the wire

use crate::common::{create_gateway, create_gateway_with, Operation, CAM_SEP_ADDR, DPR_ETH_ADDR};
use avionics_intranet::registers::names;
use avionics_intranet::revisions::REV_1;
use avionics_intranet::{CameraPosition, DeviceInstance, Error, Propellant, SessionConfig, Value};

const DPR_ETH: DeviceInstance = DeviceInstance::Dpr(Propellant::Eth);

#[test]
fn engage_abort_writes_latest_pattern() {
    let (mut gateway, transport) = create_gateway();

    gateway.write_flag(DPR_ETH, names::ABORT, true).unwrap();

    assert_eq!(
        transport.operations(),
        vec![Operation::Write {
            bus: DPR_ETH_ADDR,
            register: 0x04,
            bytes: [0x64, 0x00, 0x00, 0x00],
        }]
    );
    assert_eq!(gateway.read_flag(DPR_ETH, names::ABORT), Ok(true));
}

#[test]
fn disengage_writes_its_own_pattern_not_zero() {
    let (mut gateway, transport) = create_gateway();

    gateway
        .write(DPR_ETH, names::ABORT, &Value::Flag(false))
        .unwrap();

    assert_eq!(transport.word(DPR_ETH_ADDR, 0x04), Some(0x0000_000D));
    assert_eq!(gateway.read(DPR_ETH, names::ABORT), Ok(Value::Flag(false)));
}

#[test]
fn plain_one_read_back_is_invalid_sentinel() {
    let (mut gateway, transport) = create_gateway();
    gateway.write_flag(DPR_ETH, names::ABORT, true).unwrap();

    // board answers with a C-style boolean instead of the engage pattern
    transport.set_word(DPR_ETH_ADDR, 0x04, 0x0000_0001);

    assert_eq!(
        gateway.read_flag(DPR_ETH, names::ABORT),
        Err(Error::InvalidSentinel(0x0000_0001))
    );
}

#[test]
fn unprogrammed_register_is_not_false() {
    let (mut gateway, _transport) = create_gateway();
    let cam = DeviceInstance::Cam(CameraPosition::Sep);

    // nothing preloaded: the mock answers zero
    assert_eq!(
        gateway.read_flag(cam, names::IS_WOKEN_UP),
        Err(Error::InvalidSentinel(0))
    );
}

#[test]
fn early_revision_uses_its_own_patterns() {
    let (mut gateway, transport) = create_gateway_with(SessionConfig::uniform(REV_1.id()));
    let cam = DeviceInstance::Cam(CameraPosition::Sep);

    gateway.write_flag(cam, names::WAKE_UP, true).unwrap();
    assert_eq!(transport.word(CAM_SEP_ADDR, 0x01), Some(0xAC));

    transport.set_word(CAM_SEP_ADDR, 0x02, 0xDE);
    assert_eq!(gateway.read_flag(cam, names::IS_WOKEN_UP), Ok(false));

    // a latest-revision pattern means the two sides disagree about the map
    transport.set_word(CAM_SEP_ADDR, 0x02, 0x64);
    assert_eq!(
        gateway.read_flag(cam, names::IS_WOKEN_UP),
        Err(Error::InvalidSentinel(0x64))
    );
}
