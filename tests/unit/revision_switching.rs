//! Explicit map reconfiguration through the gateway

use crate::common::{
    create_gateway, create_gateway_with, Operation, CAM_SEP_ADDR, DPR_ETH_ADDR, PRB_ADDR, TRB_ADDR,
};
use avionics_intranet::registers::names;
use avionics_intranet::revisions::{REV_1, REV_2};
use avionics_intranet::{
    CameraPosition, Compatibility, DeviceClass, DeviceInstance, Error, Propellant, RevisionId,
    SessionConfig,
};

#[test]
fn reconfigure_moves_wire_addresses() {
    let (mut gateway, transport) = create_gateway_with(SessionConfig::uniform(REV_1.id()));
    let eth = DeviceInstance::Dpr(Propellant::Eth);

    gateway.read_scalar(eth, names::PRESSURE).unwrap();
    let change = gateway
        .reconfigure(DeviceClass::PressurizationController, REV_2.id())
        .unwrap();
    assert!(matches!(change, Compatibility::Breaking { .. }));
    assert_eq!(
        gateway.read_scalar(eth, names::PRESSURE),
        Err(Error::UnknownRegister(DeviceClass::PressurizationController))
    );
    gateway.read_scalar(eth, names::P_TANK).unwrap();

    assert_eq!(
        transport.operations(),
        vec![
            Operation::Read {
                bus: DPR_ETH_ADDR,
                register: 0x05,
            },
            Operation::Read {
                bus: DPR_ETH_ADDR,
                register: 0x07,
            },
        ]
    );
}

#[test]
fn unsupported_revision_leaves_session_untouched() {
    let (mut gateway, transport) = create_gateway();

    assert_eq!(
        gateway.reconfigure(DeviceClass::TriggerBoard, RevisionId(9)),
        Err(Error::UnsupportedRevision(RevisionId(9)))
    );
    gateway
        .write_channels(DeviceInstance::Trb, names::PYROS, &[0, 0, 1])
        .unwrap();
    assert_eq!(transport.word(TRB_ADDR, 0x04), Some(0x01));
}

#[test]
fn mixed_session_speaks_each_class_its_own_layout() {
    let config = SessionConfig::default().with_class(DeviceClass::TriggerBoard, REV_1.id());
    let (mut gateway, transport) = create_gateway_with(config);

    gateway
        .write_flag(DeviceInstance::Trb, names::PYRO_CH2, true)
        .unwrap();
    gateway
        .write_flag(DeviceInstance::Prb, names::CLEAR_TO_IGNITE, true)
        .unwrap();

    // early sentinels on the trigger board, latest everywhere else
    assert_eq!(transport.word(TRB_ADDR, 0x05), Some(0xAC));
    assert_eq!(transport.word(PRB_ADDR, 0x03), Some(0x64));

    assert_eq!(
        gateway.read_channels(DeviceInstance::Trb, names::PYROS),
        Err(Error::UnknownRegister(DeviceClass::TriggerBoard))
    );
}

#[test]
fn reconfigure_to_same_revision_is_identical() {
    let (mut gateway, _transport) = create_gateway();

    for class in DeviceClass::ALL.iter().copied() {
        assert_eq!(
            gateway.reconfigure(class, REV_2.id()),
            Ok(Compatibility::Identical)
        );
    }
}

#[test]
fn changed_boolean_patterns_break_camera_upgrade() {
    let (mut gateway, transport) = create_gateway_with(SessionConfig::uniform(REV_1.id()));
    let sep = DeviceInstance::Cam(CameraPosition::Sep);

    // same registers at the same addresses, only the patterns differ
    assert_eq!(
        gateway.reconfigure(DeviceClass::CameraModule, REV_2.id()),
        Ok(Compatibility::Breaking {
            register: names::WAKE_UP
        })
    );

    gateway.write_flag(sep, names::WAKE_UP, true).unwrap();
    assert_eq!(transport.word(CAM_SEP_ADDR, 0x01), Some(0x64));

    // a board still answering with the early pattern is not taken as awake
    transport.set_word(CAM_SEP_ADDR, 0x02, 0xAC);
    assert_eq!(
        gateway.read_flag(sep, names::IS_WOKEN_UP),
        Err(Error::InvalidSentinel(0xAC))
    );
}
