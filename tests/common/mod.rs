//! Common test utilities and fixtures

#![allow(dead_code)]

pub mod mock_transport;

pub use mock_transport::{MockFault, MockTransport, Operation};

use avionics_intranet::{AddressDirectory, Gateway, MapResolver, SessionConfig};

pub const DPR_ETH_ADDR: u8 = 0x20;
pub const DPR_LOX_ADDR: u8 = 0x21;
pub const PRB_ADDR: u8 = 0x30;
pub const TRB_ADDR: u8 = 0x40;
pub const CAM_SEP_ADDR: u8 = 0x50;

/// Gateway over the flight address table and the latest maps, plus a handle
/// onto the mock transport it owns
pub fn create_gateway() -> (Gateway<'static, MockTransport>, MockTransport) {
    create_gateway_with(SessionConfig::default())
}

pub fn create_gateway_with(
    config: SessionConfig,
) -> (Gateway<'static, MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let gateway = Gateway::new(
        transport.clone(),
        AddressDirectory::flight().expect("flight table is valid"),
        MapResolver::shipped(config).expect("shipped maps are valid"),
    );
    (gateway, transport)
}
