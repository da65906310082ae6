//! Radio sub-link through the fake MCU.

mod common;

use autolink_mcu_protocol::{McuCommand, McuRequest, McuValue};
use autolink_radio_protocol::{RadioCommand, RadioRequest, RadioUpdate, RadioValue};
use autolink_session::{ActionType, ButtonMapping, RadioLinkState, SessionError};
use common::{fast_config, session_with, wait_for, Script};

#[test]
fn test_enable_radio() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();

    assert!(session.enable_radio().unwrap());
    assert_eq!(session.radio_state(), RadioLinkState::Enabled);
    assert!(mcu.requests().contains(&McuRequest::RadioRequestStatus));
}

#[test]
fn test_enable_radio_requires_connection() {
    let (session, _, _) = session_with(Script::default(), fast_config(vec![]));
    assert!(matches!(
        session.enable_radio(),
        Err(SessionError::NotConnected)
    ));
}

#[test]
fn test_radio_status_timeout_leaves_radio_disabled() {
    let script = Script {
        radio_present: None,
        ..Default::default()
    };
    let (session, _, _) = session_with(script, fast_config(vec![]));
    session.connect().unwrap();

    assert!(!session.enable_radio().unwrap());
    assert_eq!(session.radio_state(), RadioLinkState::Disabled);
    assert!(matches!(
        session.radio().power(true),
        Err(SessionError::RadioUnavailable)
    ));
}

#[test]
fn test_radio_absent() {
    let script = Script {
        radio_present: Some(false),
        ..Default::default()
    };
    let (session, _, _) = session_with(script, fast_config(vec![]));
    session.connect().unwrap();
    assert!(!session.enable_radio().unwrap());
    assert_eq!(session.radio_state(), RadioLinkState::Disabled);
}

#[test]
fn test_radio_data_updates_store() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();
    session.enable_radio().unwrap();

    let reply = RadioUpdate::new(RadioCommand::Volume, RadioValue::Int(42))
        .encode_reply()
        .unwrap();
    // the radio stream may be split arbitrarily across RADIO_DATA frames
    let (head, tail) = reply.split_at(3);
    mcu.send(McuCommand::RadioData, McuValue::Bytes(head.to_vec()));
    mcu.send(McuCommand::RadioData, McuValue::Bytes(tail.to_vec()));

    wait_for("volume", || {
        session.radio_store().get_int(RadioCommand::Volume) == Some(42)
    });
}

#[test]
fn test_radio_button_sends_packet() {
    let buttons = vec![ButtonMapping::click(
        800,
        0,
        ActionType::BuiltIn,
        "Radio Volume Up",
    )];
    let (session, mcu, _) = session_with(Script::default(), fast_config(buttons));
    session.connect().unwrap();
    session.enable_radio().unwrap();

    mcu.send(McuCommand::Click, McuValue::Short(800));

    let expected = RadioRequest::Set(RadioCommand::Volume, RadioValue::Int(51))
        .encode()
        .unwrap();
    wait_for("radio packet", || {
        mcu.requests()
            .contains(&McuRequest::RadioSendPacket(expected.clone()))
    });
}

#[test]
fn test_device_error_flags_radio() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();
    session.enable_radio().unwrap();

    mcu.fail("gone");
    wait_for("radio error", || session.radio_state() == RadioLinkState::Error);
}

#[test]
fn test_line_control() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();

    session.radio().set_dtr(true).unwrap();
    session.radio().set_rts(true).unwrap();
    wait_for("lines", || {
        let requests = mcu.requests();
        requests.contains(&McuRequest::RadioSetDtr(true))
            && requests.contains(&McuRequest::RadioSetRts(true))
    });
}
