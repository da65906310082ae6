//! Handshake and teardown behaviour of `LinkSession` against a fake MCU.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use autolink_mcu_protocol::{McuCommand, McuRequest, McuValue};
use autolink_session::{
    AudioSource, DimmerConfig, DimmerMode, LinkState, SessionError,
};
use common::{fast_config, session_with, wait_for, Script, MCU_ID};

// ============================================================================
// Handshake
// ============================================================================

#[test]
fn test_handshake_success() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    assert_eq!(session.state(), LinkState::Disconnected);

    session.connect().unwrap();

    let status = session.status();
    assert_eq!(status.state, LinkState::Connected);
    assert!(status.connected);
    assert_eq!(status.mcu_id.as_deref(), Some(MCU_ID));
    assert_eq!(status.reason, None);

    wait_for("device init", || mcu.requests().len() == 3);
    assert_eq!(
        mcu.requests(),
        vec![
            McuRequest::Start,
            McuRequest::SetDimmerDigital,
            McuRequest::AudioSourceHd
        ]
    );
}

#[test]
fn test_handshake_initialises_analog_dimmer_and_aux() {
    let mut config = fast_config(vec![]);
    config.dimmer = DimmerConfig {
        mode: DimmerMode::Analog,
        ..Default::default()
    };
    config.audio_source = AudioSource::Aux;
    let (session, mcu, _) = session_with(Script::default(), config);

    session.connect().unwrap();
    wait_for("device init", || mcu.requests().len() == 3);
    assert_eq!(
        &mcu.requests()[1..],
        &[McuRequest::SetDimmerAnalog, McuRequest::AudioSourceAux]
    );
}

#[test]
fn test_started_timeout_ends_in_error() {
    let script = Script {
        answer_start: false,
        ..Default::default()
    };
    let mut config = fast_config(vec![]);
    config.timeouts.start_ack_ms = 100;
    let (session, mcu, _) = session_with(script, config);

    let err = session.connect().unwrap_err();
    assert!(matches!(
        err,
        SessionError::HandshakeTimeout {
            stage: "STARTED",
            ..
        }
    ));
    let status = session.status();
    assert_eq!(status.state, LinkState::Error);
    assert!(!status.connected);
    assert!(status.reason.unwrap().contains("STARTED"));
    assert_eq!(mcu.closes(), 1);
}

#[test]
fn test_device_ready_timeout() {
    let script = Script {
        ready: None,
        ..Default::default()
    };
    let mut config = fast_config(vec![]);
    config.timeouts.connect_ms = 100;
    let (session, _, _) = session_with(script, config);

    let err = session.connect().unwrap_err();
    assert!(matches!(
        err,
        SessionError::HandshakeTimeout {
            stage: "device ready",
            ..
        }
    ));
    assert_eq!(session.state(), LinkState::Error);
}

#[test]
fn test_device_refused() {
    let script = Script {
        ready: Some(false),
        ..Default::default()
    };
    let (session, mcu, _) = session_with(script, fast_config(vec![]));

    assert!(matches!(
        session.connect(),
        Err(SessionError::DeviceNotReady)
    ));
    assert_eq!(session.state(), LinkState::Error);
    assert!(mcu.requests().is_empty());
}

#[test]
fn test_connect_while_connected_is_rejected() {
    let (session, _, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();
    assert!(matches!(
        session.connect(),
        Err(SessionError::AlreadyConnecting(_))
    ));
    assert_eq!(session.state(), LinkState::Connected);
}

#[test]
fn test_reconnect_after_error() {
    let script = Script {
        ready: Some(false),
        ..Default::default()
    };
    let (session, mcu, _) = session_with(script, fast_config(vec![]));
    assert!(session.connect().is_err());
    assert!(session.connect().is_err());
    assert_eq!(mcu.connects(), 2);
}

// ============================================================================
// Disconnect
// ============================================================================

#[test]
fn test_disconnect_sends_stop_and_is_idempotent() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();

    session.disconnect();
    assert_eq!(session.state(), LinkState::Disconnected);
    assert_eq!(mcu.requests().last(), Some(&McuRequest::Stop));
    assert_eq!(mcu.closes(), 1);

    session.disconnect();
    assert_eq!(session.state(), LinkState::Disconnected);
    assert_eq!(mcu.closes(), 1);
}

#[test]
fn test_disconnect_when_never_connected_is_noop() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.disconnect();
    assert_eq!(session.state(), LinkState::Disconnected);
    assert_eq!(mcu.closes(), 0);
}

#[test]
fn test_disconnect_aborts_handshake() {
    let script = Script {
        ready: None,
        ..Default::default()
    };
    let mut config = fast_config(vec![]);
    config.timeouts.connect_ms = 10_000;
    let (session, mcu, _) = session_with(script, config);
    let session = Arc::new(session);

    let connecting = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.connect())
    };
    wait_for("handshake", || {
        session.state() == LinkState::AwaitingDeviceReady
    });

    let started = Instant::now();
    session.disconnect();
    let result = connecting.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(result, Err(SessionError::Aborted)));
    assert_eq!(session.state(), LinkState::Error);
    assert_eq!(mcu.closes(), 1);
    assert!(mcu.requests().is_empty());

    session.disconnect();
    assert_eq!(session.state(), LinkState::Disconnected);
}

#[test]
fn test_device_error_while_connected_skips_stop() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    session.connect().unwrap();
    wait_for("device init", || mcu.requests().len() == 3);

    mcu.fail("cable pulled");
    wait_for("disconnected", || session.state() == LinkState::Disconnected);

    let status = session.status();
    assert!(!status.connected);
    assert_eq!(status.reason.as_deref(), Some("cable pulled"));
    assert!(!mcu.requests().contains(&McuRequest::Stop));
    assert_eq!(mcu.closes(), 1);

    session.disconnect();
    assert_eq!(mcu.closes(), 1);
}

#[test]
fn test_send_requires_connection() {
    let (session, mcu, _) = session_with(Script::default(), fast_config(vec![]));
    assert!(matches!(
        session.send(McuRequest::RequestId),
        Err(SessionError::NotConnected)
    ));

    session.connect().unwrap();
    session.request_id().unwrap();
    let expected = format!("{}-ident", MCU_ID);
    wait_for("ident", || session.mcu_id().as_deref() == Some(expected.as_str()));
    assert!(mcu.requests().contains(&McuRequest::RequestId));
}

#[test]
fn test_events_before_started_are_ignored() {
    let script = Script {
        answer_start: false,
        ..Default::default()
    };
    let mut config = fast_config(vec![autolink_session::ButtonMapping::click(
        300,
        0,
        autolink_session::ActionType::BuiltIn,
        "Mute",
    )]);
    config.timeouts.start_ack_ms = 300;
    let (session, mcu, host) = session_with(script, config);
    let session = Arc::new(session);

    let connecting = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.connect())
    };
    wait_for("start", || mcu.requests().contains(&McuRequest::Start));
    mcu.send(McuCommand::Click, McuValue::Short(300));
    mcu.send(McuCommand::Started, McuValue::Str("late".to_string()));

    connecting.join().unwrap().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(host.calls().is_empty());
    assert_eq!(session.mcu_id().as_deref(), Some("late"));
}
