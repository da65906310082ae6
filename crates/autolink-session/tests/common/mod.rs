//! Scripted fake MCU used by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use autolink_frame::{FrameFormat, StuffedFrameDecoder};
use autolink_mcu_protocol::{McuCommand, McuMessage, McuRequest, McuValue};
use autolink_session::{
    ButtonMapping, LinkSession, RecordingHost, SessionConfig, SessionError, Transport,
    TransportEvent,
};
use crossbeam_channel::Sender;
use parking_lot::Mutex;

pub const MCU_ID: &str = "FAKE-MCU-1";

/// How the fake device answers.
#[derive(Debug, Clone)]
pub struct Script {
    /// Readiness reported on connect; `None` never reports.
    pub ready: Option<bool>,
    /// Answer START with STARTED.
    pub answer_start: bool,
    /// Answer RADIO_REQUEST_STATUS; `None` stays silent.
    pub radio_present: Option<bool>,
}

impl Default for Script {
    fn default() -> Self {
        Script {
            ready: Some(true),
            answer_start: true,
            radio_present: Some(true),
        }
    }
}

#[derive(Default)]
struct FakeState {
    events: Option<Sender<TransportEvent>>,
    requests: Vec<McuRequest>,
    connects: usize,
    closes: usize,
}

pub struct FakeMcu {
    script: Script,
    state: Mutex<FakeState>,
    decoder: Mutex<StuffedFrameDecoder>,
}

impl FakeMcu {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(FakeMcu {
            script,
            state: Mutex::new(FakeState::default()),
            decoder: Mutex::new(StuffedFrameDecoder::new(FrameFormat::MCU)),
        })
    }

    /// Raw bytes from the device.
    pub fn inject(&self, bytes: &[u8]) {
        self.emit(TransportEvent::Data(bytes.to_vec()));
    }

    /// A complete message from the device.
    pub fn send(&self, command: McuCommand, value: McuValue) {
        let frame = McuMessage::new(command, value).encode().unwrap();
        self.inject(&frame);
    }

    /// Simulate the cable being pulled.
    pub fn fail(&self, reason: &str) {
        self.emit(TransportEvent::DeviceError(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<McuRequest> {
        self.state.lock().requests.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    fn emit(&self, event: TransportEvent) {
        if let Some(events) = self.state.lock().events.as_ref() {
            let _ = events.send(event);
        }
    }

    fn answer(&self, request: &McuRequest) {
        match request {
            McuRequest::Start if self.script.answer_start => {
                self.send(McuCommand::Started, McuValue::Str(MCU_ID.to_string()));
            }
            McuRequest::RequestId => {
                self.send(McuCommand::Ident, McuValue::Str(format!("{}-ident", MCU_ID)));
            }
            McuRequest::RadioRequestStatus => {
                if let Some(present) = self.script.radio_present {
                    self.send(McuCommand::RadioStatus, McuValue::Bool(present));
                }
            }
            _ => {}
        }
    }
}

impl Transport for FakeMcu {
    fn connect(&self, events: Sender<TransportEvent>) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.connects += 1;
        if let Some(ready) = self.script.ready {
            let _ = events.send(TransportEvent::DeviceReady(ready));
        }
        state.events = Some(events);
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<(), SessionError> {
        let bodies = self.decoder.lock().feed(data);
        for body in bodies {
            let request = McuRequest::decode(&body).map_err(SessionError::from)?;
            self.state.lock().requests.push(request.clone());
            self.answer(&request);
        }
        Ok(())
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closes += 1;
        state.events = None;
    }
}

/// Config with short timeouts and intervals.
pub fn fast_config(buttons: Vec<ButtonMapping>) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.name = "fake".to_string();
    config.timeouts.connect_ms = 500;
    config.timeouts.start_ack_ms = 500;
    config.timeouts.radio_status_ms = 200;
    config.timeouts.stop_settle_ms = 10;
    config.repeat.volume_interval_ms = 20;
    config.repeat.media_skip_interval_ms = 20;
    config.repeat.media_seek_interval_ms = 20;
    config.repeat.radio_step_interval_ms = 20;
    config.buttons = buttons;
    config
}

pub fn session_with(
    script: Script,
    config: SessionConfig,
) -> (LinkSession, Arc<FakeMcu>, Arc<RecordingHost>) {
    let mcu = FakeMcu::new(script);
    let host = Arc::new(RecordingHost::new());
    let session = LinkSession::new(config, mcu.clone(), host.clone());
    (session, mcu, host)
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}
