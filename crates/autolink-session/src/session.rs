//! Connection lifecycle for one MCU link.
//!
//! ```text
//! Disconnected -> Connecting -> AwaitingDeviceReady -> AwaitingStartAck -> Connected
//!       ^                                                                     |
//!       +------------------------ Disconnecting <-----------------------------+
//! ```
//!
//! Any handshake failure, timeout or abort ends in `Error`. A transport
//! failure while connected goes through `Error` and `Disconnecting` to
//! `Disconnected` without writing to the device again.
//!
//! Each connection runs two workers: a decode worker that consumes
//! transport events in arrival order, and a write worker that drains the
//! outbound queue. Actions run on their own threads.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use autolink_frame::FrameFormat;
use autolink_mcu_protocol::{McuCommand, McuDecoder, McuMessage, McuRequest};
use autolink_radio_protocol::{RadioKeyStore, RadioSnapshot};
use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, info, trace, warn};

use crate::actions::{ActionContext, ActionHost};
use crate::config::SessionConfig;
use crate::dimmer::DimmerMode;
use crate::dispatcher::CommandDispatcher;
use crate::error::SessionError;
use crate::outbox::{run_writer, Outbox, WriteCommand};
use crate::radio_link::{RadioControl, RadioLink, RadioLinkState};
use crate::transport::{Transport, TransportEvent};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    AwaitingDeviceReady,
    AwaitingStartAck,
    Connected,
    Disconnecting,
    Error,
}

impl LinkState {
    /// Whether a connect handshake is in progress.
    pub fn is_handshaking(&self) -> bool {
        matches!(
            self,
            LinkState::Connecting | LinkState::AwaitingDeviceReady | LinkState::AwaitingStartAck
        )
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Snapshot returned by [`LinkSession::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: LinkState,
    pub connected: bool,
    /// Identifier from STARTED or IDENT.
    pub mcu_id: Option<String>,
    /// Last connection-level failure.
    pub reason: Option<String>,
}

#[derive(Debug)]
struct Link {
    state: LinkState,
    device_ready: Option<bool>,
    abort: bool,
    failure: Option<String>,
    device_error: bool,
    mcu_id: Option<String>,
    reason: Option<String>,
}

impl Link {
    fn new() -> Self {
        Link {
            state: LinkState::Disconnected,
            device_ready: None,
            abort: false,
            failure: None,
            device_error: false,
            mcu_id: None,
            reason: None,
        }
    }

    fn begin_attempt(&mut self) {
        self.device_ready = None;
        self.abort = false;
        self.failure = None;
        self.device_error = false;
        self.mcu_id = None;
        self.reason = None;
    }

    /// Error for an aborted or failed handshake, if either happened.
    fn interrupted(&self) -> Result<(), SessionError> {
        if self.abort {
            return Err(SessionError::Aborted);
        }
        if let Some(reason) = &self.failure {
            return Err(SessionError::Transport(reason.clone()));
        }
        Ok(())
    }
}

struct Workers {
    shutdown: Sender<()>,
    decode: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

// ============================================================================
// Shared Session State
// ============================================================================

struct Shared {
    name: String,
    config: SessionConfig,
    format: FrameFormat,
    transport: Arc<dyn Transport>,
    link: Mutex<Link>,
    changed: Condvar,
    workers: Mutex<Option<Workers>>,
    outbox: Arc<Outbox>,
    dispatcher: CommandDispatcher,
    radio: Arc<RadioLink>,
}

impl Shared {
    fn set_state(&self, link: &mut Link, state: LinkState) {
        if link.state != state {
            debug!("LinkSession[{}]: {} -> {}", self.name, link.state, state);
            link.state = state;
        }
        self.changed.notify_all();
    }

    /// Block until `done` holds or `timeout` passes. Every wake-up is rechecked.
    fn wait_until(
        &self,
        link: &mut MutexGuard<'_, Link>,
        timeout: Duration,
        done: impl Fn(&Link) -> bool,
    ) {
        let deadline = Instant::now() + timeout;
        while !done(&**link) {
            if self.changed.wait_until(link, deadline).timed_out() {
                break;
            }
        }
    }

    fn spawn_workers(self: &Arc<Self>) -> Result<Sender<TransportEvent>, SessionError> {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let writer = {
            let name = self.name.clone();
            let format = self.format;
            let transport = Arc::clone(&self.transport);
            let events = events_tx.clone();
            thread::Builder::new()
                .name(format!("{}-write", self.name))
                .spawn(move || run_writer(name, format, queue_rx, transport, events))
                .map_err(|e| SessionError::transport(format!("cannot start writer: {}", e)))?
        };
        let decode = {
            let shared = Arc::clone(self);
            thread::Builder::new()
                .name(format!("{}-decode", self.name))
                .spawn(move || shared.run_decoder(events_rx, shutdown_rx))
                .map_err(|e| SessionError::transport(format!("cannot start decoder: {}", e)))?
        };

        self.outbox.attach(queue_tx);
        *self.workers.lock() = Some(Workers {
            shutdown: shutdown_tx,
            decode: Some(decode),
            writer: Some(writer),
        });
        Ok(events_tx)
    }

    /// Stop the workers and close the transport.
    ///
    /// With `send_stop`, STOP is written and given time to reach the device
    /// before the transport closes.
    fn teardown(&self, send_stop: bool) {
        let Some(mut workers) = self.workers.lock().take() else {
            return;
        };
        if let Some(queue) = self.outbox.detach() {
            if send_stop {
                let _ = queue.send(WriteCommand::Send(McuRequest::Stop));
            }
            let _ = queue.send(WriteCommand::Shutdown);
        }
        if let Some(writer) = workers.writer.take() {
            join_worker(&self.name, writer);
        }
        if send_stop {
            thread::sleep(self.config.timeouts.stop_settle());
        }
        self.transport.close();

        let _ = workers.shutdown.send(());
        if let Some(decode) = workers.decode.take() {
            // the decode worker tears down after a device error and exits by itself
            if decode.thread().id() != thread::current().id() {
                join_worker(&self.name, decode);
            }
        }
        self.radio.reset();
    }

    fn run_decoder(&self, events: Receiver<TransportEvent>, shutdown: Receiver<()>) {
        let mut decoder = McuDecoder::with_format(self.format);
        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(events) -> event => match event {
                    Ok(TransportEvent::Data(bytes)) => {
                        trace!("LinkSession[{}]: rx {} bytes", self.name, bytes.len());
                        for message in decoder.feed(&bytes) {
                            self.handle_message(message);
                        }
                    }
                    Ok(TransportEvent::DeviceReady(ready)) => self.handle_device_ready(ready),
                    Ok(TransportEvent::DeviceError(reason)) => self.handle_device_error(reason),
                    Err(_) => break,
                },
            }
        }
        let stats = decoder.frame_stats();
        debug!(
            "LinkSession[{}]: decoder stopped ({} frames, {} bad checksums, {} truncated, {} rejected)",
            self.name,
            stats.frames,
            stats.checksum_errors,
            stats.truncated,
            decoder.rejected()
        );
    }

    fn handle_message(&self, message: McuMessage) {
        metrics::counter!("autolink_mcu_messages_total", "command" => message.command.name())
            .increment(1);
        match message.command {
            McuCommand::Started => {
                let id = message.value.as_str().unwrap_or_default().to_string();
                self.handle_started(id);
            }
            McuCommand::Ident => {
                let id = message.value.as_str().unwrap_or_default().to_string();
                info!("LinkSession[{}]: MCU id {}", self.name, id);
                self.link.lock().mcu_id = Some(id);
            }
            McuCommand::RadioStatus => {
                if let Some(present) = message.value.as_bool() {
                    self.radio.handle_status(present);
                }
            }
            McuCommand::RadioData => {
                if let Some(data) = message.value.as_bytes() {
                    self.radio.handle_data(data);
                }
            }
            McuCommand::Log => {
                info!(target: "mcu", "{}", message.value);
            }
            _ => {
                if self.link.lock().state != LinkState::Connected {
                    debug!("LinkSession[{}]: {} before STARTED, ignored", self.name, message.command);
                    return;
                }
                self.dispatcher.dispatch(&message);
            }
        }
    }

    fn handle_started(&self, id: String) {
        let mut link = self.link.lock();
        link.mcu_id = Some(id);
        if link.state != LinkState::AwaitingStartAck || link.abort {
            debug!("LinkSession[{}]: unexpected STARTED in {}", self.name, link.state);
            return;
        }

        let context = self.dispatcher.context();
        let dimmer = if context.dimmer().mode() == DimmerMode::Analog {
            McuRequest::SetDimmerAnalog
        } else {
            McuRequest::SetDimmerDigital
        };
        for request in [dimmer, context.audio_source().request()] {
            if let Err(e) = self.outbox.submit(request) {
                warn!("LinkSession[{}]: cannot initialise device: {}", self.name, e);
            }
        }
        self.set_state(&mut link, LinkState::Connected);
    }

    fn handle_device_ready(&self, ready: bool) {
        let mut link = self.link.lock();
        if link.state.is_handshaking() {
            link.device_ready = Some(ready);
            self.changed.notify_all();
        } else if link.state == LinkState::Connected && !ready {
            drop(link);
            self.handle_device_error("device closed".to_string());
        } else {
            debug!("LinkSession[{}]: device ready({}) in {}", self.name, ready, link.state);
        }
    }

    fn handle_device_error(&self, reason: String) {
        let mut link = self.link.lock();
        link.device_error = true;
        link.reason = Some(reason.clone());
        let state = link.state;
        match state {
            state if state.is_handshaking() => {
                link.failure = Some(reason);
                self.changed.notify_all();
            }
            LinkState::Connected => {
                error!("LinkSession[{}]: device error: {}", self.name, reason);
                self.set_state(&mut link, LinkState::Error);
                self.set_state(&mut link, LinkState::Disconnecting);
                drop(link);

                self.radio.flag_error();
                self.teardown(false);

                let mut link = self.link.lock();
                self.set_state(&mut link, LinkState::Disconnected);
            }
            state => debug!("LinkSession[{}]: device error in {}: {}", self.name, state, reason),
        }
    }

    fn handshake(self: &Arc<Self>) -> Result<(), SessionError> {
        let events = self.spawn_workers()?;
        self.transport.connect(events)?;

        let timeout = self.config.timeouts.connect();
        {
            let mut link = self.link.lock();
            link.interrupted()?;
            self.set_state(&mut link, LinkState::AwaitingDeviceReady);
            self.wait_until(&mut link, timeout, |l| {
                l.device_ready.is_some() || l.abort || l.failure.is_some()
            });
            link.interrupted()?;
            match link.device_ready {
                Some(true) => {}
                Some(false) => return Err(SessionError::DeviceNotReady),
                None => {
                    return Err(SessionError::HandshakeTimeout {
                        stage: "device ready",
                        timeout,
                    })
                }
            }
            self.set_state(&mut link, LinkState::AwaitingStartAck);
        }

        self.outbox.submit(McuRequest::Start)?;

        let timeout = self.config.timeouts.start_ack();
        let mut link = self.link.lock();
        self.wait_until(&mut link, timeout, |l| {
            l.state != LinkState::AwaitingStartAck || l.abort || l.failure.is_some()
        });
        link.interrupted()?;
        match link.state {
            LinkState::Connected => Ok(()),
            LinkState::AwaitingStartAck => Err(SessionError::HandshakeTimeout {
                stage: "STARTED",
                timeout,
            }),
            _ => Err(SessionError::Aborted),
        }
    }

    fn fail_handshake(&self, err: &SessionError) {
        warn!("LinkSession[{}]: connect failed: {}", self.name, err);
        self.teardown(false);
        let mut link = self.link.lock();
        if link.state.is_handshaking() {
            link.reason = Some(err.to_string());
            self.set_state(&mut link, LinkState::Error);
        }
    }
}

fn join_worker(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("LinkSession[{}]: worker panicked", name);
    }
}

// ============================================================================
// Link Session
// ============================================================================

/// One connection to an MCU.
///
/// `connect` blocks the caller until the handshake finishes. `disconnect`
/// may be called from any thread at any time, including during `connect`.
pub struct LinkSession {
    shared: Arc<Shared>,
    radio: RadioControl,
}

impl LinkSession {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        host: Arc<dyn ActionHost>,
    ) -> Self {
        let name = config.name.clone();
        let outbox = Arc::new(Outbox::new(&name));
        let radio_link = Arc::new(RadioLink::new(&name, &config.radio));
        let radio = RadioControl::new(Arc::clone(&radio_link), Arc::clone(&outbox));
        let context = Arc::new(ActionContext::new(
            &config,
            host,
            Arc::clone(&outbox),
            radio.clone(),
        ));
        let dispatcher = CommandDispatcher::new(
            &name,
            config.buttons.clone(),
            config.broadcast_custom_commands,
            context,
        );
        let format = FrameFormat::MCU.with_checksum_seed(config.checksum_seed);

        LinkSession {
            shared: Arc::new(Shared {
                name,
                config,
                format,
                transport,
                link: Mutex::new(Link::new()),
                changed: Condvar::new(),
                workers: Mutex::new(None),
                outbox,
                dispatcher,
                radio: radio_link,
            }),
            radio,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> LinkState {
        self.shared.link.lock().state
    }

    pub fn status(&self) -> ConnectionStatus {
        let link = self.shared.link.lock();
        ConnectionStatus {
            state: link.state,
            connected: link.state == LinkState::Connected,
            mcu_id: link.mcu_id.clone(),
            reason: link.reason.clone(),
        }
    }

    /// Open the transport and run the START/STARTED handshake.
    ///
    /// Allowed from `Disconnected` or `Error`. On failure the session rests
    /// in `Error` and the reason is kept in [`status`](Self::status).
    pub fn connect(&self) -> Result<(), SessionError> {
        let shared = &self.shared;
        {
            let mut link = shared.link.lock();
            match link.state {
                LinkState::Disconnected | LinkState::Error => {}
                LinkState::Connected => return Err(SessionError::AlreadyConnecting("connected")),
                LinkState::Disconnecting => {
                    return Err(SessionError::AlreadyConnecting("disconnecting"))
                }
                _ => return Err(SessionError::AlreadyConnecting("connecting")),
            }
            link.begin_attempt();
            shared.set_state(&mut link, LinkState::Connecting);
        }
        info!("LinkSession[{}]: connecting", shared.name);

        match shared.handshake() {
            Ok(()) => {
                let id = shared.link.lock().mcu_id.clone().unwrap_or_default();
                info!("LinkSession[{}]: connected to {:?}", shared.name, id);
                Ok(())
            }
            Err(e) => {
                shared.fail_handshake(&e);
                Err(e)
            }
        }
    }

    /// Close the connection.
    ///
    /// A no-op when already disconnected. During a handshake the attempt is
    /// aborted and the session ends in `Error`.
    pub fn disconnect(&self) {
        let shared = &self.shared;
        let mut link = shared.link.lock();
        loop {
            let state = link.state;
            match state {
                LinkState::Disconnected => return,
                LinkState::Connected => break,
                LinkState::Error => {
                    drop(link);
                    shared.teardown(false);
                    let mut link = shared.link.lock();
                    shared.set_state(&mut link, LinkState::Disconnected);
                    return;
                }
                LinkState::Disconnecting => shared.changed.wait(&mut link),
                _ => {
                    if !link.abort {
                        info!("LinkSession[{}]: aborting connect", shared.name);
                        link.abort = true;
                        shared.changed.notify_all();
                    }
                    while link.state.is_handshaking() {
                        shared.changed.wait(&mut link);
                    }
                    return;
                }
            }
        }

        shared.set_state(&mut link, LinkState::Disconnecting);
        let send_stop = !link.device_error;
        drop(link);
        info!("LinkSession[{}]: disconnecting", shared.name);

        shared.teardown(send_stop);

        let mut link = shared.link.lock();
        shared.set_state(&mut link, LinkState::Disconnected);
    }

    /// Queue a request. Only allowed while connected.
    pub fn send(&self, request: McuRequest) -> Result<(), SessionError> {
        if self.state() != LinkState::Connected {
            return Err(SessionError::NotConnected);
        }
        self.shared.outbox.submit(request)
    }

    /// Ask the MCU to identify itself; the answer arrives as IDENT.
    pub fn request_id(&self) -> Result<(), SessionError> {
        self.send(McuRequest::RequestId)
    }

    pub fn mcu_id(&self) -> Option<String> {
        self.shared.link.lock().mcu_id.clone()
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.shared.dispatcher
    }

    pub fn context(&self) -> &Arc<ActionContext> {
        self.shared.dispatcher.context()
    }

    // ------------------------------------------------------------------------
    // Radio
    // ------------------------------------------------------------------------

    /// Ask the MCU whether a radio is attached and wait for the answer.
    ///
    /// Returns `Ok(false)` when the MCU reports no radio or does not answer
    /// within the radio status timeout.
    pub fn enable_radio(&self) -> Result<bool, SessionError> {
        if self.state() != LinkState::Connected {
            return Err(SessionError::NotConnected);
        }
        let radio = &self.shared.radio;
        radio.begin_status_request();
        if let Err(e) = self.shared.outbox.submit(McuRequest::RadioRequestStatus) {
            radio.reset();
            return Err(e);
        }
        let enabled = radio.wait_for_status(self.shared.config.timeouts.radio_status());
        info!(
            "LinkSession[{}]: radio {}",
            self.shared.name,
            if enabled { "enabled" } else { "unavailable" }
        );
        Ok(enabled)
    }

    pub fn disable_radio(&self) {
        self.shared.radio.disable();
    }

    pub fn radio_state(&self) -> RadioLinkState {
        self.shared.radio.state()
    }

    pub fn radio(&self) -> &RadioControl {
        &self.radio
    }

    pub fn radio_store(&self) -> &Arc<RadioKeyStore> {
        self.shared.radio.store()
    }

    /// Radio settings worth persisting for the next run.
    pub fn radio_snapshot(&self) -> RadioSnapshot {
        self.radio_store().snapshot()
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
