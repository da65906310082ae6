//! Outbound request queue and the worker that drains it.

use std::sync::Arc;

use autolink_frame::FrameFormat;
use autolink_mcu_protocol::McuRequest;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::SessionError;
use crate::transport::{Transport, TransportEvent};

/// Work item for the write worker.
#[derive(Debug)]
pub(crate) enum WriteCommand {
    Send(McuRequest),
    /// Stop after everything queued before it has been written.
    Shutdown,
}

/// Handle for queueing requests to the MCU.
///
/// Requests are accepted only while a write worker is attached, i.e. between
/// the start of a connection attempt and teardown.
#[derive(Debug)]
pub struct Outbox {
    name: String,
    queue: Mutex<Option<Sender<WriteCommand>>>,
}

impl Outbox {
    pub fn new(name: &str) -> Self {
        Outbox {
            name: name.to_string(),
            queue: Mutex::new(None),
        }
    }

    pub(crate) fn attach(&self, queue: Sender<WriteCommand>) {
        *self.queue.lock() = Some(queue);
    }

    pub(crate) fn detach(&self) -> Option<Sender<WriteCommand>> {
        self.queue.lock().take()
    }

    pub fn is_attached(&self) -> bool {
        self.queue.lock().is_some()
    }

    /// Queue a request for the write worker.
    pub fn submit(&self, request: McuRequest) -> Result<(), SessionError> {
        let queue = self.queue.lock();
        let Some(tx) = queue.as_ref() else {
            debug!("Outbox[{}]: dropping {}, not connected", self.name, request.name());
            return Err(SessionError::NotConnected);
        };
        tx.send(WriteCommand::Send(request))
            .map_err(|_| SessionError::NotConnected)
    }
}

/// Body of the write worker thread.
///
/// Write failures are reported to the decode worker as a device error and
/// end the worker.
pub(crate) fn run_writer(
    name: String,
    format: FrameFormat,
    queue: Receiver<WriteCommand>,
    transport: Arc<dyn Transport>,
    events: Sender<TransportEvent>,
) {
    for command in queue.iter() {
        let request = match command {
            WriteCommand::Send(request) => request,
            WriteCommand::Shutdown => break,
        };
        let frame = match request.encode_with(&format) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Writer[{}]: cannot encode {}: {}", name, request.name(), e);
                continue;
            }
        };
        trace!("Writer[{}]: {} ({} bytes)", name, request.name(), frame.len());
        if let Err(e) = transport.write(&frame) {
            warn!("Writer[{}]: write failed: {}", name, e);
            let _ = events.send(TransportEvent::DeviceError(e.to_string()));
            break;
        }
        metrics::counter!("autolink_requests_sent_total", "request" => request.name())
            .increment(1);
    }
    debug!("Writer[{}]: stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_requires_attached_queue() {
        let outbox = Outbox::new("test");
        assert!(matches!(
            outbox.submit(McuRequest::Start),
            Err(SessionError::NotConnected)
        ));

        let (tx, rx) = crossbeam_channel::unbounded();
        outbox.attach(tx);
        assert!(outbox.is_attached());
        outbox.submit(McuRequest::RequestId).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(WriteCommand::Send(McuRequest::RequestId))
        ));

        assert!(outbox.detach().is_some());
        assert!(outbox.submit(McuRequest::Stop).is_err());
    }
}
