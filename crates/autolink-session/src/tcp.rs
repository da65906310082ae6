//! TCP transport for MCUs behind a serial-to-network bridge.
//!
//! The socket is driven by a small tokio runtime owned by the transport;
//! received bytes and failures are forwarded to the session's synchronous
//! event channel.

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::transport::{Transport, TransportEvent};

const READ_BUFFER_SIZE: usize = 1024;

struct Connection {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    stop: Option<oneshot::Sender<()>>,
}

/// Connects to `host:port` on [`Transport::connect`].
pub struct TcpTransport {
    address: String,
    runtime: Runtime,
    connection: Mutex<Option<Connection>>,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("autolink-tcp")
            .enable_all()
            .build()
            .map_err(|e| SessionError::transport(format!("cannot start runtime: {}", e)))?;
        Ok(TcpTransport {
            address: address.into(),
            runtime,
            connection: Mutex::new(None),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for TcpTransport {
    fn connect(&self, events: Sender<TransportEvent>) -> Result<(), SessionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut connection = self.connection.lock();
            if connection.is_some() {
                return Err(SessionError::transport("already open"));
            }
            *connection = Some(Connection {
                tx,
                stop: Some(stop_tx),
            });
        }
        self.runtime
            .spawn(run_connection(self.address.clone(), events, rx, stop_rx));
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<(), SessionError> {
        let connection = self.connection.lock();
        let Some(connection) = connection.as_ref() else {
            return Err(SessionError::transport("not open"));
        };
        connection
            .tx
            .send(data.to_vec())
            .map_err(|_| SessionError::transport("connection closed"))
    }

    fn close(&self) {
        if let Some(mut connection) = self.connection.lock().take() {
            if let Some(stop) = connection.stop.take() {
                let _ = stop.send(());
            }
        }
    }
}

async fn run_connection(
    address: String,
    events: Sender<TransportEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
    mut stop: oneshot::Receiver<()>,
) {
    let stream = tokio::select! {
        _ = &mut stop => return,
        result = TcpStream::connect(&address) => match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!("TCP {}: connect failed: {}", address, e);
                let _ = events.send(TransportEvent::DeviceReady(false));
                return;
            }
        },
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!("TCP {}: set_nodelay: {}", address, e);
    }
    info!("TCP {}: connected", address);
    let _ = events.send(TransportEvent::DeviceReady(true));

    let (mut reader, mut writer) = stream.into_split();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            _ = &mut stop => break,
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    let _ = events.send(TransportEvent::DeviceError("connection closed by peer".into()));
                    break;
                }
                Ok(n) => {
                    let _ = events.send(TransportEvent::Data(buf[..n].to_vec()));
                }
                Err(e) => {
                    let _ = events.send(TransportEvent::DeviceError(e.to_string()));
                    break;
                }
            },
            Some(data) = outgoing.recv() => {
                if let Err(e) = writer.write_all(&data).await {
                    let _ = events.send(TransportEvent::DeviceError(e.to_string()));
                    break;
                }
            }
        }
    }
    debug!("TCP {}: closed", address);
}
