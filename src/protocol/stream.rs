// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection slot and I/O task shared by the stream based transports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};

use crate::error::TransportError;
use crate::protocol::{EVENT_CHANNEL_CAPACITY, LineGatherer, TransportEvent};

/// Size of the read buffer used by the I/O task.
const READ_BUFFER_SIZE: usize = 1024;

/// The currently open stream, if any.
struct ActiveStream {
    generation: u64,
    writer: mpsc::UnboundedSender<Vec<u8>>,
}

/// Owns at most one open stream and publishes its events.
///
/// Each attached stream gets a generation number so that a stale I/O task
/// finishing after a reconnect cannot tear down the newer connection.
pub(crate) struct StreamLink {
    delimiter: String,
    events: broadcast::Sender<TransportEvent>,
    active: Mutex<Option<ActiveStream>>,
    generation: AtomicU64,
}

impl StreamLink {
    pub(crate) fn new(delimiter: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            delimiter: delimiter.into(),
            events,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.active.lock().is_some()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Takes ownership of an open stream and starts its I/O task.
    pub(crate) fn attach<S>(self: &Arc<Self>, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (writer, outgoing) = mpsc::unbounded_channel();

        {
            let mut active = self.active.lock();
            *active = Some(ActiveStream { generation, writer });
        }
        let _ = self.events.send(TransportEvent::ConnectionChanged(true));

        let link = Arc::downgrade(self);
        let delimiter = self.delimiter.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            run_stream(stream, outgoing, &delimiter, &events).await;
            if let Some(link) = link.upgrade() {
                link.detach(generation);
            }
        });
    }

    /// Closes the open stream, if any.
    ///
    /// Dropping the writer ends the I/O task, which then shuts the stream
    /// down.
    pub(crate) fn close(&self) {
        let closed = self.active.lock().take();
        if closed.is_some() {
            let _ = self.events.send(TransportEvent::ConnectionChanged(false));
        }
    }

    pub(crate) fn send(&self, text: &str) -> Result<(), TransportError> {
        let active = self.active.lock();
        let stream = active.as_ref().ok_or(TransportError::NotConnected)?;
        stream
            .writer
            .send(text.as_bytes().to_vec())
            .map_err(|_| TransportError::NotConnected)
    }

    fn detach(&self, generation: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|s| s.generation == generation) {
            *active = None;
            drop(active);
            let _ = self.events.send(TransportEvent::ConnectionChanged(false));
        }
    }
}

/// Pumps one stream until it closes or its writer is dropped.
async fn run_stream<S>(
    stream: S,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
    delimiter: &str,
    events: &broadcast::Sender<TransportEvent>,
) where
    S: AsyncRead + AsyncWrite + Send,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut gatherer = LineGatherer::new(delimiter);
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    tracing::debug!("Stream closed by peer");
                    break;
                }
                Ok(n) => {
                    for line in gatherer.push(&buf[..n]) {
                        tracing::debug!(line = %line.escape_debug(), "Received line");
                        let _ = events.send(TransportEvent::LineReceived(line));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stream read failed");
                    break;
                }
            },
            bytes = outgoing.recv() => {
                let Some(bytes) = bytes else {
                    break;
                };
                let written = async {
                    writer.write_all(&bytes).await?;
                    writer.flush().await
                };
                if let Err(e) = written.await {
                    tracing::warn!(error = %e, "Stream write failed");
                    break;
                }
            }
        }
    }

    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attach_publishes_lines_and_close() {
        let link = StreamLink::new("\r");
        let mut events = link.subscribe();
        let (client, mut server) = tokio::io::duplex(256);

        link.attach(client);
        assert!(link.is_connected());
        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::ConnectionChanged(true)
        );

        server.write_all(b"NTCONTROL 0\r").await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::LineReceived("NTCONTROL 0".to_string())
        );

        link.send("00QPW\r").unwrap();
        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"00QPW\r");

        drop(server);
        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::ConnectionChanged(false)
        );
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn close_reports_once() {
        let link = StreamLink::new("\r");
        let mut events = link.subscribe();
        let (client, _server) = tokio::io::duplex(64);

        link.attach(client);
        link.close();
        link.close();

        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::ConnectionChanged(true)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::ConnectionChanged(false)
        );
        assert!(matches!(
            link.send("x"),
            Err(TransportError::NotConnected)
        ));
    }
}
