// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP transport for NTCONTROL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::protocol::stream::StreamLink;
use crate::protocol::{Transport, TransportEvent};

/// Default time allowed for a TCP connect.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP connection to a projector.
///
/// # Examples
///
/// ```no_run
/// use panaproj_lib::protocol::{TcpTransport, Transport};
///
/// # async fn example() -> Result<(), panaproj_lib::error::TransportError> {
/// let transport = TcpTransport::new("192.168.1.80:1024", "\r");
/// let mut events = transport.subscribe();
/// transport.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct TcpTransport {
    address: String,
    connect_timeout: Duration,
    link: Arc<StreamLink>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl TcpTransport {
    /// Creates a transport for `address` (`host:port`) splitting received
    /// data on `delimiter`. Nothing is connected until [`Transport::connect`].
    #[must_use]
    pub fn new(address: impl Into<String>, delimiter: &str) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            link: StreamLink::new(delimiter),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the remote address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("address", &self.address)
            .field("connected", &self.link.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let _guard = self.connect_lock.lock().await;
        if self.link.is_connected() {
            return Ok(());
        }

        tracing::debug!(address = %self.address, "Connecting");

        // Safe: connect timeouts are seconds, far below u64::MAX milliseconds
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = self.connect_timeout.as_millis() as u64;

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| TransportError::Timeout(timeout_ms))?
            .map_err(|e| TransportError::ConnectionFailed(format!("{}: {e}", self.address)))?;
        stream.set_nodelay(true)?;

        self.link.attach(stream);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.link.close();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.link.send(text)
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.link.subscribe()
    }
}
