// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RS-232 transport.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_serial::SerialPortBuilderExt;

use crate::error::TransportError;
use crate::protocol::stream::StreamLink;
use crate::protocol::{Transport, TransportEvent};

/// Serial port connection to a projector.
///
/// Panasonic projectors use 8N1 framing; only the baud rate is configurable.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    link: Arc<StreamLink>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl SerialTransport {
    /// Creates a transport for the serial device at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, baud_rate: u32, delimiter: &str) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            link: StreamLink::new(delimiter),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the serial device path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("connected", &self.link.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let _guard = self.connect_lock.lock().await;
        if self.link.is_connected() {
            return Ok(());
        }

        tracing::debug!(path = %self.path, baud_rate = self.baud_rate, "Opening serial port");

        let port = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()?;

        self.link.attach(port);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_port_fails_to_open() {
        let transport = SerialTransport::new("/dev/does-not-exist-panaproj", 9600, "\u{3}");
        assert!(transport.connect().await.is_err());
        assert!(!transport.is_connected());
    }
}
