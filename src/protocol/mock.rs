// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::protocol::{EVENT_CHANNEL_CAPACITY, Transport, TransportEvent};

/// Records writes and lets tests inject events.
///
/// `connect` and `disconnect` only count calls; tests drive the connection
/// state explicitly with [`MockTransport::set_connected`].
pub(crate) struct MockTransport {
    connected: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    sent: Mutex<Vec<String>>,
    events: broadcast::Sender<TransportEvent>,
}

impl MockTransport {
    fn with_state(connected: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            connected: AtomicBool::new(connected),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            events,
        })
    }

    pub(crate) fn connected() -> Arc<Self> {
        Self::with_state(true)
    }

    pub(crate) fn disconnected() -> Arc<Self> {
        Self::with_state(false)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Publishes an event as if it came from the wire.
    pub(crate) fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}
