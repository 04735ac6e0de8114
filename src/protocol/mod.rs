// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol engine for communicating with Panasonic projectors.
//!
//! This module contains everything between the typed commands and the
//! bytes on the wire:
//!
//! - [`Transport`]: the byte transport contract, with [`TcpTransport`] and
//!   [`SerialTransport`] (feature `serial`) implementations
//! - [`LineGatherer`]: splits the received byte stream into delimited lines
//! - [`Authenticator`] and [`SessionToken`]: the NTCONTROL challenge/response
//! - [`Dispatcher`]: outbound queue and the single pending-command slot
//! - [`classify`]: interpretation of received lines
//!
//! # NTCONTROL
//!
//! Over TCP the projector greets every new connection with either
//! `NTCONTROL 1 <random>` (authentication required) or `NTCONTROL 0`. A
//! single command is then sent, the reply read, and the projector closes the
//! connection. Commands issued while disconnected are therefore queued and
//! drained one per connection.

mod auth;
mod classifier;
mod dispatcher;
mod line;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "serial")]
mod serial;
mod stream;
mod tcp;

pub use auth::{Authenticator, Credentials, SessionToken};
pub use classifier::{Reply, classify};
pub use dispatcher::{
    DEFAULT_QUEUE_CAPACITY, DispatchMode, Dispatcher, OutboundQueue, PendingCommand, SendOutcome,
};
pub use line::LineGatherer;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::TransportError;

/// Capacity of the transport event channel.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

/// An event raised by a transport.
///
/// Events are delivered in the order they happened on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One complete line was received, without its delimiter.
    LineReceived(String),
    /// The connection state changed; `true` when now connected.
    ConnectionChanged(bool),
}

/// A byte transport to a projector.
///
/// Implementations own the connection and a background task that reads
/// from it. Received data is split into lines on the transport delimiter and
/// published as [`TransportEvent::LineReceived`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens the connection. Succeeds immediately if already connected.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the connection cannot be established.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Closes the connection. Does nothing if not connected.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if closing fails.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Returns `true` while the connection is open.
    fn is_connected(&self) -> bool;

    /// Hands text to the transport for writing.
    ///
    /// This never blocks; the bytes are written by the transport's own task.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotConnected` if there is no open connection.
    fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Subscribes to transport events.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}
