// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command dispatch.
//!
//! The dispatcher owns all send-side protocol state: the outbound queue, the
//! pending-command slot and the session token. Everything lives behind one
//! mutex so that "check connected, then send or enqueue" and the pending
//! assignment happen atomically.
//!
//! # Correlation
//!
//! Only the most recently transmitted command is remembered. A reply is
//! interpreted against that command's [`CommandCategory`], not against a
//! request id, so callers must not pipeline commands that expect replies.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::CommandCategory;
use crate::error::{Error, Result};
use crate::protocol::{Authenticator, SessionToken, Transport};

/// Default number of commands held while disconnected.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// The command most recently transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    text: String,
    category: CommandCategory,
}

impl PendingCommand {
    /// Records `text` as sent.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let category = CommandCategory::of(&text);
        Self { text, category }
    }

    /// Returns the raw command text (without session token).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the category used to interpret the reply.
    #[must_use]
    pub fn category(&self) -> CommandCategory {
        self.category
    }
}

/// Bounded FIFO of commands awaiting a connection.
///
/// When full, new commands are rejected rather than waited on: callers of the
/// public intents must never block.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    items: VecDeque<String>,
    capacity: usize,
}

impl OutboundQueue {
    /// Creates an empty queue holding at most `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a command.
    ///
    /// # Errors
    ///
    /// Returns `Error::QueueFull` if the queue is at capacity.
    pub fn push(&mut self, text: impl Into<String>) -> Result<()> {
        if self.items.len() >= self.capacity {
            return Err(Error::QueueFull {
                capacity: self.capacity,
            });
        }
        self.items.push_back(text.into());
        Ok(())
    }

    /// Removes the oldest command.
    pub fn pop(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// How commands reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Queue while disconnected and drain everything as soon as the link is
    /// up; no greeting and no authentication (serial).
    Direct,
    /// Queue while disconnected and drain one command per greeting (TCP).
    Handshake,
}

/// What happened to a command handed to [`Dispatcher::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The command was written to the transport.
    Sent,
    /// The transport was disconnected; the command waits in the queue.
    Queued,
}

#[derive(Debug, Default)]
struct DispatchState {
    pending: Option<PendingCommand>,
    token: SessionToken,
    queue: OutboundQueue,
    connect_requested: bool,
}

impl DispatchState {
    fn transmit(&mut self, transport: &dyn Transport, text: String) -> Result<()> {
        let wire = self.token.apply(&text);
        tracing::debug!(
            command = %text.escape_debug(),
            authenticated = !self.token.is_empty(),
            "Sending command"
        );
        self.pending = Some(PendingCommand::new(text));
        transport.send_text(&wire)?;
        Ok(())
    }

    /// Sends every queued command in order if the transport is open. Stops at
    /// the first refused write; that command is lost.
    fn drain(&mut self, transport: &dyn Transport) {
        if !transport.is_connected() {
            return;
        }
        while let Some(text) = self.queue.pop() {
            if let Err(e) = self.transmit(transport, text) {
                tracing::warn!(error = %e, "Sending queued command failed");
                return;
            }
        }
    }
}

/// Serializes outbound commands onto a transport.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    mode: DispatchMode,
    authenticator: Authenticator,
    state: Arc<Mutex<DispatchState>>,
}

impl Dispatcher {
    /// Creates a dispatcher writing to `transport`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        mode: DispatchMode,
        authenticator: Authenticator,
    ) -> Self {
        Self::with_queue_capacity(transport, mode, authenticator, DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a dispatcher with a custom queue capacity.
    #[must_use]
    pub fn with_queue_capacity(
        transport: Arc<dyn Transport>,
        mode: DispatchMode,
        authenticator: Authenticator,
        capacity: usize,
    ) -> Self {
        Self {
            transport,
            mode,
            authenticator,
            state: Arc::new(Mutex::new(DispatchState {
                queue: OutboundQueue::new(capacity),
                ..DispatchState::default()
            })),
        }
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Sends a command now, or queues it and requests a connection.
    ///
    /// # Errors
    ///
    /// Returns `Error::QueueFull` if the command had to be queued and the
    /// queue is full, or `Error::Transport` if the write was refused.
    pub fn send(&self, text: &str) -> Result<SendOutcome> {
        let mut state = self.state.lock();

        if self.transport.is_connected() {
            state.transmit(self.transport.as_ref(), text.to_string())?;
            return Ok(SendOutcome::Sent);
        }

        state.queue.push(text)?;
        tracing::debug!(
            command = %text.escape_debug(),
            queued = state.queue.len(),
            "Transport disconnected, command queued"
        );

        if !state.connect_requested {
            state.connect_requested = true;
            drop(state);
            self.request_connect();
        }

        Ok(SendOutcome::Queued)
    }

    /// Sends the oldest queued command, if any.
    ///
    /// Returns `true` if a command was sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the write was refused.
    pub fn dequeue_and_send(&self) -> Result<bool> {
        let mut state = self.state.lock();
        let Some(text) = state.queue.pop() else {
            tracing::debug!("Outbound queue is empty");
            return Ok(false);
        };
        state.transmit(self.transport.as_ref(), text)?;
        Ok(true)
    }

    /// Completes the handshake for a challenge and sends the next queued
    /// command.
    ///
    /// A missing random value is treated like an unauthenticated greeting.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the write was refused.
    pub fn on_challenge(&self, random: Option<&str>) -> Result<bool> {
        let token = match random {
            Some(random) => self.authenticator.respond(random),
            None => {
                tracing::warn!("Challenge without random value, continuing unauthenticated");
                SessionToken::empty()
            }
        };
        self.state.lock().token = token;
        self.dequeue_and_send()
    }

    /// Completes the handshake without a token and sends the next queued
    /// command.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the write was refused.
    pub fn on_no_challenge(&self) -> Result<bool> {
        self.state.lock().token.clear();
        self.dequeue_and_send()
    }

    /// Reacts to a transport connectivity change.
    ///
    /// A disconnect invalidates the session token; if commands are still
    /// queued a new connection is requested. In direct mode a connect sends
    /// everything queued, since no greeting will follow.
    pub fn on_connection_changed(&self, connected: bool) {
        let mut state = self.state.lock();
        state.connect_requested = false;

        if connected {
            if self.mode == DispatchMode::Direct {
                state.drain(self.transport.as_ref());
            }
            return;
        }

        state.token.clear();
        if !state.queue.is_empty() {
            state.connect_requested = true;
            tracing::debug!(
                queued = state.queue.len(),
                "Commands still queued, reconnecting"
            );
            drop(state);
            self.request_connect();
        }
    }

    /// Returns the pending command.
    #[must_use]
    pub fn pending(&self) -> Option<PendingCommand> {
        self.state.lock().pending.clone()
    }

    /// Returns the current session token.
    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.state.lock().token.clone()
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Asks the transport to connect in the background.
    ///
    /// A failed attempt releases the latch so the next send tries again. In
    /// direct mode a successful attempt drains the queue, covering commands
    /// queued after the connection event was already handled.
    fn request_connect(&self) {
        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let mode = self.mode;
        tokio::spawn(async move {
            match transport.connect().await {
                Ok(()) if mode == DispatchMode::Direct => {
                    let mut state = state.lock();
                    state.connect_requested = false;
                    state.drain(transport.as_ref());
                }
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Connect request failed");
                    state.lock().connect_requested = false;
                }
            }
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("pending", &state.pending)
            .field("queued", &state.queue.len())
            .finish_non_exhaustive()
    }
}
