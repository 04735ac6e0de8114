// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `PanaProj` library.
//!
//! This module provides the error hierarchy for failures across the library:
//! configuration, transport communication, and value validation.
//!
//! Note that several protocol conditions are deliberately *not* errors: a
//! reply received with no command pending is discarded, and an unknown input
//! name in a reply resolves to [`Input::None`](crate::types::Input::None).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device configuration is invalid or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred on the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The outbound queue is full and the command was dropped.
    #[error("outbound queue is full ({capacity} commands pending)")]
    QueueFull {
        /// Maximum number of queued commands.
        capacity: usize,
    },
}

/// Errors related to device configuration.
///
/// These are fatal to device construction: a projector is never built from a
/// configuration that produces one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The control method is not supported by this driver.
    #[error("control method '{0}' is not supported, use 'com' or 'tcpip'")]
    UnsupportedControlMethod(String),

    /// A network control method was selected without TCP properties.
    #[error("missing tcpSshProperties for network control")]
    MissingTcpProperties,

    /// A serial control method was selected without serial parameters.
    #[error("missing comParams for serial control")]
    MissingComParams,

    /// The device properties could not be deserialized.
    #[error("invalid properties: {0}")]
    Json(#[from] serde_json::Error),

    /// The serial transport was requested but the `serial` feature is disabled.
    #[error("serial control requires the 'serial' feature")]
    SerialUnavailable,
}

/// Errors related to the byte transport (TCP or serial).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// Connecting timed out.
    #[error("connect timed out after {0} ms")]
    Timeout(u64),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening the serial port failed.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The input name or code is not a known projector input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No input descriptor exists for the given key.
    #[error("no input with key {0}")]
    UnknownInputKey(u8),
}

impl Error {
    /// Returns `true` for conditions that clear up on their own once the
    /// connection recovers: a full outbound queue or a write that lost a
    /// race with a disconnect.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::QueueFull { .. } | Self::Transport(TransportError::NotConnected)
        )
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
