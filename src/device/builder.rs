// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector builder.

use std::sync::Arc;
use std::time::Duration;

use crate::command::{CommandBuilder, NetworkCommandBuilder, SerialCommandBuilder};
use crate::config::{ControlMethod, ProjectorConfig};
use crate::device::{Projector, Timings};
use crate::error::{ConfigError, Result};
use crate::monitor::{CommunicationMonitor, DEFAULT_ERROR_THRESHOLD, DEFAULT_WARNING_THRESHOLD};
use crate::protocol::{
    Authenticator, Credentials, DEFAULT_QUEUE_CAPACITY, DispatchMode, Dispatcher, TcpTransport,
    Transport,
};

/// Builder for creating [`Projector`]s.
///
/// The control method in the configuration selects the framing, the
/// transport and whether NTCONTROL authentication is used:
///
/// | method  | framing                 | transport          | dispatch    |
/// |---------|-------------------------|--------------------|-------------|
/// | `com`   | [`SerialCommandBuilder`]  | `SerialTransport`  | direct      |
/// | `tcpip` | [`NetworkCommandBuilder`] | [`TcpTransport`]   | handshake   |
///
/// # Examples
///
/// ```
/// use panaproj_lib::{Projector, ProjectorConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> panaproj_lib::Result<()> {
/// let config = ProjectorConfig::tcp("192.168.1.80")
///     .with_credentials("admin1", "panasonic")
///     .with_warmup_seconds(30);
///
/// let projector = Projector::builder("main-projector", config).build()?;
/// assert!(!projector.is_connected());
/// # Ok(())
/// # }
/// ```
pub struct ProjectorBuilder {
    key: String,
    config: ProjectorConfig,
    transport: Option<Arc<dyn Transport>>,
    queue_capacity: usize,
    warning_threshold: Duration,
    error_threshold: Duration,
}

impl ProjectorBuilder {
    /// Creates a builder for the projector identified by `key`.
    #[must_use]
    pub fn new(key: impl Into<String>, config: ProjectorConfig) -> Self {
        Self {
            key: key.into(),
            config,
            transport: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }

    /// Uses `transport` instead of the one described by the configuration.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets how many commands may wait for a connection.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the communication monitor thresholds.
    #[must_use]
    pub fn with_monitor_thresholds(mut self, warning: Duration, error: Duration) -> Self {
        self.warning_threshold = warning;
        self.error_threshold = error;
        self
    }

    /// Builds the projector.
    ///
    /// Nothing is connected and no task is started until
    /// [`Projector::initialize`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build(self) -> Result<Projector> {
        self.try_build().map_err(|err| {
            tracing::error!(key = %self.key, error = %err, "Invalid projector configuration");
            err.into()
        })
    }

    fn try_build(&self) -> std::result::Result<Projector, ConfigError> {
        self.config.validate()?;

        let (commands, mode, authenticator): (Box<dyn CommandBuilder>, _, _) =
            match &self.config.control.method {
                ControlMethod::Com => (
                    Box::new(SerialCommandBuilder::new(self.config.id.as_str())),
                    DispatchMode::Direct,
                    Authenticator::Disabled,
                ),
                ControlMethod::Tcpip => {
                    let tcp = self
                        .config
                        .control
                        .tcp_ssh_properties
                        .as_ref()
                        .ok_or(ConfigError::MissingTcpProperties)?;
                    (
                        Box::new(NetworkCommandBuilder::new()),
                        DispatchMode::Handshake,
                        Authenticator::Digest(Credentials::new(
                            tcp.username.as_str(),
                            tcp.password.as_str(),
                        )),
                    )
                }
                ControlMethod::Other(method) => {
                    return Err(ConfigError::UnsupportedControlMethod(method.clone()));
                }
            };

        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => self.config_transport(commands.delimiter())?,
        };

        let dispatcher =
            Dispatcher::with_queue_capacity(transport, mode, authenticator, self.queue_capacity);
        let monitor =
            CommunicationMonitor::with_thresholds(self.warning_threshold, self.error_threshold);

        tracing::debug!(
            key = %self.key,
            method = ?self.config.control.method,
            ?mode,
            "Projector built"
        );

        Ok(Projector::new(
            self.key.clone(),
            commands,
            dispatcher,
            monitor,
            Timings::from_config(&self.config),
        ))
    }

    fn config_transport(
        &self,
        delimiter: &str,
    ) -> std::result::Result<Arc<dyn Transport>, ConfigError> {
        match &self.config.control.method {
            ControlMethod::Tcpip => {
                let address = self
                    .config
                    .tcp_address()
                    .ok_or(ConfigError::MissingTcpProperties)?;
                Ok(Arc::new(TcpTransport::new(address, delimiter)))
            }
            ControlMethod::Com => self.serial_transport(delimiter),
            ControlMethod::Other(method) => {
                Err(ConfigError::UnsupportedControlMethod(method.clone()))
            }
        }
    }

    #[cfg(feature = "serial")]
    fn serial_transport(
        &self,
        delimiter: &str,
    ) -> std::result::Result<Arc<dyn Transport>, ConfigError> {
        let com = self
            .config
            .control
            .com_params
            .as_ref()
            .ok_or(ConfigError::MissingComParams)?;
        Ok(Arc::new(crate::protocol::SerialTransport::new(
            com.port.as_str(),
            com.baud_rate,
            delimiter,
        )))
    }

    #[cfg(not(feature = "serial"))]
    #[allow(clippy::unused_self)]
    fn serial_transport(
        &self,
        _delimiter: &str,
    ) -> std::result::Result<Arc<dyn Transport>, ConfigError> {
        Err(ConfigError::SerialUnavailable)
    }
}

impl std::fmt::Debug for ProjectorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorBuilder")
            .field("key", &self.key)
            .field("method", &self.config.control.method)
            .field("custom_transport", &self.transport.is_some())
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}
