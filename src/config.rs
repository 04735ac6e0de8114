// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector configuration.
//!
//! The configuration mirrors the JSON device properties used by control
//! system hosts, so it can be deserialized straight from a device definition:
//!
//! ```
//! use panaproj_lib::config::{ControlMethod, ProjectorConfig};
//!
//! let config = ProjectorConfig::from_json(r#"{
//!     "control": {
//!         "method": "tcpip",
//!         "tcpSshProperties": {
//!             "address": "10.0.0.5",
//!             "username": "admin1",
//!             "password": "panasonic"
//!         }
//!     },
//!     "warmupTimeInSeconds": 30
//! }"#).unwrap();
//!
//! assert_eq!(config.control.method, ControlMethod::Tcpip);
//! assert_eq!(config.tcp_address().as_deref(), Some("10.0.0.5:1024"));
//! assert_eq!(config.warmup_time().as_secs(), 30);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default NTCONTROL TCP port.
pub const DEFAULT_TCP_PORT: u16 = 1024;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Warm-up time used when none is configured.
pub const DEFAULT_WARMUP_TIME: Duration = Duration::from_secs(1);

/// Cool-down time used when none is configured.
pub const DEFAULT_COOLDOWN_TIME: Duration = Duration::from_secs(2);

/// Power poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(50);

/// How the projector is physically controlled.
///
/// Parsed case-insensitively; `com`/`serial` and `tcpip`/`network` are
/// accepted. Any other value deserializes to [`Other`](Self::Other) and is
/// rejected by [`ProjectorConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlMethod {
    /// RS-232 serial control.
    Com,
    /// NTCONTROL over TCP.
    Tcpip,
    /// A method this driver does not support.
    Other(String),
}

impl From<String> for ControlMethod {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "com" | "serial" => Self::Com,
            "tcpip" | "network" => Self::Tcpip,
            _ => Self::Other(value),
        }
    }
}

impl From<ControlMethod> for String {
    fn from(value: ControlMethod) -> Self {
        match value {
            ControlMethod::Com => "com".to_string(),
            ControlMethod::Tcpip => "tcpip".to_string(),
            ControlMethod::Other(other) => other,
        }
    }
}

/// TCP connection properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpProperties {
    /// Host name or IP address.
    pub address: String,
    /// TCP port.
    #[serde(default = "default_tcp_port")]
    pub port: u16,
    /// NTCONTROL user name.
    #[serde(default)]
    pub username: String,
    /// NTCONTROL password.
    #[serde(default)]
    pub password: String,
}

/// Serial port parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComParams {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Control section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlConfig {
    /// Control method.
    pub method: ControlMethod,
    /// TCP properties, required for [`ControlMethod::Tcpip`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_ssh_properties: Option<TcpProperties>,
    /// Serial parameters, required for [`ControlMethod::Com`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub com_params: Option<ComParams>,
}

/// Configuration of one projector.
///
/// Durations of zero fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectorConfig {
    /// Control section.
    pub control: ControlConfig,
    /// Serial device identifier; empty means broadcast.
    #[serde(default)]
    pub id: String,
    /// Warm-up time in seconds.
    #[serde(default)]
    pub warmup_time_in_seconds: u64,
    /// Cool-down time in seconds.
    #[serde(default)]
    pub cooldown_time_in_seconds: u64,
    /// Power poll interval in seconds.
    #[serde(default)]
    pub poll_interval_in_seconds: u64,
}

fn default_tcp_port() -> u16 {
    DEFAULT_TCP_PORT
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl ProjectorConfig {
    /// Creates a configuration for NTCONTROL over TCP on the default port.
    #[must_use]
    pub fn tcp(address: impl Into<String>) -> Self {
        Self::with_control(ControlConfig {
            method: ControlMethod::Tcpip,
            tcp_ssh_properties: Some(TcpProperties {
                address: address.into(),
                port: DEFAULT_TCP_PORT,
                username: String::new(),
                password: String::new(),
            }),
            com_params: None,
        })
    }

    /// Creates a configuration for serial control at the default baud rate.
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_control(ControlConfig {
            method: ControlMethod::Com,
            tcp_ssh_properties: None,
            com_params: Some(ComParams {
                port: port.into(),
                baud_rate: DEFAULT_BAUD_RATE,
            }),
        })
    }

    fn with_control(control: ControlConfig) -> Self {
        Self {
            control,
            id: String::new(),
            warmup_time_in_seconds: 0,
            cooldown_time_in_seconds: 0,
            poll_interval_in_seconds: 0,
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the JSON does not match the schema.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts a JSON value (such as a device definition's properties).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the value does not match the schema.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Sets the TCP port.
    ///
    /// Only applicable for TCP control.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        if let Some(tcp) = &mut self.control.tcp_ssh_properties {
            tcp.port = port;
        }
        self
    }

    /// Sets NTCONTROL credentials.
    ///
    /// Only applicable for TCP control.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        if let Some(tcp) = &mut self.control.tcp_ssh_properties {
            tcp.username = username.into();
            tcp.password = password.into();
        }
        self
    }

    /// Sets the serial baud rate.
    ///
    /// Only applicable for serial control.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        if let Some(com) = &mut self.control.com_params {
            com.baud_rate = baud_rate;
        }
        self
    }

    /// Sets the serial device identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the warm-up time in seconds.
    #[must_use]
    pub fn with_warmup_seconds(mut self, seconds: u64) -> Self {
        self.warmup_time_in_seconds = seconds;
        self
    }

    /// Sets the cool-down time in seconds.
    #[must_use]
    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.cooldown_time_in_seconds = seconds;
        self
    }

    /// Sets the poll interval in seconds.
    #[must_use]
    pub fn with_poll_interval_seconds(mut self, seconds: u64) -> Self {
        self.poll_interval_in_seconds = seconds;
        self
    }

    /// Checks that the control method is supported and its section present.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.control.method {
            ControlMethod::Tcpip if self.control.tcp_ssh_properties.is_none() => {
                Err(ConfigError::MissingTcpProperties)
            }
            ControlMethod::Com if self.control.com_params.is_none() => {
                Err(ConfigError::MissingComParams)
            }
            ControlMethod::Other(method) => {
                Err(ConfigError::UnsupportedControlMethod(method.clone()))
            }
            ControlMethod::Tcpip | ControlMethod::Com => Ok(()),
        }
    }

    /// Returns `host:port` for TCP control.
    #[must_use]
    pub fn tcp_address(&self) -> Option<String> {
        self.control
            .tcp_ssh_properties
            .as_ref()
            .map(|tcp| format!("{}:{}", tcp.address, tcp.port))
    }

    /// Returns the warm-up time.
    #[must_use]
    pub fn warmup_time(&self) -> Duration {
        seconds_or(self.warmup_time_in_seconds, DEFAULT_WARMUP_TIME)
    }

    /// Returns the cool-down time.
    #[must_use]
    pub fn cooldown_time(&self) -> Duration {
        seconds_or(self.cooldown_time_in_seconds, DEFAULT_COOLDOWN_TIME)
    }

    /// Returns the power poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        seconds_or(self.poll_interval_in_seconds, DEFAULT_POLL_INTERVAL)
    }
}

fn seconds_or(seconds: u64, default: Duration) -> Duration {
    if seconds == 0 {
        default
    } else {
        Duration::from_secs(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!(ControlMethod::from("COM".to_string()), ControlMethod::Com);
        assert_eq!(ControlMethod::from("Serial".to_string()), ControlMethod::Com);
        assert_eq!(ControlMethod::from("TcpIp".to_string()), ControlMethod::Tcpip);
        assert_eq!(
            ControlMethod::from("network".to_string()),
            ControlMethod::Tcpip
        );
        assert_eq!(
            ControlMethod::from("ir".to_string()),
            ControlMethod::Other("ir".to_string())
        );
    }

    #[test]
    fn serial_json_applies_defaults() {
        let config = ProjectorConfig::from_json(
            r#"{ "control": { "method": "com", "comParams": { "port": "/dev/ttyS0" } } }"#,
        )
        .unwrap();

        let com = config.control.com_params.as_ref().unwrap();
        assert_eq!(com.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.id, "");
        assert_eq!(config.warmup_time(), DEFAULT_WARMUP_TIME);
        assert_eq!(config.cooldown_time(), DEFAULT_COOLDOWN_TIME);
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert!(config.tcp_address().is_none());
    }

    #[test]
    fn tcp_json_reads_credentials() {
        let config = ProjectorConfig::from_json(
            r#"{
                "control": {
                    "method": "tcpip",
                    "tcpSshProperties": {
                        "address": "10.0.0.5",
                        "port": 2000,
                        "username": "admin1",
                        "password": "panasonic"
                    }
                },
                "cooldownTimeInSeconds": 90
            }"#,
        )
        .unwrap();

        let tcp = config.control.tcp_ssh_properties.as_ref().unwrap();
        assert_eq!(tcp.username, "admin1");
        assert_eq!(tcp.password, "panasonic");
        assert_eq!(config.tcp_address().as_deref(), Some("10.0.0.5:2000"));
        assert_eq!(config.cooldown_time(), Duration::from_secs(90));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let mut config = ProjectorConfig::tcp("10.0.0.5");
        config.control.tcp_ssh_properties = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTcpProperties)
        ));

        let mut config = ProjectorConfig::serial("/dev/ttyS0");
        config.control.com_params = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingComParams)
        ));

        let mut config = ProjectorConfig::tcp("10.0.0.5");
        config.control.method = ControlMethod::Other("ssh".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedControlMethod(m)) if m == "ssh"
        ));
    }

    #[test]
    fn builder_helpers() {
        let config = ProjectorConfig::tcp("projector.local")
            .with_port(1025)
            .with_credentials("user", "secret")
            .with_warmup_seconds(20)
            .with_poll_interval_seconds(10);

        assert_eq!(config.tcp_address().as_deref(), Some("projector.local:1025"));
        assert_eq!(config.warmup_time(), Duration::from_secs(20));
        assert_eq!(config.poll_interval(), Duration::from_secs(10));

        let serial = ProjectorConfig::serial("/dev/ttyUSB0")
            .with_baud_rate(19200)
            .with_id("01");
        assert_eq!(serial.control.com_params.unwrap().baud_rate, 19200);
        assert_eq!(serial.id, "01");
    }

    #[test]
    fn method_serializes_as_string() {
        let config = ProjectorConfig::serial("/dev/ttyUSB0");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["control"]["method"], "com");
        assert_eq!(json["control"]["comParams"]["baudRate"], 9600);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = ProjectorConfig::from_json("{ \"control\": 5 }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
