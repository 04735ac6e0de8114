// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device factory for control system hosts.
//!
//! Hosts describe devices with a generic definition (key, name, type and a
//! free-form JSON `properties` object). The factory recognizes the type names
//! this driver handles and turns matching definitions into [`Projector`]s.
//!
//! ```
//! use panaproj_lib::factory::{DeviceDefinition, build_device};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let definition: DeviceDefinition = serde_json::from_str(r#"{
//!     "key": "projector-1",
//!     "name": "Main Projector",
//!     "type": "panasonicProjector",
//!     "properties": {
//!         "control": {
//!             "method": "tcpip",
//!             "tcpSshProperties": { "address": "10.0.0.5", "port": 1024 }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let projector = build_device(&definition).expect("valid definition");
//! assert_eq!(projector.key(), "projector-1");
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ProjectorConfig;
use crate::device::Projector;

/// Device type names handled by this driver.
pub const TYPE_NAMES: &[&str] = &["panasonicProjector"];

/// A host device definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Unique device key.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Device type name.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Driver specific properties.
    #[serde(default)]
    pub properties: serde_json::Value,
}

/// Returns `true` if this driver handles `device_type` (case-insensitive).
#[must_use]
pub fn supports_type(device_type: &str) -> bool {
    TYPE_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(device_type))
}

/// Builds a projector from a host definition.
///
/// Returns `None`, after logging why, if the type is not handled, the
/// properties cannot be read, or the configuration is invalid.
#[must_use]
pub fn build_device(definition: &DeviceDefinition) -> Option<Projector> {
    tracing::debug!(
        key = %definition.key,
        device_type = %definition.device_type,
        "Factory attempting to create device"
    );

    if !supports_type(&definition.device_type) {
        tracing::debug!(
            key = %definition.key,
            device_type = %definition.device_type,
            "Factory does not handle this type"
        );
        return None;
    }

    let config = match ProjectorConfig::from_value(definition.properties.clone()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                key = %definition.key,
                name = %definition.name,
                error = %e,
                "Failed to read properties config"
            );
            return None;
        }
    };

    Projector::builder(definition.key.as_str(), config).build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(device_type: &str, properties: serde_json::Value) -> DeviceDefinition {
        DeviceDefinition {
            key: "proj".to_string(),
            name: "Projector".to_string(),
            device_type: device_type.to_string(),
            properties,
        }
    }

    #[test]
    fn type_names_match_case_insensitively() {
        assert!(supports_type("panasonicProjector"));
        assert!(supports_type("PanasonicProjector"));
        assert!(!supports_type("sonyProjector"));
    }

    #[tokio::test]
    async fn builds_tcp_projector() {
        let def = definition(
            "panasonicProjector",
            json!({
                "control": {
                    "method": "tcpip",
                    "tcpSshProperties": { "address": "10.0.0.5", "username": "a", "password": "b" }
                },
                "warmupTimeInSeconds": 5
            }),
        );
        let projector = build_device(&def).unwrap();
        assert_eq!(projector.key(), "proj");
    }

    #[test]
    fn unknown_type_is_none() {
        let def = definition("other", json!({}));
        assert!(build_device(&def).is_none());
    }

    #[test]
    fn unreadable_properties_is_none() {
        let def = definition("panasonicProjector", json!({ "control": "tcpip" }));
        assert!(build_device(&def).is_none());
    }

    #[test]
    fn invalid_method_is_none() {
        let def = definition(
            "panasonicProjector",
            json!({ "control": { "method": "ssh" } }),
        );
        assert!(build_device(&def).is_none());
    }

    #[test]
    fn definition_deserializes_type_field() {
        let def: DeviceDefinition = serde_json::from_value(json!({
            "key": "k",
            "type": "panasonicProjector"
        }))
        .unwrap();
        assert_eq!(def.device_type, "panasonicProjector");
        assert!(def.properties.is_null());
    }
}
