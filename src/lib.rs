// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PanaProj` Lib - A Rust library to control Panasonic projectors.
//!
//! This library drives Panasonic projectors over NTCONTROL (TCP, with the
//! MD5 challenge/response handshake) or RS-232, and tracks their state from
//! the replies they send back.
//!
//! # Supported Features
//!
//! - **Power control**: On/off with warm-up and cool-down tracking, toggle
//! - **Input selection**: Computer, video, DVI, HDMI, SDI and Digital Link
//! - **Polling**: Periodic power queries keep state and online status fresh
//! - **Queuing**: Commands issued while disconnected are sent once a
//!   connection (and, if required, authentication) is established
//! - **Feedback**: Callbacks for power, warm-up, cool-down, input,
//!   connection and communication status changes
//!
//! # Quick Start
//!
//! ## NTCONTROL over TCP
//!
//! ```no_run
//! use panaproj_lib::{Projector, ProjectorConfig};
//! use panaproj_lib::capabilities::FeedbackEmitting;
//! use panaproj_lib::types::Input;
//!
//! #[tokio::main]
//! async fn main() -> panaproj_lib::Result<()> {
//!     let config = ProjectorConfig::tcp("192.168.1.80")
//!         .with_credentials("admin1", "panasonic");
//!
//!     let projector = Projector::builder("main-projector", config).build()?;
//!     projector.on_warming_changed(|warming| println!("warming: {warming}"));
//!     projector.initialize();
//!
//!     // Switch to HDMI 1 once the lamp is up
//!     let switcher = projector.clone();
//!     projector.execute_switch(move || {
//!         let _ = switcher.set_input(Input::Hd1);
//!     })?;
//!
//!     projector.shutdown().await
//! }
//! ```
//!
//! ## RS-232
//!
//! ```no_run
//! use panaproj_lib::{Projector, ProjectorConfig};
//!
//! #[tokio::main]
//! async fn main() -> panaproj_lib::Result<()> {
//!     let config = ProjectorConfig::serial("/dev/ttyUSB0").with_id("01");
//!     let projector = Projector::builder("rs232-projector", config).build()?;
//!     projector.initialize();
//!
//!     projector.power_on()?;
//!     Ok(())
//! }
//! ```
//!
//! ## From a host device definition
//!
//! ```no_run
//! use panaproj_lib::factory::{DeviceDefinition, build_device};
//!
//! # fn example(definition: DeviceDefinition) {
//! if let Some(projector) = build_device(&definition) {
//!     projector.initialize();
//! }
//! # }
//! ```

pub mod capabilities;
pub mod command;
pub mod config;
mod device;
pub mod error;
pub mod factory;
pub mod monitor;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use capabilities::{FeedbackEmitting, InputSelectable, Pollable, PowerControllable};
pub use command::{Command, CommandBuilder, ProjectorCommand};
pub use config::ProjectorConfig;
pub use device::{Projector, ProjectorBuilder};
pub use error::{ConfigError, Error, Result, TransportError, ValueError};
pub use monitor::CommunicationStatus;
pub use protocol::{Transport, TransportEvent};
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use types::{Input, PowerState};
