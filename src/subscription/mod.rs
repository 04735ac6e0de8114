// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for projector state changes.
//!
//! This module provides a callback-based subscription system for receiving
//! notifications when projector state changes: power, warm-up, cool-down,
//! current input, connectivity, and communication health.
//!
//! # Usage
//!
//! Subscriptions are created through methods on a
//! [`Projector`](crate::Projector) (see
//! [`FeedbackEmitting`](crate::capabilities::FeedbackEmitting)):
//!
//! ```no_run
//! use panaproj_lib::capabilities::FeedbackEmitting;
//! use panaproj_lib::{Projector, ProjectorConfig};
//!
//! # fn example(projector: Projector) {
//! let sub_id = projector.on_power_changed(|state| {
//!     println!("Power changed to {state}");
//! });
//!
//! // Later, unsubscribe
//! projector.unsubscribe(sub_id);
//! # }
//! ```

mod callback;

pub use callback::{CallbackRegistry, SubscriptionId, WarmedUpAction};
