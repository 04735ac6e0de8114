// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector state management types.
//!
//! [`DeviceState`] holds the current state of a projector, while
//! [`StateChange`] represents individual changes that can be applied to it
//! and are reported to subscribers.
//!
//! # Examples
//!
//! ```
//! use panaproj_lib::state::{DeviceState, StateChange};
//! use panaproj_lib::types::Input;
//!
//! let mut state = DeviceState::new();
//! state.apply(&StateChange::Input(Input::Hd2));
//!
//! assert_eq!(state.input(), Input::Hd2);
//! ```

mod device_state;
mod state_change;

pub use device_state::DeviceState;
pub use state_change::StateChange;
