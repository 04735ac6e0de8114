// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the building blocks for updating a
//! [`DeviceState`](super::DeviceState). They come from classified replies,
//! the warm-up and cool-down timers, optimistic input selection, and the
//! transport and communication monitor.
//!
//! # Examples
//!
//! ```
//! use panaproj_lib::state::{DeviceState, StateChange};
//! use panaproj_lib::types::PowerState;
//!
//! let mut state = DeviceState::new();
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&StateChange::Power(PowerState::On)));
//! assert!(!state.apply(&StateChange::Power(PowerState::On)));
//! ```

use crate::monitor::CommunicationStatus;
use crate::types::{Input, PowerState};

/// Represents a change in projector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Power state changed.
    Power(PowerState),

    /// Warm-up started (`true`) or finished (`false`).
    Warming(bool),

    /// Cool-down started (`true`) or finished (`false`).
    Cooling(bool),

    /// Current input changed.
    Input(Input),

    /// Transport connected (`true`) or disconnected (`false`).
    Connection(bool),

    /// Communication status reported by the monitor changed.
    CommunicationStatus(CommunicationStatus),
}

impl StateChange {
    /// Creates a change for a power state.
    #[must_use]
    pub const fn power(state: PowerState) -> Self {
        Self::Power(state)
    }

    /// Creates a change for an input.
    #[must_use]
    pub const fn input(input: Input) -> Self {
        Self::Input(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert_eq!(
            StateChange::power(PowerState::On),
            StateChange::Power(PowerState::On)
        );
        assert_eq!(
            StateChange::input(Input::Hd1),
            StateChange::Input(Input::Hd1)
        );
    }
}
