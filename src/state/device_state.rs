// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector state tracking.

use crate::monitor::CommunicationStatus;
use crate::types::{Input, PowerState};

use super::StateChange;

/// Tracked state of a projector.
///
/// At most one of [`is_warming`](Self::is_warming) and
/// [`is_cooling`](Self::is_cooling) is `true`: starting one transition clears
/// the other.
///
/// # Examples
///
/// ```
/// use panaproj_lib::state::{DeviceState, StateChange};
///
/// let mut state = DeviceState::new();
/// state.apply(&StateChange::Warming(true));
/// state.apply(&StateChange::Cooling(true));
/// assert!(state.is_cooling());
/// assert!(!state.is_warming());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    power: PowerState,
    warming: bool,
    cooling: bool,
    input: Input,
    /// Set by a power-on request; the next "on" power reply is an echo.
    ignore_power_on_feedback: bool,
    connected: bool,
    communication_status: CommunicationStatus,
}

impl DeviceState {
    /// Creates a new state: power off, no input, disconnected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the power state.
    #[must_use]
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Returns `true` if the power is on.
    #[must_use]
    pub fn is_power_on(&self) -> bool {
        self.power.is_on()
    }

    /// Returns `true` during warm-up.
    #[must_use]
    pub fn is_warming(&self) -> bool {
        self.warming
    }

    /// Returns `true` during cool-down.
    #[must_use]
    pub fn is_cooling(&self) -> bool {
        self.cooling
    }

    /// Returns `true` during warm-up or cool-down.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.warming || self.cooling
    }

    /// Returns the current input.
    #[must_use]
    pub fn input(&self) -> Input {
        self.input
    }

    /// Returns `true` while the transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the communication status.
    #[must_use]
    pub fn communication_status(&self) -> CommunicationStatus {
        self.communication_status
    }

    /// Returns `true` if the projector is considered online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.communication_status.is_online()
    }

    /// Returns `true` if the next "on" power reply should be ignored.
    #[must_use]
    pub fn ignores_power_on_feedback(&self) -> bool {
        self.ignore_power_on_feedback
    }

    pub(crate) fn set_ignore_power_on_feedback(&mut self, ignore: bool) {
        self.ignore_power_on_feedback = ignore;
    }

    /// Applies a change; returns `true` if anything changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match *change {
            StateChange::Power(power) => replace(&mut self.power, power),
            StateChange::Warming(warming) => {
                if warming {
                    self.cooling = false;
                }
                replace(&mut self.warming, warming)
            }
            StateChange::Cooling(cooling) => {
                if cooling {
                    self.warming = false;
                }
                replace(&mut self.cooling, cooling)
            }
            StateChange::Input(input) => replace(&mut self.input, input),
            StateChange::Connection(connected) => replace(&mut self.connected, connected),
            StateChange::CommunicationStatus(status) => {
                replace(&mut self.communication_status, status)
            }
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_off_and_idle() {
        let state = DeviceState::new();
        assert_eq!(state.power(), PowerState::Off);
        assert!(!state.is_transitioning());
        assert_eq!(state.input(), Input::None);
        assert!(!state.is_connected());
        assert!(!state.is_online());
    }

    #[test]
    fn apply_reports_changes() {
        let mut state = DeviceState::new();
        assert!(state.apply(&StateChange::Input(Input::Hd1)));
        assert!(!state.apply(&StateChange::Input(Input::Hd1)));
        assert!(state.apply(&StateChange::Connection(true)));
        assert!(state.is_connected());
    }

    #[test]
    fn warming_and_cooling_are_exclusive() {
        let mut state = DeviceState::new();
        state.apply(&StateChange::Cooling(true));
        state.apply(&StateChange::Warming(true));
        assert!(state.is_warming());
        assert!(!state.is_cooling());
    }

    #[test]
    fn online_follows_status() {
        let mut state = DeviceState::new();
        state.apply(&StateChange::CommunicationStatus(CommunicationStatus::Ok));
        assert!(state.is_online());
        state.apply(&StateChange::CommunicationStatus(CommunicationStatus::Error));
        assert!(!state.is_online());
    }
}
