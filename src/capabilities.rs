// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability traits implemented by projector drivers.
//!
//! Hosts program against these traits rather than a concrete driver, so a
//! room controller can power a display or switch its inputs without knowing
//! which vendor protocol sits underneath.

use crate::error::{Result, ValueError};
use crate::monitor::CommunicationStatus;
use crate::state::StateChange;
use crate::subscription::SubscriptionId;
use crate::types::{INPUT_DESCRIPTORS, Input, InputDescriptor, PowerState};

/// A device whose power can be switched.
pub trait PowerControllable {
    /// Requests power on.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued.
    fn power_on(&self) -> Result<()>;

    /// Requests power off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued.
    fn power_off(&self) -> Result<()>;

    /// Inverts the last known power state.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued.
    fn power_toggle(&self) -> Result<()>;

    /// Returns the last known power state.
    fn power_state(&self) -> PowerState;
}

/// A device with selectable inputs.
///
/// Inputs are addressed by descriptor key (1-based), in the order of
/// [`inputs`](Self::inputs).
pub trait InputSelectable {
    /// Returns the selectable inputs in display order.
    fn inputs(&self) -> &'static [InputDescriptor] {
        &INPUT_DESCRIPTORS
    }

    /// Returns the currently selected input.
    fn current_input(&self) -> Input;

    /// Returns `true` if the input with `key` is the current input.
    fn is_selected(&self, key: u8) -> bool {
        let current = self.current_input();
        self.inputs()
            .iter()
            .any(|descriptor| descriptor.key == key && descriptor.input == current)
    }

    /// Selects the input with `key`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownInputKey` if no descriptor has `key`, or an
    /// error if the command could not be sent or queued.
    fn select_input(&self, key: u8) -> Result<()>;

    /// Looks up the input for a descriptor key.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownInputKey` if no descriptor has `key`.
    fn input_for_key(&self, key: u8) -> std::result::Result<Input, ValueError> {
        self.inputs()
            .iter()
            .find(|descriptor| descriptor.key == key)
            .map(|descriptor| descriptor.input)
            .ok_or(ValueError::UnknownInputKey(key))
    }
}

/// A device whose state is refreshed by polling.
pub trait Pollable {
    /// Sends one status query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query could not be sent or queued.
    fn poll(&self) -> Result<()>;
}

/// A device that reports state changes to subscribers.
pub trait FeedbackEmitting {
    /// Subscribes to power state changes.
    fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static;

    /// Subscribes to warm-up start and end.
    fn on_warming_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to cool-down start and end.
    fn on_cooling_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to current input changes.
    fn on_input_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Input) + Send + Sync + 'static;

    /// Subscribes to transport connectivity changes.
    fn on_connection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to online/offline changes.
    fn on_online_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to communication status changes.
    fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(CommunicationStatus) + Send + Sync + 'static;

    /// Subscribes to every state change.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static;

    /// Removes a subscription. Returns `true` if it existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
