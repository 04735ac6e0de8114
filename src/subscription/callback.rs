// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for projector state subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::monitor::CommunicationStatus;
use crate::state::StateChange;
use crate::types::{Input, PowerState};

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within a projector's lifetime.
///
/// # Examples
///
/// ```
/// use panaproj_lib::subscription::CallbackRegistry;
///
/// let registry = CallbackRegistry::new();
/// let id = registry.on_input_changed(|input| println!("input: {input}"));
/// assert!(registry.unsubscribe(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type PowerCallback = Arc<dyn Fn(PowerState) + Send + Sync>;
type FlagCallback = Arc<dyn Fn(bool) + Send + Sync>;
type InputCallback = Arc<dyn Fn(Input) + Send + Sync>;
type StatusCallback = Arc<dyn Fn(CommunicationStatus) + Send + Sync>;
type StateChangedCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// A deferred action run once when warm-up completes.
pub type WarmedUpAction = Box<dyn FnOnce() + Send>;

type Slot<T> = RwLock<HashMap<SubscriptionId, T>>;

/// Registry for managing projector subscription callbacks.
///
/// Callbacks are cloned out of the registry before they run, so a callback
/// may subscribe or unsubscribe without deadlocking.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    power_callbacks: Slot<PowerCallback>,
    warming_callbacks: Slot<FlagCallback>,
    cooling_callbacks: Slot<FlagCallback>,
    input_callbacks: Slot<InputCallback>,
    connection_callbacks: Slot<FlagCallback>,
    online_callbacks: Slot<FlagCallback>,
    status_callbacks: Slot<StatusCallback>,
    state_changed_callbacks: Slot<StateChangedCallback>,
    /// One-shot actions, drained when warm-up completes.
    warmed_up: Mutex<Vec<WarmedUpAction>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            power_callbacks: RwLock::new(HashMap::new()),
            warming_callbacks: RwLock::new(HashMap::new()),
            cooling_callbacks: RwLock::new(HashMap::new()),
            input_callbacks: RwLock::new(HashMap::new()),
            connection_callbacks: RwLock::new(HashMap::new()),
            online_callbacks: RwLock::new(HashMap::new()),
            status_callbacks: RwLock::new(HashMap::new()),
            state_changed_callbacks: RwLock::new(HashMap::new()),
            warmed_up: Mutex::new(Vec::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert<T>(&self, slot: &Slot<T>, callback: T) -> SubscriptionId {
        let id = self.next_id();
        slot.write().insert(id, callback);
        id
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for power state changes.
    pub fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static,
    {
        self.insert(&self.power_callbacks, Arc::new(callback))
    }

    /// Registers a callback for warm-up start (`true`) and end (`false`).
    pub fn on_warming_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.insert(&self.warming_callbacks, Arc::new(callback))
    }

    /// Registers a callback for cool-down start (`true`) and end (`false`).
    pub fn on_cooling_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.insert(&self.cooling_callbacks, Arc::new(callback))
    }

    /// Registers a callback for current input changes.
    pub fn on_input_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Input) + Send + Sync + 'static,
    {
        self.insert(&self.input_callbacks, Arc::new(callback))
    }

    /// Registers a callback for transport connectivity changes.
    pub fn on_connection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.insert(&self.connection_callbacks, Arc::new(callback))
    }

    /// Registers a callback for online/offline changes.
    pub fn on_online_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.insert(&self.online_callbacks, Arc::new(callback))
    }

    /// Registers a callback for communication status changes.
    pub fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(CommunicationStatus) + Send + Sync + 'static,
    {
        self.insert(&self.status_callbacks, Arc::new(callback))
    }

    /// Registers a callback for all state changes.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.insert(&self.state_changed_callbacks, Arc::new(callback))
    }

    /// Registers an action to run once, the next time warm-up completes.
    pub fn once_warmed_up<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.warmed_up.lock().push(Box::new(action));
    }

    /// Removes and returns all pending warmed-up actions.
    pub fn take_warmed_up(&self) -> Vec<WarmedUpAction> {
        std::mem::take(&mut *self.warmed_up.lock())
    }

    /// Returns the number of pending warmed-up actions.
    #[must_use]
    pub fn warmed_up_pending(&self) -> usize {
        self.warmed_up.lock().len()
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.power_callbacks.write().remove(&id).is_some()
            || self.warming_callbacks.write().remove(&id).is_some()
            || self.cooling_callbacks.write().remove(&id).is_some()
            || self.input_callbacks.write().remove(&id).is_some()
            || self.connection_callbacks.write().remove(&id).is_some()
            || self.online_callbacks.write().remove(&id).is_some()
            || self.status_callbacks.write().remove(&id).is_some()
            || self.state_changed_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks and pending warmed-up actions.
    pub fn clear(&self) {
        self.power_callbacks.write().clear();
        self.warming_callbacks.write().clear();
        self.cooling_callbacks.write().clear();
        self.input_callbacks.write().clear();
        self.connection_callbacks.write().clear();
        self.online_callbacks.write().clear();
        self.status_callbacks.write().clear();
        self.state_changed_callbacks.write().clear();
        self.warmed_up.lock().clear();
    }

    // =========================================================================
    // Dispatch methods
    // =========================================================================

    /// Dispatches a state change to the matching callbacks.
    ///
    /// Generic state-change callbacks run first, then the specific ones.
    pub fn dispatch(&self, change: &StateChange) {
        for callback in snapshot(&self.state_changed_callbacks) {
            callback(change);
        }

        match *change {
            StateChange::Power(power) => {
                for callback in snapshot(&self.power_callbacks) {
                    callback(power);
                }
            }
            StateChange::Warming(warming) => {
                for callback in snapshot(&self.warming_callbacks) {
                    callback(warming);
                }
            }
            StateChange::Cooling(cooling) => {
                for callback in snapshot(&self.cooling_callbacks) {
                    callback(cooling);
                }
            }
            StateChange::Input(input) => {
                for callback in snapshot(&self.input_callbacks) {
                    callback(input);
                }
            }
            StateChange::Connection(connected) => {
                for callback in snapshot(&self.connection_callbacks) {
                    callback(connected);
                }
            }
            StateChange::CommunicationStatus(status) => {
                for callback in snapshot(&self.status_callbacks) {
                    callback(status);
                }
            }
        }
    }

    /// Dispatches an online/offline change.
    pub fn dispatch_online(&self, online: bool) {
        for callback in snapshot(&self.online_callbacks) {
            callback(online);
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.power_callbacks.read().len()
            + self.warming_callbacks.read().len()
            + self.cooling_callbacks.read().len()
            + self.input_callbacks.read().len()
            + self.connection_callbacks.read().len()
            + self.online_callbacks.read().len()
            + self.status_callbacks.read().len()
            + self.state_changed_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

fn snapshot<T: Clone>(slot: &Slot<T>) -> Vec<T> {
    slot.read().values().cloned().collect()
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .field("warmed_up_pending", &self.warmed_up_pending())
            .finish()
    }
}
