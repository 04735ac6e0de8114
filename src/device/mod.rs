// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level projector abstraction.
//!
//! A [`Projector`] turns intents (power, input selection, polling) into
//! vendor commands and folds received replies back into a [`DeviceState`].
//! It is cheap to clone; all clones share the same connection and state.
//!
//! # Examples
//!
//! ```no_run
//! use panaproj_lib::{Projector, ProjectorConfig};
//! use panaproj_lib::capabilities::FeedbackEmitting;
//! use panaproj_lib::types::Input;
//!
//! # async fn example() -> panaproj_lib::Result<()> {
//! let config = ProjectorConfig::tcp("192.168.1.80").with_credentials("admin1", "panasonic");
//! let projector = Projector::builder("projector-1", config).build()?;
//!
//! projector.on_power_changed(|state| println!("power: {state}"));
//! projector.initialize();
//!
//! projector.power_on()?;
//! projector.set_input(Input::Hd1)?;
//!
//! projector.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::ProjectorBuilder;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::capabilities::{FeedbackEmitting, InputSelectable, Pollable, PowerControllable};
use crate::command::{CommandBuilder, ProjectorCommand};
use crate::config::ProjectorConfig;
use crate::error::{Result, ValueError};
use crate::monitor::{CommunicationMonitor, CommunicationStatus};
use crate::protocol::{DispatchMode, Dispatcher, Reply, SendOutcome, TransportEvent, classify};
use crate::state::{DeviceState, StateChange};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{Input, PowerState};

/// Durations driving the power state machine and polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timings {
    pub(crate) warmup: Duration,
    pub(crate) cooldown: Duration,
    pub(crate) poll_interval: Duration,
}

impl Timings {
    pub(crate) fn from_config(config: &ProjectorConfig) -> Self {
        Self {
            warmup: config.warmup_time(),
            cooldown: config.cooldown_time(),
            poll_interval: config.poll_interval(),
        }
    }
}

#[derive(Default)]
struct Tasks {
    event_worker: Option<JoinHandle<()>>,
    status_watcher: Option<JoinHandle<()>>,
    poll: Option<JoinHandle<Result<()>>>,
    warmup: Option<JoinHandle<()>>,
    cooldown: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        for handle in [
            self.event_worker.take(),
            self.status_watcher.take(),
            self.warmup.take(),
            self.cooldown.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
    }
}

struct Inner {
    key: String,
    commands: Box<dyn CommandBuilder>,
    dispatcher: Dispatcher,
    state: RwLock<DeviceState>,
    callbacks: CallbackRegistry,
    monitor: Arc<CommunicationMonitor>,
    timings: Timings,
    tasks: Mutex<Tasks>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.tasks.get_mut().abort_all();
    }
}

/// A Panasonic projector controlled over TCP (NTCONTROL) or RS-232.
///
/// Background tasks hold only weak references, so dropping the last clone
/// stops them. Call [`shutdown`](Self::shutdown) to stop them explicitly and
/// collect a poll failure.
#[derive(Clone)]
pub struct Projector {
    inner: Arc<Inner>,
}

impl Projector {
    /// Creates a builder for a projector identified by `key`.
    #[must_use]
    pub fn builder(key: impl Into<String>, config: ProjectorConfig) -> ProjectorBuilder {
        ProjectorBuilder::new(key, config)
    }

    pub(crate) fn new(
        key: String,
        commands: Box<dyn CommandBuilder>,
        dispatcher: Dispatcher,
        monitor: Arc<CommunicationMonitor>,
        timings: Timings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                key,
                commands,
                dispatcher,
                state: RwLock::new(DeviceState::new()),
                callbacks: CallbackRegistry::new(),
                monitor,
                timings,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Returns the device key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.inner.state.read().clone()
    }

    /// Returns the last known power state.
    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.inner.state.read().power()
    }

    /// Returns `true` during warm-up.
    #[must_use]
    pub fn is_warming(&self) -> bool {
        self.inner.state.read().is_warming()
    }

    /// Returns `true` during cool-down.
    #[must_use]
    pub fn is_cooling(&self) -> bool {
        self.inner.state.read().is_cooling()
    }

    /// Returns the current input.
    #[must_use]
    pub fn current_input(&self) -> Input {
        self.inner.state.read().input()
    }

    /// Returns `true` if the communication monitor considers the projector
    /// reachable.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.state.read().is_online()
    }

    /// Returns the communication status.
    #[must_use]
    pub fn communication_status(&self) -> CommunicationStatus {
        self.inner.state.read().communication_status()
    }

    /// Returns the command dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Returns the communication monitor.
    #[must_use]
    pub fn monitor(&self) -> &Arc<CommunicationMonitor> {
        &self.inner.monitor
    }

    /// Returns the callback registry.
    #[must_use]
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.inner.callbacks
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts the event worker, the communication monitor and the poll timer.
    ///
    /// The first poll is sent one poll interval after this call. Serial
    /// ports are opened immediately; TCP connections are opened on demand.
    /// Calling this twice has no effect.
    pub fn initialize(&self) {
        {
            let mut tasks = self.inner.tasks.lock();
            if tasks.event_worker.is_some() {
                tracing::debug!(key = %self.inner.key, "Projector already initialized");
                return;
            }
            tasks.event_worker = Some(self.spawn_event_worker());
            tasks.status_watcher = Some(self.spawn_status_watcher());
            tasks.poll = Some(self.spawn_poll_task());
        }

        self.inner.monitor.start();

        if self.inner.dispatcher.mode() == DispatchMode::Direct {
            self.spawn_connect();
        }

        tracing::info!(
            key = %self.inner.key,
            poll_interval_secs = self.inner.timings.poll_interval.as_secs(),
            "Projector initialized"
        );
    }

    /// Stops all timers, the monitor and the event worker, then closes the
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the poll timer, if it stopped on one.
    pub async fn shutdown(&self) -> Result<()> {
        let mut tasks = std::mem::take(&mut *self.inner.tasks.lock());
        let poll = tasks.poll.take();
        tasks.abort_all();
        self.inner.monitor.stop();

        let poll_result = match poll {
            Some(handle) if handle.is_finished() => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(key = %self.inner.key, error = %e, "Poll task panicked");
                    Ok(())
                }
            },
            Some(handle) => {
                handle.abort();
                Ok(())
            }
            None => Ok(()),
        };

        let transport = self.inner.dispatcher.transport();
        if transport.is_connected() {
            if let Err(e) = transport.disconnect().await {
                tracing::debug!(key = %self.inner.key, error = %e, "Disconnect on shutdown failed");
            }
        }

        tracing::info!(key = %self.inner.key, "Projector shut down");
        poll_result
    }

    /// Returns `true` while the transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.dispatcher.transport().is_connected()
    }

    /// Connects (and starts the monitor) or disconnects (and stops it).
    ///
    /// The connect or disconnect runs in the background.
    pub fn set_connected(&self, connect: bool) {
        if connect {
            self.spawn_connect();
            self.inner.monitor.start();
        } else {
            self.spawn_disconnect();
            self.inner.monitor.stop();
        }
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Turns the projector on and starts the warm-up timer.
    ///
    /// Ignored while on, warming or cooling.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued; the
    /// warm-up is then not started.
    pub fn power_on(&self) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            if state.is_power_on() || state.is_transitioning() {
                tracing::debug!(
                    key = %self.inner.key,
                    power = %state.power(),
                    warming = state.is_warming(),
                    cooling = state.is_cooling(),
                    "Ignoring power on"
                );
                return Ok(());
            }
            state.set_ignore_power_on_feedback(true);
            state.apply(&StateChange::Warming(true));
        }

        if let Err(err) = self.send(ProjectorCommand::PowerOn) {
            let mut state = self.inner.state.write();
            state.set_ignore_power_on_feedback(false);
            state.apply(&StateChange::Warming(false));
            return Err(err);
        }

        self.inner.callbacks.dispatch(&StateChange::Warming(true));
        self.start_warmup_timer();
        Ok(())
    }

    /// Puts the projector in standby and starts the cool-down timer.
    ///
    /// Ignored while off, warming or cooling.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued; the
    /// cool-down is then not started.
    pub fn power_off(&self) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            if !state.is_power_on() || state.is_transitioning() {
                tracing::debug!(
                    key = %self.inner.key,
                    power = %state.power(),
                    warming = state.is_warming(),
                    cooling = state.is_cooling(),
                    "Ignoring power off"
                );
                return Ok(());
            }
            state.apply(&StateChange::Cooling(true));
        }

        if let Err(err) = self.send(ProjectorCommand::PowerOff) {
            self.inner.state.write().apply(&StateChange::Cooling(false));
            return Err(err);
        }

        self.inner.callbacks.dispatch(&StateChange::Cooling(true));
        self.start_cooldown_timer();
        Ok(())
    }

    /// Sends power off if the projector is on, power on otherwise.
    ///
    /// Unlike [`power_on`](Self::power_on) and [`power_off`](Self::power_off)
    /// this neither checks for a transition nor starts one.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be sent or queued.
    pub fn power_toggle(&self) -> Result<()> {
        let command = if self.power_state().is_on() {
            ProjectorCommand::PowerOff
        } else {
            ProjectorCommand::PowerOn
        };
        self.send(command).map(|_| ())
    }

    /// Selects `input` and records it as current without waiting for the
    /// projector to confirm.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidInput` for [`Input::None`], or an error if
    /// the command could not be sent or queued.
    pub fn set_input(&self, input: Input) -> Result<()> {
        if !input.is_selectable() {
            return Err(ValueError::InvalidInput(input.to_string()).into());
        }
        self.send(ProjectorCommand::SelectInput(input))?;
        self.update(&[StateChange::Input(input)]);
        Ok(())
    }

    /// Runs `action` once the projector is on.
    ///
    /// If the projector is already on, `action` runs immediately. Otherwise
    /// it runs once when the next warm-up completes, and power on is
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns the error from [`power_on`](Self::power_on). The action stays
    /// registered for the next warm-up.
    pub fn execute_switch<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let state = self.inner.state.read();
            if !state.is_power_on() {
                self.inner.callbacks.once_warmed_up(action);
                drop(state);
                return self.power_on();
            }
        }
        action();
        Ok(())
    }

    /// Sends one power query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query could not be sent or queued.
    pub fn poll(&self) -> Result<()> {
        self.send(ProjectorCommand::QueryPower).map(|_| ())
    }

    /// Sends `text` as-is, bypassing the state machine.
    ///
    /// `text` must already be formatted for the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the text could not be sent or queued.
    pub fn send_text(&self, text: &str) -> Result<SendOutcome> {
        self.inner.dispatcher.send(text)
    }

    fn send(&self, command: ProjectorCommand) -> Result<SendOutcome> {
        let text = self.inner.commands.build(&command);
        self.inner.dispatcher.send(&text).inspect_err(|e| {
            tracing::warn!(key = %self.inner.key, ?command, error = %e, "Command dropped");
        })
    }

    // =========================================================================
    // Inbound processing
    // =========================================================================

    /// Processes one received line.
    ///
    /// Normally called by the event worker; exposed for hosts that gather
    /// lines themselves.
    pub fn handle_line(&self, line: &str) {
        self.inner.monitor.record_activity();

        let pending = self.inner.dispatcher.pending();
        let reply = classify(line, pending.as_ref());
        tracing::debug!(
            key = %self.inner.key,
            line = %line.escape_debug(),
            ?reply,
            "Line received"
        );

        let handshake = match reply {
            Reply::Challenge(random) => self.inner.dispatcher.on_challenge(random.as_deref()),
            Reply::NoChallenge => self.inner.dispatcher.on_no_challenge(),
            Reply::Power(power) => {
                self.apply_power_feedback(power);
                return;
            }
            Reply::Input(input) => {
                self.update(&[StateChange::Input(input)]);
                return;
            }
            Reply::Discarded => return,
        };

        if let Err(e) = handshake {
            tracing::warn!(key = %self.inner.key, error = %e, "Sending queued command failed");
        }
    }

    /// Processes a transport connectivity change.
    pub fn handle_connection_change(&self, connected: bool) {
        tracing::debug!(key = %self.inner.key, connected, "Connection changed");
        self.inner.dispatcher.on_connection_changed(connected);
        self.update(&[StateChange::Connection(connected)]);
    }

    fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::LineReceived(line) => self.handle_line(&line),
            TransportEvent::ConnectionChanged(connected) => {
                self.handle_connection_change(connected);
            }
        }
    }

    fn apply_power_feedback(&self, power: PowerState) {
        let changed = {
            let mut state = self.inner.state.write();
            if state.ignores_power_on_feedback() && power.is_on() {
                state.set_ignore_power_on_feedback(false);
                tracing::debug!(key = %self.inner.key, "Ignoring power on echo");
                false
            } else {
                state.apply(&StateChange::Power(power))
            }
        };

        if changed {
            self.inner.callbacks.dispatch(&StateChange::Power(power));
        }
    }

    fn apply_status(&self, status: CommunicationStatus) {
        let (changed, online) = {
            let mut state = self.inner.state.write();
            let was_online = state.is_online();
            let changed = state.apply(&StateChange::CommunicationStatus(status));
            let online = state.is_online();
            (changed, (online != was_online).then_some(online))
        };

        if changed {
            self.inner
                .callbacks
                .dispatch(&StateChange::CommunicationStatus(status));
        }
        if let Some(online) = online {
            tracing::info!(key = %self.inner.key, online, ?status, "Online state changed");
            self.inner.callbacks.dispatch_online(online);
        }
    }

    /// Applies `changes` under one lock, then notifies the ones that changed
    /// something.
    fn update(&self, changes: &[StateChange]) {
        let changed: Vec<StateChange> = {
            let mut state = self.inner.state.write();
            changes
                .iter()
                .copied()
                .filter(|change| state.apply(change))
                .collect()
        };

        for change in &changed {
            self.inner.callbacks.dispatch(change);
        }
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn spawn_event_worker(&self) -> JoinHandle<()> {
        let mut events = self.inner.dispatcher.transport().subscribe();
        let inner = Arc::downgrade(&self.inner);
        let key = self.inner.key.clone();

        tokio::spawn(async move {
            tracing::debug!(key = %key, "Event worker started");
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        Self::from_inner(inner).handle_event(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(key = %key, skipped, "Event worker lagged, events lost");
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        // A lost connectivity change would leave the token and
                        // connect latch stale
                        let projector = Self::from_inner(inner);
                        let connected = projector.inner.dispatcher.transport().is_connected();
                        projector.handle_connection_change(connected);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!(key = %key, "Event worker stopped");
        })
    }

    fn spawn_status_watcher(&self) -> JoinHandle<()> {
        let mut status = self.inner.monitor.subscribe();
        let inner = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let current = *status.borrow_and_update();
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                Self::from_inner(inner).apply_status(current);
            }
        })
    }

    fn spawn_poll_task(&self) -> JoinHandle<Result<()>> {
        let inner = Arc::downgrade(&self.inner);
        let interval = self.inner.timings.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    return Ok(());
                };
                let projector = Self::from_inner(inner);
                tracing::debug!(key = %projector.inner.key, "Sending poll");

                match projector.poll() {
                    Ok(()) => {}
                    Err(e) if e.is_transient() => {
                        tracing::warn!(key = %projector.inner.key, error = %e, "Poll not sent");
                    }
                    Err(e) => {
                        tracing::error!(key = %projector.inner.key, error = %e, "Poll failed, stopping poll timer");
                        return Err(e);
                    }
                }
            }
        })
    }

    fn start_warmup_timer(&self) {
        let inner = Arc::downgrade(&self.inner);
        let duration = self.inner.timings.warmup;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                Self::from_inner(inner).finish_warmup();
            }
        });
        if let Some(previous) = self.inner.tasks.lock().warmup.replace(handle) {
            previous.abort();
        }
    }

    fn start_cooldown_timer(&self) {
        let inner = Arc::downgrade(&self.inner);
        let duration = self.inner.timings.cooldown;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                Self::from_inner(inner).finish_cooldown();
            }
        });
        if let Some(previous) = self.inner.tasks.lock().cooldown.replace(handle) {
            previous.abort();
        }
    }

    fn finish_warmup(&self) {
        tracing::info!(key = %self.inner.key, "Warm-up complete");
        self.update(&[
            StateChange::Warming(false),
            StateChange::Power(PowerState::On),
        ]);

        for action in self.inner.callbacks.take_warmed_up() {
            action();
        }
    }

    fn finish_cooldown(&self) {
        tracing::info!(key = %self.inner.key, "Cool-down complete");
        self.update(&[
            StateChange::Power(PowerState::Off),
            StateChange::Cooling(false),
        ]);
    }

    fn spawn_connect(&self) {
        let transport = Arc::clone(self.inner.dispatcher.transport());
        let key = self.inner.key.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.connect().await {
                tracing::warn!(key = %key, error = %e, "Connect failed");
            }
        });
    }

    fn spawn_disconnect(&self) {
        let transport = Arc::clone(self.inner.dispatcher.transport());
        let key = self.inner.key.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.disconnect().await {
                tracing::warn!(key = %key, error = %e, "Disconnect failed");
            }
        });
    }
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("key", &self.inner.key)
            .field("mode", &self.inner.dispatcher.mode())
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

impl PowerControllable for Projector {
    fn power_on(&self) -> Result<()> {
        Projector::power_on(self)
    }

    fn power_off(&self) -> Result<()> {
        Projector::power_off(self)
    }

    fn power_toggle(&self) -> Result<()> {
        Projector::power_toggle(self)
    }

    fn power_state(&self) -> PowerState {
        Projector::power_state(self)
    }
}

impl InputSelectable for Projector {
    fn current_input(&self) -> Input {
        Projector::current_input(self)
    }

    fn select_input(&self, key: u8) -> Result<()> {
        let input = self.input_for_key(key)?;
        self.set_input(input)
    }
}

impl Pollable for Projector {
    fn poll(&self) -> Result<()> {
        Projector::poll(self)
    }
}

impl FeedbackEmitting for Projector {
    fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_power_changed(callback)
    }

    fn on_warming_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_warming_changed(callback)
    }

    fn on_cooling_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_cooling_changed(callback)
    }

    fn on_input_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Input) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_input_changed(callback)
    }

    fn on_connection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_connection_changed(callback)
    }

    fn on_online_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_online_changed(callback)
    }

    fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(CommunicationStatus) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_status_changed(callback)
    }

    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::protocol::mock::MockTransport;
    use crate::protocol::{Authenticator, Credentials, Transport};

    fn network(transport: &Arc<MockTransport>) -> Projector {
        ProjectorBuilder::new("test", ProjectorConfig::tcp("127.0.0.1"))
            .with_transport(transport.clone())
            .build()
            .unwrap()
    }

    fn serial(transport: &Arc<MockTransport>) -> Projector {
        ProjectorBuilder::new("test", ProjectorConfig::serial("/dev/null"))
            .with_transport(transport.clone())
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_warms_up_then_turns_on() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.power_on().unwrap();
        assert!(projector.is_warming());
        assert_eq!(projector.power_state(), PowerState::Off);
        assert_eq!(transport.sent(), vec!["00PON\r"]);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(projector.is_warming());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!projector.is_warming());
        assert_eq!(projector.power_state(), PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_is_gated() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.power_on().unwrap();
        projector.power_on().unwrap();
        projector.power_off().unwrap();
        assert_eq!(transport.sent().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        projector.power_on().unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn power_off_cools_down() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.update(&[StateChange::Power(PowerState::On)]);

        projector.power_off().unwrap();
        assert!(projector.is_cooling());
        assert!(projector.power_state().is_on());
        assert_eq!(transport.sent(), vec!["00POF\r"]);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(!projector.is_cooling());
        assert_eq!(projector.power_state(), PowerState::Off);
    }

    #[tokio::test]
    async fn power_toggle_is_not_gated() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.power_toggle().unwrap();
        projector.power_toggle().unwrap();
        assert_eq!(transport.sent(), vec!["00PON\r", "00PON\r"]);
        assert!(!projector.is_warming());
    }

    #[tokio::test]
    async fn failed_power_on_rolls_back() {
        let transport = MockTransport::connected();
        let projector = ProjectorBuilder::new("test", ProjectorConfig::tcp("127.0.0.1"))
            .with_transport(transport.clone())
            .with_queue_capacity(0)
            .build()
            .unwrap();
        transport.set_connected(false);

        assert!(projector.power_on().is_err());
        assert!(!projector.is_warming());
        assert!(!projector.state().ignores_power_on_feedback());
    }

    #[tokio::test]
    async fn power_on_echo_is_ignored_once() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.power_on().unwrap();

        projector.poll().unwrap();
        projector.handle_line("001");
        assert_eq!(projector.power_state(), PowerState::Off);
        assert!(!projector.state().ignores_power_on_feedback());

        projector.poll().unwrap();
        projector.handle_line("001");
        assert_eq!(projector.power_state(), PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn off_reply_during_warmup_keeps_ignore_flag() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.power_on().unwrap();

        projector.poll().unwrap();
        projector.handle_line("000");
        assert_eq!(projector.power_state(), PowerState::Off);
        assert!(projector.is_warming());
        assert!(projector.state().ignores_power_on_feedback());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(projector.power_state(), PowerState::On);
        assert!(!projector.is_warming());
    }

    #[tokio::test(start_paused = true)]
    async fn lagged_worker_resyncs_connection() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.initialize();
        projector.handle_line("NTCONTROL 1 12345678");
        assert!(!projector.dispatcher().token().is_empty());

        // The disconnect is pushed out of the channel before the worker runs
        transport.set_connected(false);
        transport.emit(TransportEvent::ConnectionChanged(false));
        for _ in 0..crate::protocol::EVENT_CHANNEL_CAPACITY {
            transport.emit(TransportEvent::LineReceived("noise".to_string()));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(projector.dispatcher().token().is_empty());

        projector.poll().unwrap();
        tokio::task::yield_now().await;
        assert_eq!(transport.connect_calls(), 1);
        projector.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn set_input_is_optimistic() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.set_input(Input::Hd1).unwrap();
        assert_eq!(projector.current_input(), Input::Hd1);
        assert_eq!(transport.sent(), vec!["00IIS:HD1\r"]);

        projector.handle_line("00IIS:HD2");
        assert_eq!(projector.current_input(), Input::Hd2);
        assert!(projector.is_selected(7));
    }

    #[tokio::test]
    async fn set_input_none_is_rejected() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        let err = projector.set_input(Input::None).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Value(ValueError::InvalidInput(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn select_input_by_key() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.select_input(9).unwrap();
        assert_eq!(projector.current_input(), Input::Dl1);
        assert!(projector.select_input(0).is_err());
    }

    #[tokio::test]
    async fn serial_commands_carry_identifier() {
        let transport = MockTransport::connected();
        let projector = serial(&transport);

        projector.poll().unwrap();
        assert_eq!(transport.sent(), vec!["\u{2}ADZZ;QPW\u{3}"]);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_switch_runs_after_warmup() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        let runs = Arc::new(AtomicU32::new(0));

        let counter = runs.clone();
        projector
            .execute_switch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(projector.is_warming());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        projector.update(&[StateChange::Power(PowerState::Off)]);
        projector.power_on().unwrap();
        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_switch_runs_now_when_on() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.update(&[StateChange::Power(PowerState::On)]);
        let runs = Arc::new(AtomicU32::new(0));

        let counter = runs.clone();
        projector
            .execute_switch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn challenge_authenticates_queued_command() {
        let transport = MockTransport::disconnected();
        let dispatcher = Dispatcher::new(
            transport.clone(),
            DispatchMode::Handshake,
            Authenticator::Digest(Credentials::new("admin", "pass")),
        );
        let projector = Projector::new(
            "test".to_string(),
            Box::new(crate::command::NetworkCommandBuilder::new()),
            dispatcher,
            CommunicationMonitor::new(),
            Timings::from_config(&ProjectorConfig::tcp("127.0.0.1")),
        );

        projector.poll().unwrap();
        assert!(transport.sent().is_empty());

        transport.set_connected(true);
        projector.handle_connection_change(true);
        projector.handle_line("NTCONTROL 1 12345678");

        let token = projector.dispatcher().token();
        assert!(!token.is_empty());
        assert_eq!(transport.sent(), vec![format!("{}00QPW\r", token.as_str())]);
        assert!(projector.state().is_connected());
    }

    #[tokio::test]
    async fn replies_record_activity() {
        let transport = MockTransport::connected();
        let projector = network(&transport);

        projector.handle_line("anything");
        assert_eq!(projector.monitor().status(), CommunicationStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn event_worker_processes_lines() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.initialize();

        projector.poll().unwrap();
        transport.emit(TransportEvent::LineReceived("001".to_string()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(projector.power_state(), PowerState::On);
        assert!(projector.is_online());
        projector.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_timer_sends_queries() {
        let transport = MockTransport::connected();
        let projector = network(&transport);
        projector.initialize();

        tokio::time::sleep(Duration::from_secs(49)).await;
        assert!(transport.sent().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.sent(), vec!["00QPW\r"]);
        projector.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn set_connected_spawns_connect_and_disconnect() {
        let transport = MockTransport::disconnected();
        let projector = network(&transport);

        projector.set_connected(true);
        tokio::task::yield_now().await;
        assert_eq!(transport.connect_calls(), 1);
        assert!(projector.monitor().is_running());

        projector.set_connected(false);
        tokio::task::yield_now().await;
        assert_eq!(transport.disconnect_calls(), 1);
        assert!(!projector.monitor().is_running());
        assert!(!projector.is_connected());
        assert!(!transport.is_connected());
    }
}
