// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Passive communication monitor.
//!
//! The monitor does not talk to the projector. It watches received traffic
//! (driven by the regular power poll) and derives a [`CommunicationStatus`]
//! from how long the line has been quiet.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Quiet time after which the status becomes [`CommunicationStatus::Warning`].
pub const DEFAULT_WARNING_THRESHOLD: Duration = Duration::from_secs(60);

/// Quiet time after which the status becomes [`CommunicationStatus::Error`].
pub const DEFAULT_ERROR_THRESHOLD: Duration = Duration::from_secs(120);

/// How often the monitor re-evaluates the status.
const CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Health of the communication with the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommunicationStatus {
    /// Nothing heard yet.
    #[default]
    Unknown,
    /// Traffic seen recently.
    Ok,
    /// Quiet for longer than the warning threshold.
    Warning,
    /// Quiet for longer than the error threshold.
    Error,
}

impl CommunicationStatus {
    /// Returns the numeric status code reported to bridges.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Ok => 1,
            Self::Warning => 2,
            Self::Error => 3,
        }
    }

    /// Returns `true` for [`Ok`](Self::Ok) and [`Warning`](Self::Warning).
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Ok | Self::Warning)
    }
}

#[derive(Debug, Default)]
struct Activity {
    started: Option<Instant>,
    last_seen: Option<Instant>,
}

/// Watches traffic and reports a [`CommunicationStatus`].
///
/// # Examples
///
/// ```
/// use panaproj_lib::monitor::{CommunicationMonitor, CommunicationStatus};
///
/// let monitor = CommunicationMonitor::new();
/// assert_eq!(monitor.status(), CommunicationStatus::Unknown);
///
/// monitor.record_activity();
/// assert_eq!(monitor.status(), CommunicationStatus::Ok);
/// ```
#[derive(Debug)]
pub struct CommunicationMonitor {
    warning: Duration,
    error: Duration,
    activity: Mutex<Activity>,
    status: watch::Sender<CommunicationStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CommunicationMonitor {
    /// Creates a monitor with the default thresholds.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_thresholds(DEFAULT_WARNING_THRESHOLD, DEFAULT_ERROR_THRESHOLD)
    }

    /// Creates a monitor with custom thresholds.
    #[must_use]
    pub fn with_thresholds(warning: Duration, error: Duration) -> Arc<Self> {
        let (status, _) = watch::channel(CommunicationStatus::Unknown);
        Arc::new(Self {
            warning,
            error,
            activity: Mutex::new(Activity::default()),
            status,
            task: Mutex::new(None),
        })
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> CommunicationStatus {
        *self.status.borrow()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CommunicationStatus> {
        self.status.subscribe()
    }

    /// Returns `true` while the periodic check is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Records that something was received from the projector.
    pub fn record_activity(&self) {
        let now = Instant::now();
        self.activity.lock().last_seen = Some(now);
        self.evaluate(now);
    }

    /// Starts the periodic check. Does nothing if already running.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        self.activity.lock().started = Some(Instant::now());

        let monitor: Weak<Self> = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CHECK_INTERVAL);
            loop {
                ticker.tick().await;
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                monitor.evaluate(Instant::now());
            }
        }));
        tracing::debug!("Communication monitor started");
    }

    /// Stops the periodic check. The last status is kept.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::debug!("Communication monitor stopped");
        }
    }

    fn evaluate(&self, now: Instant) {
        let next = {
            let activity = self.activity.lock();
            match (activity.last_seen, activity.started) {
                (Some(seen), _) => {
                    let quiet = now.saturating_duration_since(seen);
                    if quiet >= self.error {
                        CommunicationStatus::Error
                    } else if quiet >= self.warning {
                        CommunicationStatus::Warning
                    } else {
                        CommunicationStatus::Ok
                    }
                }
                (None, Some(started)) if now.saturating_duration_since(started) >= self.error => {
                    CommunicationStatus::Error
                }
                _ => CommunicationStatus::Unknown,
            }
        };

        self.status.send_if_modified(|status| {
            if *status == next {
                false
            } else {
                tracing::debug!(from = ?*status, to = ?next, "Communication status changed");
                *status = next;
                true
            }
        });
    }
}

impl Drop for CommunicationMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
