// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of a projector.

use std::fmt;

/// Represents the lamp power state of a projector.
///
/// The projector itself reports more than two states (e.g. cooling down),
/// but replies are folded into on/off: anything that is not recognized as
/// "on" counts as "off".
///
/// # Examples
///
/// ```
/// use panaproj_lib::types::PowerState;
///
/// assert_eq!(PowerState::from_feedback("001"), PowerState::On);
/// assert_eq!(PowerState::from_feedback("00PON"), PowerState::On);
/// assert_eq!(PowerState::from_feedback("000"), PowerState::Off);
/// assert_eq!(PowerState::from_feedback("ER401"), PowerState::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    /// Power is off (standby).
    #[default]
    Off,
    /// Power is on.
    On,
}

impl PowerState {
    /// Numeric reply code for "on".
    pub const ON_CODE: &'static str = "001";

    /// Text reply token for "on" (matched case-insensitively).
    pub const ON_TOKEN: &'static str = "pon";

    /// Folds a power query reply into a power state.
    ///
    /// A reply is "on" when it contains [`ON_CODE`](Self::ON_CODE) or,
    /// ignoring case, [`ON_TOKEN`](Self::ON_TOKEN).
    #[must_use]
    pub fn from_feedback(reply: &str) -> Self {
        let on = reply.contains(Self::ON_CODE) || reply.to_lowercase().contains(Self::ON_TOKEN);
        Self::from(on)
    }

    /// Returns `true` if the power is on.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns the opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("OFF"),
            Self::On => f.write_str("ON"),
        }
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_code_and_token() {
        assert!(PowerState::from_feedback("001").is_on());
        assert!(PowerState::from_feedback("\u{2}001").is_on());
        assert!(PowerState::from_feedback("PON").is_on());
        assert!(PowerState::from_feedback("00pon").is_on());
    }

    #[test]
    fn everything_else_is_off() {
        assert_eq!(PowerState::from_feedback("000"), PowerState::Off);
        assert_eq!(PowerState::from_feedback("POF"), PowerState::Off);
        assert_eq!(PowerState::from_feedback("00ER401"), PowerState::Off);
        assert_eq!(PowerState::from_feedback(""), PowerState::Off);
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(PowerState::On.toggled(), PowerState::Off);
        assert_eq!(PowerState::Off.toggled(), PowerState::On);
    }

    #[test]
    fn display() {
        assert_eq!(PowerState::On.to_string(), "ON");
        assert_eq!(PowerState::Off.to_string(), "OFF");
    }
}
