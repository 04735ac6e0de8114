// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interpretation of received lines.
//!
//! Projector replies carry no command name, so a line is interpreted by
//! looking at the single command currently pending. Greeting lines are
//! recognized regardless of what is pending because they arrive unsolicited
//! on every new connection.

use crate::command::CommandCategory;
use crate::protocol::{Authenticator, PendingCommand};
use crate::types::{Input, PowerState};

/// Reply prefix echoed by an input selection.
const INPUT_REPLY_PREFIX: &str = "iis:";

/// The meaning of one received line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// An authentication challenge carrying its random value.
    ///
    /// `None` when the greeting was malformed and had no random value.
    Challenge(Option<String>),
    /// A greeting announcing that no authentication is required.
    NoChallenge,
    /// A power query reply.
    Power(PowerState),
    /// An input selection reply.
    Input(Input),
    /// Anything else: unsolicited noise or a reply nobody waits for.
    Discarded,
}

/// Classifies `line` given the currently pending command.
///
/// # Examples
///
/// ```
/// use panaproj_lib::protocol::{PendingCommand, Reply, classify};
/// use panaproj_lib::types::{Input, PowerState};
///
/// let query = PendingCommand::new("00QPW\r");
/// assert_eq!(classify("00001", Some(&query)), Reply::Power(PowerState::On));
///
/// let select = PendingCommand::new("00IIS:HD1\r");
/// assert_eq!(classify("00IIS:HD2", Some(&select)), Reply::Input(Input::Hd2));
///
/// assert_eq!(classify("00001", None), Reply::Discarded);
/// assert_eq!(classify("NTCONTROL 0", None), Reply::NoChallenge);
/// ```
#[must_use]
pub fn classify(line: &str, pending: Option<&PendingCommand>) -> Reply {
    if Authenticator::is_challenge(line) {
        return Reply::Challenge(Authenticator::challenge_random(line).map(str::to_string));
    }

    if Authenticator::is_no_challenge(line) {
        return Reply::NoChallenge;
    }

    let Some(pending) = pending else {
        return Reply::Discarded;
    };

    match pending.category() {
        CommandCategory::PowerQuery => Reply::Power(PowerState::from_feedback(line)),
        CommandCategory::InputSelect => Reply::Input(Input::parse_lenient(input_payload(line))),
        CommandCategory::Other => Reply::Discarded,
    }
}

/// Strips the input reply prefix and surrounding framing from a line.
fn input_payload(line: &str) -> &str {
    let payload = match line.to_ascii_lowercase().find(INPUT_REPLY_PREFIX) {
        Some(pos) => &line[pos + INPUT_REPLY_PREFIX.len()..],
        None => line,
    };
    payload.trim_matches(|c: char| c.is_whitespace() || c.is_control())
}
