// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector command definitions and wire formatting.
//!
//! Commands are a three-letter name with an optional parameter. How they are
//! framed on the wire depends on the transport, which is the job of a
//! [`CommandBuilder`].
//!
//! # Available Commands
//!
//! | Command | Purpose | Wire name |
//! |---------|---------|-----------|
//! | [`ProjectorCommand::PowerOn`] | Turn the lamp on | `PON` |
//! | [`ProjectorCommand::PowerOff`] | Put the projector in standby | `POF` |
//! | [`ProjectorCommand::QueryPower`] | Query power state | `QPW` |
//! | [`ProjectorCommand::SelectInput`] | Switch input | `IIS:<input>` |
//!
//! # Examples
//!
//! ```
//! use panaproj_lib::command::{
//!     CommandBuilder, NetworkCommandBuilder, ProjectorCommand, SerialCommandBuilder,
//! };
//! use panaproj_lib::types::Input;
//!
//! let serial = SerialCommandBuilder::new("01");
//! assert_eq!(serial.build(&ProjectorCommand::PowerOn), "\u{2}AD01;PON\u{3}");
//!
//! let network = NetworkCommandBuilder::new();
//! let select = ProjectorCommand::SelectInput(Input::Hd1);
//! assert_eq!(network.build(&select), "00IIS:HD1\r");
//! ```

mod builder;

pub use builder::{CommandBuilder, NetworkCommandBuilder, SerialCommandBuilder};

use crate::types::Input;

/// A command that can be sent to a projector.
pub trait Command {
    /// Returns the command name, e.g. `"PON"`.
    fn name(&self) -> &'static str;

    /// Returns the command parameter, if any.
    fn parameter(&self) -> Option<String>;
}

/// The commands this driver issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorCommand {
    /// Turn the projector on.
    PowerOn,
    /// Put the projector in standby.
    PowerOff,
    /// Query the power state.
    QueryPower,
    /// Select an input.
    SelectInput(Input),
}

impl ProjectorCommand {
    /// Wire name of the power-on command.
    pub const POWER_ON: &'static str = "PON";
    /// Wire name of the power-off command.
    pub const POWER_OFF: &'static str = "POF";
    /// Wire name of the power query.
    pub const QUERY_POWER: &'static str = "QPW";
    /// Wire name of the input selection command.
    pub const SELECT_INPUT: &'static str = "IIS";
}

impl Command for ProjectorCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::PowerOn => Self::POWER_ON,
            Self::PowerOff => Self::POWER_OFF,
            Self::QueryPower => Self::QUERY_POWER,
            Self::SelectInput(_) => Self::SELECT_INPUT,
        }
    }

    fn parameter(&self) -> Option<String> {
        match self {
            Self::SelectInput(input) => Some(input.as_str().to_string()),
            _ => None,
        }
    }
}

/// What kind of reply a transmitted command expects.
///
/// Replies carry no command name, so the classifier interprets each line by
/// the category of the last command sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    /// A power query; the reply is a power state.
    PowerQuery,
    /// An input selection; the reply echoes the input.
    InputSelect,
    /// Anything else; the reply is ignored.
    Other,
}

impl CommandCategory {
    /// Derives the category from raw command text.
    ///
    /// Matching is by substring so it works on fully framed serial and
    /// network strings as well as bare names.
    #[must_use]
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("qpw") {
            Self::PowerQuery
        } else if lower.contains("iis") {
            Self::InputSelect
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_parameters() {
        assert_eq!(ProjectorCommand::PowerOn.name(), "PON");
        assert_eq!(ProjectorCommand::PowerOff.name(), "POF");
        assert_eq!(ProjectorCommand::QueryPower.parameter(), None);

        let select = ProjectorCommand::SelectInput(Input::Sd1);
        assert_eq!(select.name(), "IIS");
        assert_eq!(select.parameter(), Some("SD1".to_string()));
    }

    #[test]
    fn category_from_framed_text() {
        assert_eq!(
            CommandCategory::of("\u{2}ADZZ;QPW\u{3}"),
            CommandCategory::PowerQuery
        );
        assert_eq!(CommandCategory::of("00iis:HD1\r"), CommandCategory::InputSelect);
        assert_eq!(CommandCategory::of("00PON\r"), CommandCategory::Other);
    }
}
