// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport specific command framing.

use crate::command::Command;

/// Formats commands into wire strings for one transport.
///
/// Formatting is total: any name and parameter produce a string. Callers are
/// responsible for only using command names the projector understands.
pub trait CommandBuilder: Send + Sync {
    /// Returns the line delimiter of this transport.
    ///
    /// Replies from the projector are terminated by the same delimiter.
    fn delimiter(&self) -> &str;

    /// Formats a command without parameter.
    fn format(&self, name: &str) -> String;

    /// Formats a command with a parameter.
    fn format_with(&self, name: &str, parameter: &str) -> String;

    /// Formats a typed command.
    fn build(&self, command: &dyn Command) -> String {
        match command.parameter() {
            Some(parameter) => self.format_with(command.name(), &parameter),
            None => self.format(command.name()),
        }
    }
}

/// Framing for RS-232 control.
///
/// Format: `STX "AD" <id> ";" <name> [":" <param>] ETX`.
///
/// # Examples
///
/// ```
/// use panaproj_lib::command::{CommandBuilder, SerialCommandBuilder};
///
/// let builder = SerialCommandBuilder::new("");
/// assert_eq!(builder.id(), "ZZ");
/// assert_eq!(builder.format("QPW"), "\u{2}ADZZ;QPW\u{3}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialCommandBuilder {
    id: String,
}

impl SerialCommandBuilder {
    /// Start of text.
    pub const STX: char = '\u{2}';
    /// End of text, also the line delimiter.
    pub const ETX: &'static str = "\u{3}";
    /// Identifier addressing every projector on the bus.
    pub const BROADCAST_ID: &'static str = "ZZ";

    /// Creates a builder for the projector with the given identifier.
    ///
    /// An empty identifier selects [`BROADCAST_ID`](Self::BROADCAST_ID).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let id = if id.trim().is_empty() {
            Self::BROADCAST_ID.to_string()
        } else {
            id.trim().to_string()
        };
        Self { id }
    }

    /// Returns the device identifier embedded in every command.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CommandBuilder for SerialCommandBuilder {
    fn delimiter(&self) -> &str {
        Self::ETX
    }

    fn format(&self, name: &str) -> String {
        format!("{}AD{};{name}{}", Self::STX, self.id, Self::ETX)
    }

    fn format_with(&self, name: &str, parameter: &str) -> String {
        format!("{}AD{};{name}:{parameter}{}", Self::STX, self.id, Self::ETX)
    }
}

/// Framing for NTCONTROL over TCP.
///
/// Format: `"00" <name> [":" <param>] CR`. The session token, when one is
/// established, is prepended by the dispatcher rather than here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkCommandBuilder;

impl NetworkCommandBuilder {
    /// Carriage return, the line delimiter.
    pub const CR: &'static str = "\r";
    /// Header preceding every command.
    pub const HEADER: &'static str = "00";

    /// Creates a network builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandBuilder for NetworkCommandBuilder {
    fn delimiter(&self) -> &str {
        Self::CR
    }

    fn format(&self, name: &str) -> String {
        format!("{}{name}{}", Self::HEADER, Self::CR)
    }

    fn format_with(&self, name: &str, parameter: &str) -> String {
        format!("{}{name}:{parameter}{}", Self::HEADER, Self::CR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ProjectorCommand;
    use crate::types::Input;

    const NAMES: [&str; 4] = ["PON", "POF", "QPW", "IIS"];

    #[test]
    fn serial_always_carries_id_and_etx() {
        let builder = SerialCommandBuilder::new("07");
        for name in NAMES {
            let plain = builder.format(name);
            let with = builder.format_with(name, "HD1");
            for wire in [plain, with] {
                assert!(wire.starts_with("\u{2}AD07;"), "{wire:?}");
                assert!(wire.ends_with(builder.delimiter()), "{wire:?}");
            }
        }
    }

    #[test]
    fn network_never_carries_id() {
        let serial = SerialCommandBuilder::new("07");
        let builder = NetworkCommandBuilder::new();
        for name in NAMES {
            let wire = builder.format(name);
            assert!(!wire.contains(serial.id()));
            assert!(!wire.contains(serial.delimiter()));
            assert_eq!(wire, format!("00{name}\r"));
        }
    }

    #[test]
    fn delimiters_differ() {
        assert_ne!(
            SerialCommandBuilder::new("ZZ").delimiter(),
            NetworkCommandBuilder::new().delimiter()
        );
    }

    #[test]
    fn build_typed_commands() {
        let builder = SerialCommandBuilder::new("ZZ");
        assert_eq!(
            builder.build(&ProjectorCommand::SelectInput(Input::Dvi)),
            "\u{2}ADZZ;IIS:DVI\u{3}"
        );
        assert_eq!(
            NetworkCommandBuilder::new().build(&ProjectorCommand::QueryPower),
            "00QPW\r"
        );
    }

    #[test]
    fn blank_id_is_broadcast() {
        assert_eq!(SerialCommandBuilder::new("  ").id(), "ZZ");
        assert_eq!(SerialCommandBuilder::new(" 01 ").id(), "01");
    }
}
