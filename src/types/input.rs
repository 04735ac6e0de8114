// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projector input sources.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// An input source of the projector.
///
/// The wire name is the upper-case variant name (`HD1`, `RG1`, ...). Parsing
/// accepts the name in any case or the numeric code.
///
/// # Examples
///
/// ```
/// use panaproj_lib::types::Input;
///
/// let input: Input = "hd1".parse().unwrap();
/// assert_eq!(input, Input::Hd1);
/// assert_eq!(input.as_str(), "HD1");
/// assert_eq!(input.code(), 6);
///
/// // Numeric codes are accepted too
/// assert_eq!("9".parse::<Input>().unwrap(), Input::Dl1);
///
/// // Unknown names fall back to `None` when parsing leniently
/// assert_eq!(Input::parse_lenient("XYZ"), Input::None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Input {
    /// No input known or selected.
    #[default]
    None,
    /// Computer 1 (RGB 1).
    Rg1,
    /// Computer 2 (RGB 2).
    Rg2,
    /// Composite video.
    Vid,
    /// S-Video.
    Svd,
    /// DVI-D.
    Dvi,
    /// HDMI 1.
    Hd1,
    /// HDMI 2.
    Hd2,
    /// SDI.
    Sd1,
    /// `DIGITAL LINK`.
    Dl1,
}

impl Input {
    /// All selectable inputs, in code order.
    pub const SELECTABLE: [Self; 9] = [
        Self::Rg1,
        Self::Rg2,
        Self::Vid,
        Self::Svd,
        Self::Dvi,
        Self::Hd1,
        Self::Hd2,
        Self::Sd1,
        Self::Dl1,
    ];

    /// Returns the protocol name of the input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Rg1 => "RG1",
            Self::Rg2 => "RG2",
            Self::Vid => "VID",
            Self::Svd => "SVD",
            Self::Dvi => "DVI",
            Self::Hd1 => "HD1",
            Self::Hd2 => "HD2",
            Self::Sd1 => "SD1",
            Self::Dl1 => "DL1",
        }
    }

    /// Returns the numeric code of the input (0 for [`Input::None`]).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rg1 => 1,
            Self::Rg2 => 2,
            Self::Vid => 3,
            Self::Svd => 4,
            Self::Dvi => 5,
            Self::Hd1 => 6,
            Self::Hd2 => 7,
            Self::Sd1 => 8,
            Self::Dl1 => 9,
        }
    }

    /// Looks up an input by numeric code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            _ => Self::SELECTABLE.get(usize::from(code) - 1).copied(),
        }
    }

    /// Parses an input, substituting [`Input::None`] for anything unknown.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Returns `true` unless this is [`Input::None`].
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Input {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| ValueError::InvalidInput(s.to_string()));
        }

        std::iter::once(Self::None)
            .chain(Self::SELECTABLE)
            .find(|input| input.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValueError::InvalidInput(s.to_string()))
    }
}

/// A selectable input with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDescriptor {
    /// Stable selection key (equal to the input code).
    pub key: u8,
    /// Human readable name.
    pub name: &'static str,
    /// The input this descriptor selects.
    pub input: Input,
}

/// The input descriptors of a projector, ordered by key.
pub const INPUT_DESCRIPTORS: [InputDescriptor; 9] = [
    InputDescriptor { key: 1, name: "Computer 1", input: Input::Rg1 },
    InputDescriptor { key: 2, name: "Computer 2", input: Input::Rg2 },
    InputDescriptor { key: 3, name: "Video", input: Input::Vid },
    InputDescriptor { key: 4, name: "S-Video", input: Input::Svd },
    InputDescriptor { key: 5, name: "DVI", input: Input::Dvi },
    InputDescriptor { key: 6, name: "HDMI 1", input: Input::Hd1 },
    InputDescriptor { key: 7, name: "HDMI 2", input: Input::Hd2 },
    InputDescriptor { key: 8, name: "SDI", input: Input::Sd1 },
    InputDescriptor { key: 9, name: "Digital Link", input: Input::Dl1 },
];
