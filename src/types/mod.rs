// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.

mod input;
mod power;

pub use input::{INPUT_DESCRIPTORS, Input, InputDescriptor};
pub use power::PowerState;
