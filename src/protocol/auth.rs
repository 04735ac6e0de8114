// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! NTCONTROL challenge/response authentication.
//!
//! When a projector requires authentication it greets each connection with
//! `NTCONTROL 1 <random>`. The client hashes `user:password:random` with MD5
//! and prefixes the result onto the command it sends on that connection.

use std::fmt;

use md5::{Digest, Md5};

/// Greeting marker of a connection that requires authentication.
const CHALLENGE_MARKER: &str = "ntcontrol 1";

/// Greeting marker of a connection without authentication.
const NO_CHALLENGE_MARKER: &str = "ntcontrol 0";

/// Login credentials of the projector.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session token prefixed onto every command of an authenticated connection.
///
/// The token is the raw 16 byte MD5 digest reinterpreted as UTF-8 text, with
/// invalid sequences replaced. An empty token means "send unmodified".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns an empty token.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Derives the token for a challenge.
    #[must_use]
    pub fn derive(credentials: &Credentials, random: &str) -> Self {
        let input = format!(
            "{}:{}:{random}",
            credentials.username, credentials.password
        );
        let digest = Md5::digest(input.as_bytes());
        Self(String::from_utf8_lossy(&digest).into_owned())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no token is established.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefixes the token onto a command.
    #[must_use]
    pub fn apply(&self, command: &str) -> String {
        format!("{}{command}", self.0)
    }

    /// Forgets the token.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Produces session tokens from greeting lines.
///
/// Serial control never sees a greeting, so it uses
/// [`Authenticator::Disabled`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authenticator {
    /// No authentication; every challenge yields an empty token.
    #[default]
    Disabled,
    /// MD5 digest authentication with the given credentials.
    Digest(Credentials),
}

impl Authenticator {
    /// Returns `true` if `line` is an authentication challenge.
    #[must_use]
    pub fn is_challenge(line: &str) -> bool {
        line.to_lowercase().contains(CHALLENGE_MARKER)
    }

    /// Returns `true` if `line` announces an unauthenticated session.
    #[must_use]
    pub fn is_no_challenge(line: &str) -> bool {
        line.to_lowercase().contains(NO_CHALLENGE_MARKER)
    }

    /// Extracts the random value of a challenge line.
    ///
    /// The greeting has the form `NTCONTROL 1 <random>`; the random value is
    /// the third space separated token.
    #[must_use]
    pub fn challenge_random(line: &str) -> Option<&str> {
        line.split(' ')
            .nth(2)
            .map(|random| random.trim_matches(|c: char| c.is_whitespace() || c.is_control()))
            .filter(|random| !random.is_empty())
    }

    /// Answers a challenge with a session token.
    #[must_use]
    pub fn respond(&self, random: &str) -> SessionToken {
        match self {
            Self::Disabled => SessionToken::empty(),
            Self::Digest(credentials) => SessionToken::derive(credentials, random),
        }
    }
}
