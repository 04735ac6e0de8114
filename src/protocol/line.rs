// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delimiter based line splitting.

/// Longest partial line kept while waiting for a delimiter.
const MAX_PENDING_BYTES: usize = 4096;

/// Accumulates received bytes and yields complete delimited lines.
///
/// Reads from a socket or serial port arrive in arbitrary chunks; the
/// gatherer buffers the tail until the delimiter shows up. Delimiters may be
/// split across chunks.
///
/// # Examples
///
/// ```
/// use panaproj_lib::protocol::LineGatherer;
///
/// let mut gatherer = LineGatherer::new("\r");
/// assert!(gatherer.push(b"NTCONTROL 1 ").is_empty());
/// assert_eq!(gatherer.push(b"0a1b2c3d\r00"), vec!["NTCONTROL 1 0a1b2c3d"]);
/// assert_eq!(gatherer.push(b"001\r"), vec!["00001"]);
/// ```
#[derive(Debug, Clone)]
pub struct LineGatherer {
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
}

impl LineGatherer {
    /// Creates a gatherer splitting on `delimiter`.
    ///
    /// # Panics
    ///
    /// Panics if `delimiter` is empty.
    #[must_use]
    pub fn new(delimiter: &str) -> Self {
        assert!(!delimiter.is_empty(), "line delimiter must not be empty");
        Self {
            delimiter: delimiter.as_bytes().to_vec(),
            buffer: Vec::new(),
        }
    }

    /// Adds received bytes and returns every line completed by them.
    ///
    /// Lines are decoded as UTF-8, replacing invalid sequences.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = find(&self.buffer, &self.delimiter) {
            let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
            self.buffer.drain(..pos + self.delimiter.len());
            lines.push(line);
        }

        if self.buffer.len() > MAX_PENDING_BYTES {
            tracing::warn!(
                discarded = self.buffer.len(),
                "No delimiter within receive limit, discarding partial line"
            );
            self.buffer.clear();
        }

        lines
    }

    /// Discards any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_lines_in_one_chunk() {
        let mut gatherer = LineGatherer::new("\u{3}");
        let lines = gatherer.push(b"\x02001\x03\x02PON\x03");
        assert_eq!(lines, vec!["\u{2}001", "\u{2}PON"]);
    }

    #[test]
    fn multi_byte_delimiter_across_chunks() {
        let mut gatherer = LineGatherer::new("\r\n");
        assert!(gatherer.push(b"hello\r").is_empty());
        assert_eq!(gatherer.push(b"\nworld\r\n"), vec!["hello", "world"]);
    }

    #[test]
    fn empty_lines_are_kept() {
        let mut gatherer = LineGatherer::new("\r");
        assert_eq!(gatherer.push(b"\r\r"), vec!["", ""]);
    }

    #[test]
    fn oversized_partial_line_is_dropped() {
        let mut gatherer = LineGatherer::new("\r");
        let junk = vec![b'x'; MAX_PENDING_BYTES + 1];
        assert!(gatherer.push(&junk).is_empty());
        assert_eq!(gatherer.push(b"ok\r"), vec!["ok"]);
    }

    #[test]
    fn clear_discards_partial() {
        let mut gatherer = LineGatherer::new("\r");
        gatherer.push(b"partial");
        gatherer.clear();
        assert_eq!(gatherer.push(b"line\r"), vec!["line"]);
    }
}
