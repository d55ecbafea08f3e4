// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The three-line booking status block at the end of assistant replies.
//!
//! ```text
//! Service: Haircut
//! Master: Anna
//! Time: 15:00
//! ```
//!
//! Lines must appear in this order with no blank lines between them. A value
//! of `?` means the field has not been determined yet. The block must close
//! the message: only blank lines, or a line holding the configured trailer
//! (the final announcement phrase), may follow it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field value meaning "not yet determined".
pub const UNKNOWN_MARKER: &str = "?";

/// Separator between field values inside a [`BookingSignature`].
pub const SIGNATURE_SEPARATOR: &str = "||";

/// The three line labels, in the deployment's language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabels {
    pub service: String,
    pub master: String,
    pub time: String,
}

impl StatusLabels {
    pub fn new(
        service: impl Into<String>,
        master: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            master: master.into(),
            time: time.into(),
        }
    }

    fn ordered(&self) -> [&str; 3] {
        [&self.service, &self.master, &self.time]
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self::new("Service", "Master", "Time")
    }
}

/// A parsed status block. Values are the trimmed raw field text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatus {
    pub service: String,
    pub master: String,
    pub time: String,
}

impl BookingStatus {
    pub fn new(
        service: impl Into<String>,
        master: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            master: master.into(),
            time: time.into(),
        }
    }

    /// A status is complete when no field is empty or the unknown marker.
    pub fn is_complete(&self) -> bool {
        [&self.service, &self.master, &self.time]
            .iter()
            .all(|value| is_determined(value))
    }

    /// The master value, if it has been determined.
    pub fn master_if_known(&self) -> Option<&str> {
        is_determined(&self.master).then_some(self.master.as_str())
    }

    pub fn signature(&self) -> BookingSignature {
        BookingSignature(
            [
                self.service.as_str(),
                self.master.as_str(),
                self.time.as_str(),
            ]
            .join(SIGNATURE_SEPARATOR),
        )
    }
}

fn is_determined(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN_MARKER
}

/// Identity of a booking draft. Two statuses are the same draft iff their
/// signatures are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingSignature(String);

impl BookingSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds, removes, and renders the status block.
#[derive(Debug, Clone, Default)]
pub struct StatusBlockCodec {
    labels: StatusLabels,
    trailer: Option<String>,
}

impl StatusBlockCodec {
    pub fn new(labels: StatusLabels) -> Self {
        Self {
            labels,
            trailer: None,
        }
    }

    /// Allows lines equal to `trailer` after the block. An empty trailer
    /// allows nothing but blank lines.
    pub fn with_trailer(mut self, trailer: impl Into<String>) -> Self {
        let trailer = trailer.into().trim().to_string();
        self.trailer = (!trailer.is_empty()).then_some(trailer);
        self
    }

    pub fn labels(&self) -> &StatusLabels {
        &self.labels
    }

    /// Parses the last status window in `text`.
    ///
    /// `None` means "no structured status present"; it is never an error.
    pub fn parse(&self, text: &str) -> Option<BookingStatus> {
        let lines: Vec<&str> = text.lines().collect();
        let start = self.locate(&lines)?;
        let [service, master, time] = self.window_values(&lines[start..start + 3])?;
        Some(BookingStatus::new(service, master, time))
    }

    /// Removes exactly the three-line window, or returns `text` unchanged.
    pub fn strip(&self, text: &str) -> String {
        let lines: Vec<&str> = text.lines().collect();
        match self.locate(&lines) {
            Some(start) => lines[..start]
                .iter()
                .chain(&lines[start + 3..])
                .copied()
                .collect::<Vec<_>>()
                .join("\n"),
            None => text.to_string(),
        }
    }

    /// Start index of the trailing status window, scanning backward past
    /// blank and trailer lines.
    pub fn locate(&self, lines: &[&str]) -> Option<usize> {
        let end = lines
            .iter()
            .rposition(|line| !self.is_tail_line(line))
            .map_or(0, |last| last + 1);
        let start = end.checked_sub(3)?;
        self.window_values(&lines[start..end]).map(|_| start)
    }

    fn is_tail_line(&self, line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || self.trailer.as_deref() == Some(line)
    }

    /// Renders a status back into its three lines.
    pub fn render(&self, status: &BookingStatus) -> String {
        let [service, master, time] = self.labels.ordered();
        format!(
            "{service}: {}\n{master}: {}\n{time}: {}",
            status.service, status.master, status.time
        )
    }

    /// Whether `line` looks like any status line. Used as a paragraph boundary.
    pub fn is_status_line(&self, line: &str) -> bool {
        self.labels
            .ordered()
            .iter()
            .any(|label| field_value(line, label).is_some())
    }

    fn window_values<'a>(&self, window: &[&'a str]) -> Option<[&'a str; 3]> {
        let [service, master, time] = self.labels.ordered();
        Some([
            field_value(window[0], service)?,
            field_value(window[1], master)?,
            field_value(window[2], time)?,
        ])
    }
}

/// `"<label>: value"` yields the trimmed value, which may be empty.
fn field_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.trim()
        .strip_prefix(label)?
        .strip_prefix(':')
        .map(str::trim)
}
