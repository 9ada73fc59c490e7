//! Line protocol spoken by the plant controller.
//!
//! Commands are single newline-terminated ASCII tokens. The board answers with
//! free text whenever it is done; there is no length prefix, checksum or
//! correlation id, so only one command may be outstanding at a time.

use std::time::Duration;

/// Printed by the controller once a watering cycle has finished.
pub const PUMP_DONE_MARKER: &str = "ACK:PUMP_DONE";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ask for sensor readings.
    Status,
    /// Run one watering cycle.
    Pump,
}

impl Command {
    pub fn token(self) -> &'static str {
        match self {
            Command::Status => "STATUS",
            Command::Pump => "PUMP",
        }
    }

    /// How long to wait before collecting the reply. Covers a full pump cycle
    /// for `Pump`.
    pub fn default_wait(self) -> Duration {
        match self {
            Command::Status => Duration::from_secs(1),
            Command::Pump => Duration::from_secs(4),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Acknowledged(String),
    UnrecognizedReply(String),
    Silence,
}

impl CommandOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            CommandOutcome::Acknowledged(text) | CommandOutcome::UnrecognizedReply(text) => {
                Some(text)
            }
            CommandOutcome::Silence => None,
        }
    }
}

/// Lossy UTF-8 decode; undecodable bytes become U+FFFD instead of failing.
pub fn decode_reply(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

pub fn classify_reply<S: AsRef<str>>(text: String, markers: &[S]) -> CommandOutcome {
    if markers.iter().any(|m| text.contains(m.as_ref())) {
        CommandOutcome::Acknowledged(text)
    } else if !text.is_empty() {
        CommandOutcome::UnrecognizedReply(text)
    } else {
        CommandOutcome::Silence
    }
}

/// Validates a command and appends the terminating newline.
pub(crate) fn frame_line(line: &str) -> Option<Vec<u8>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line.contains(['\r', '\n']) {
        return None;
    }
    let mut framed = Vec::with_capacity(line.len() + 1);
    framed.extend_from_slice(line.as_bytes());
    framed.push(b'\n');
    Some(framed)
}
