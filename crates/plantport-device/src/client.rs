use std::time::Duration;

use tracing::{debug, info};

use crate::protocol::frame_line;
use crate::{
    classify_reply, decode_reply, Command, CommandOutcome, DeviceError, DeviceResult,
    SerialSession, PUMP_DONE_MARKER,
};

/// Request/response client for the plant controller.
///
/// Every exchange is: drop stale input, write the command, sleep for a fixed
/// window, then read whatever arrived. The sleep never ends early, so callers
/// always pay the full window. `&mut self` keeps exchanges from overlapping.
/// Port I/O runs on tokio's blocking pool so a slow write never stalls the
/// runtime.
pub struct DeviceClient {
    session: SerialSession,
    markers: Vec<String>,
}

impl DeviceClient {
    pub fn new(session: SerialSession) -> Self {
        Self {
            session,
            markers: vec![PUMP_DONE_MARKER.to_string()],
        }
    }

    /// Replaces the acknowledgment markers recognized in replies.
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn session(&self) -> &SerialSession {
        &self.session
    }

    pub fn is_available(&self) -> bool {
        self.session.is_open()
    }

    pub async fn send(&mut self, command: Command) -> DeviceResult<CommandOutcome> {
        self.send_line(command.token(), command.default_wait()).await
    }

    pub async fn send_with_wait(
        &mut self,
        command: Command,
        wait: Duration,
    ) -> DeviceResult<CommandOutcome> {
        self.send_line(command.token(), wait).await
    }

    pub async fn send_line(&mut self, line: &str, wait: Duration) -> DeviceResult<CommandOutcome> {
        if !self.session.is_open() {
            return Err(self.session.unavailable());
        }
        let framed = frame_line(line).ok_or_else(|| DeviceError::InvalidCommand(line.to_string()))?;

        let port = self.session.port().to_string();
        self.session
            .with_link_blocking(move |link| {
                link.discard_input()?;
                link.write_all(&framed)
            })
            .await?;
        debug!(%port, command = line, wait_ms = wait.as_millis() as u64, "command sent");

        tokio::time::sleep(wait).await;

        let raw = self
            .session
            .with_link_blocking(|link| link.read_available())
            .await?;
        let outcome = classify_reply(decode_reply(&raw), &self.markers);

        match &outcome {
            CommandOutcome::Acknowledged(_) => info!(%port, command = line, "command acknowledged"),
            CommandOutcome::UnrecognizedReply(text) => {
                info!(%port, command = line, reply = %text, "device replied")
            }
            CommandOutcome::Silence => info!(%port, command = line, "no reply from device"),
        }
        Ok(outcome)
    }
}
