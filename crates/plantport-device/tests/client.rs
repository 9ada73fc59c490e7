use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use plantport_device::{
    classify_reply, decode_reply, Command, CommandOutcome, DeviceClient, DeviceError,
    SerialLink, SerialSession,
};
use tokio::time::Instant;

#[derive(Default)]
struct LinkState {
    /// Bytes waiting to be read.
    pending: Vec<u8>,
    /// Everything written by the client.
    written: Vec<u8>,
    /// Reply queued once a command has been written.
    reply: Vec<u8>,
    discards: usize,
    fail_writes: bool,
}

#[derive(Clone, Default)]
struct FakeLink(Arc<Mutex<LinkState>>);

impl FakeLink {
    fn replying(reply: &[u8]) -> Self {
        let link = Self::default();
        link.0.lock().unwrap().reply = reply.to_vec();
        link
    }

    fn session(&self) -> SerialSession {
        SerialSession::with_link("/dev/fake0", Box::new(self.clone()))
    }
}

impl SerialLink for FakeLink {
    fn discard_input(&mut self) -> io::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.pending.clear();
        state.discards += 1;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.0.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        state.written.extend_from_slice(bytes);
        let reply = state.reply.clone();
        state.pending.extend_from_slice(&reply);
        Ok(())
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.0.lock().unwrap().pending))
    }
}

#[tokio::test(start_paused = true)]
async fn pump_ack_is_acknowledged_after_full_wait() -> Result<()> {
    let link = FakeLink::replying(b"PUMP ON\r\nACK:PUMP_DONE\r\n");
    let mut client = DeviceClient::new(link.session());

    let t0 = Instant::now();
    let outcome = client.send(Command::Pump).await?;
    assert!(t0.elapsed() >= Duration::from_secs(4));

    assert_eq!(
        outcome,
        CommandOutcome::Acknowledged("PUMP ON\r\nACK:PUMP_DONE".to_string())
    );
    assert_eq!(link.0.lock().unwrap().written, b"PUMP\n");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_text_is_an_unrecognized_reply() -> Result<()> {
    let link = FakeLink::replying(b"Soil: 512, Temp: 21.5C\n");
    let mut client = DeviceClient::new(link.session());

    let t0 = Instant::now();
    let outcome = client.send(Command::Status).await?;
    assert!(t0.elapsed() >= Duration::from_secs(1));
    assert!(t0.elapsed() < Duration::from_secs(4));

    assert_eq!(
        outcome,
        CommandOutcome::UnrecognizedReply("Soil: 512, Temp: 21.5C".to_string())
    );
    assert_eq!(link.0.lock().unwrap().written, b"STATUS\n");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn empty_buffer_is_silence() -> Result<()> {
    let link = FakeLink::default();
    let mut client = DeviceClient::new(link.session());

    let outcome = client.send(Command::Pump).await?;
    assert_eq!(outcome, CommandOutcome::Silence);
    assert_eq!(outcome.text(), None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stale_bytes_are_discarded_before_writing() -> Result<()> {
    let link = FakeLink::replying(b"OK");
    link.0.lock().unwrap().pending = b"ACK:PUMP_DONE\n".to_vec();
    let mut client = DeviceClient::new(link.session());

    let outcome = client
        .send_with_wait(Command::Status, Duration::from_millis(10))
        .await?;
    assert_eq!(outcome, CommandOutcome::UnrecognizedReply("OK".to_string()));
    assert_eq!(link.0.lock().unwrap().discards, 1);
    Ok(())
}

#[tokio::test]
async fn closed_session_is_unavailable() {
    let mut client = DeviceClient::new(SerialSession::closed("/dev/ttyACM0"));
    assert!(!client.is_available());

    let err = client.send(Command::Status).await.unwrap_err();
    assert!(matches!(err, DeviceError::DeviceUnavailable { ref port } if port == "/dev/ttyACM0"));
}

#[tokio::test]
async fn closed_session_is_unavailable_even_for_malformed_commands() {
    let mut client = DeviceClient::new(SerialSession::closed("/dev/ttyACM0"));

    let err = client
        .send_line("STATUS\nPUMP", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, DeviceError::DeviceUnavailable { .. }));
}

#[tokio::test]
async fn rejects_multi_line_commands() {
    let link = FakeLink::default();
    let mut client = DeviceClient::new(link.session());

    let err = client
        .send_line("STATUS\nPUMP", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, DeviceError::InvalidCommand(_)));
    assert!(link.0.lock().unwrap().written.is_empty());
}

#[tokio::test]
async fn write_failure_is_reported_once() {
    let link = FakeLink::default();
    link.0.lock().unwrap().fail_writes = true;
    let mut client = DeviceClient::new(link.session());

    let err = client.send(Command::Pump).await.unwrap_err();
    assert!(matches!(err, DeviceError::Io(_)));
}

#[tokio::test(start_paused = true)]
async fn session_stays_open_after_io_error() -> Result<()> {
    let link = FakeLink::replying(b"ACK:PUMP_DONE\n");
    link.0.lock().unwrap().fail_writes = true;
    let mut client = DeviceClient::new(link.session());

    assert!(client.send(Command::Pump).await.is_err());
    assert!(client.is_available());

    link.0.lock().unwrap().fail_writes = false;
    let outcome = client.send(Command::Pump).await?;
    assert!(matches!(outcome, CommandOutcome::Acknowledged(_)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sequential_exchanges_share_one_link() -> Result<()> {
    let link = FakeLink::replying(b"OK\n");
    let mut client = DeviceClient::new(link.session());

    for _ in 0..2 {
        let outcome = client
            .send_with_wait(Command::Status, Duration::from_millis(1))
            .await?;
        assert_eq!(outcome, CommandOutcome::UnrecognizedReply("OK".to_string()));
    }
    assert_eq!(link.0.lock().unwrap().written, b"STATUS\nSTATUS\n".to_vec());
    assert_eq!(link.0.lock().unwrap().discards, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_markers_replace_the_default() -> Result<()> {
    let link = FakeLink::replying(b"ACK:STATUS moisture=40%\n");
    let mut client = DeviceClient::new(link.session()).with_markers(["ACK:STATUS"]);

    let outcome = client.send(Command::Status).await?;
    assert!(matches!(outcome, CommandOutcome::Acknowledged(_)));
    Ok(())
}

#[test]
fn invalid_utf8_is_replaced_not_rejected() {
    let text = decode_reply(b"  moist\xffure: 40%\n");
    assert_eq!(text, "moist\u{fffd}ure: 40%");
    assert_eq!(
        classify_reply(text, &["ACK:PUMP_DONE"]),
        CommandOutcome::UnrecognizedReply("moist\u{fffd}ure: 40%".to_string())
    );
}

#[test]
fn classify_reply_covers_all_outcomes() {
    let markers = ["ACK:PUMP_DONE"];
    assert_eq!(
        classify_reply("xx ACK:PUMP_DONE yy".to_string(), &markers),
        CommandOutcome::Acknowledged("xx ACK:PUMP_DONE yy".to_string())
    );
    assert_eq!(
        classify_reply("hello".to_string(), &markers),
        CommandOutcome::UnrecognizedReply("hello".to_string())
    );
    assert_eq!(classify_reply(String::new(), &markers), CommandOutcome::Silence);
}
