use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use plantport_device::{Command, DeviceClient, DeviceError};
use plantport_runtime::{fit_image, WorkerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::photos::PhotoStore;
use crate::report;

#[derive(Debug, PartialEq, Eq)]
enum Request<'a> {
    Scan(&'a str),
    Status,
    Water,
    Quit,
}

fn parse_request(line: &str) -> Option<Request<'_>> {
    let line = line.trim().trim_start_matches('/');
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match (verb.to_ascii_lowercase().as_str(), rest.trim()) {
        ("scan", path) if !path.is_empty() => Some(Request::Scan(path)),
        ("status", "") => Some(Request::Status),
        ("water", "") => Some(Request::Water),
        ("quit" | "exit", "") => Some(Request::Quit),
        _ => None,
    }
}

/// Reads one request per line from stdin and answers it before reading the next.
pub struct LineFrontend {
    pub classifier: WorkerHandle,
    pub device: DeviceClient,
    pub photos: PhotoStore,
    pub top_k: usize,
    /// Overrides the per-command reply window when set.
    pub wait: Option<Duration>,
}

impl LineFrontend {
    pub async fn run(mut self) -> Result<()> {
        info!(photos = %self.photos.dir().display(), "ready: scan <path> | status | water | quit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let reply = match parse_request(&line) {
                Some(Request::Scan(path)) => self.scan(Path::new(path)).await,
                Some(Request::Status) => self.device_command(Command::Status).await,
                Some(Request::Water) => self.device_command(Command::Pump).await,
                Some(Request::Quit) => break,
                None => Ok(format!("unknown request: {}", line.trim())),
            };
            match reply {
                Ok(text) => println!("{text}"),
                Err(err) => {
                    warn!(error = ?err, "request failed");
                    println!("Error: {err:#}");
                }
            }
        }
        Ok(())
    }

    async fn scan(&self, path: &Path) -> Result<String> {
        let decoded =
            image::open(path).with_context(|| format!("failed to read {}", path.display()))?;
        let fitted = fit_image(&decoded, self.classifier.input_size());
        let saved = self.photos.save(&fitted)?;

        let response = self.classifier.classify(fitted, self.top_k).await?;
        let predictions = response.predictions?;
        info!(
            photo = %saved.display(),
            inference_us = response.timings.inference_us,
            "scan complete"
        );
        Ok(report::scan(&predictions))
    }

    async fn device_command(&mut self, command: Command) -> Result<String> {
        device_reply(&mut self.device, command, self.wait).await
    }
}

async fn device_reply(
    device: &mut DeviceClient,
    command: Command,
    wait: Option<Duration>,
) -> Result<String> {
    let result = match wait {
        Some(wait) => device.send_with_wait(command, wait).await,
        None => device.send(command).await,
    };
    match result {
        Ok(outcome) => Ok(report::device_outcome(command, &outcome)),
        Err(DeviceError::DeviceUnavailable { .. }) => Ok("Device not connected.".to_string()),
        Err(err) => Err(err.into()),
    }
}
