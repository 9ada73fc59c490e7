mod cli;
mod frontend;
mod photos;
mod registry;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, DeviceArgs, ModelArgs};
use plantport_device::{Command as DeviceCommand, DeviceError};
use plantport_runtime::{fit_image, Worker};
use tracing_subscriber::EnvFilter;

use frontend::LineFrontend;
use photos::PhotoStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("invalid --log filter")?)
        .init();

    match cli.command {
        Command::Classify {
            model,
            image,
            top_k,
        } => classify(&model, &image, top_k),
        Command::Scan {
            model,
            image,
            photos_dir,
            top_k,
        } => scan(&model, &image, &photos_dir, top_k),
        Command::Status { device } => device_command(&device, DeviceCommand::Status).await,
        Command::Water { device } => device_command(&device, DeviceCommand::Pump).await,
        Command::Serve {
            model,
            device,
            photos_dir,
            top_k,
        } => serve(model, device, photos_dir, top_k).await,
    }
}

fn classify(args: &ModelArgs, image: &Path, top_k: usize) -> Result<()> {
    let mut classifier = registry::load_classifier(args)?;
    let decoded =
        image::open(image).with_context(|| format!("failed to read {}", image.display()))?;

    let predictions = classifier.classify_image(&decoded, top_k)?;
    println!("{}", report::diagnostic(&predictions));
    Ok(())
}

fn scan(args: &ModelArgs, image: &Path, photos_dir: &Path, top_k: usize) -> Result<()> {
    let mut classifier = registry::load_classifier(args)?;
    let photos = PhotoStore::open(photos_dir)?;

    let decoded =
        image::open(image).with_context(|| format!("failed to read {}", image.display()))?;
    let fitted = fit_image(&decoded, classifier.input_size());
    let saved = photos.save(&fitted)?;

    let predictions = classifier.classify(&fitted, top_k)?;
    println!("{}", report::scan(&predictions));
    println!("Photo: {}", saved.display());
    Ok(())
}

async fn device_command(args: &DeviceArgs, command: DeviceCommand) -> Result<()> {
    let mut device = registry::open_device(args).await;

    let result = match args.wait() {
        Some(wait) => device.send_with_wait(command, wait).await,
        None => device.send(command).await,
    };
    match result {
        Ok(outcome) => println!("{}", report::device_outcome(command, &outcome)),
        Err(DeviceError::DeviceUnavailable { port }) => {
            println!("Device not connected ({port}).")
        }
        Err(err) => return Err(err).context(format!("{command} failed")),
    }
    Ok(())
}

async fn serve(
    model: ModelArgs,
    device: DeviceArgs,
    photos_dir: std::path::PathBuf,
    top_k: usize,
) -> Result<()> {
    let classifier = registry::load_classifier(&model)?;
    let (worker, handle) = Worker::new(Box::new(classifier), 8);
    let wait = device.wait();
    let device = registry::open_device(&device).await;
    let photos = PhotoStore::open(photos_dir)?;

    let worker_task = tokio::spawn(async move {
        if let Err(e) = worker.run().await {
            tracing::error!(error = ?e, "worker exited");
        }
    });

    let frontend = LineFrontend {
        classifier: handle,
        device,
        photos,
        top_k,
        wait,
    };
    frontend.run().await?;

    worker_task.await?;
    Ok(())
}
