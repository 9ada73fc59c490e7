use std::fmt::Write;

use plantport_core::Prediction;
use plantport_device::{Command, CommandOutcome};

/// Long listing used by `classify`.
pub fn diagnostic(predictions: &[Prediction]) -> String {
    let mut out = format!("Top-{} predictions:\n", predictions.len());
    for p in predictions {
        let _ = writeln!(out, "  {:35} : {:.4}", p.label, p.confidence);
    }
    if let Some(best) = predictions.first() {
        let _ = write!(
            out,
            "\nMost likely plant species: {} ({:.2}% confidence)",
            best.label,
            best.percent()
        );
    }
    out
}

/// Short listing used by `scan`.
pub fn scan(predictions: &[Prediction]) -> String {
    let mut out = format!("Top {} predictions:\n", predictions.len());
    for p in predictions {
        let _ = writeln!(out, "  - {}: {:.2}%", p.label, p.percent());
    }
    if let Some(best) = predictions.first() {
        let _ = write!(out, "\nMost likely: {}", best.label);
    }
    out
}

pub fn device_outcome(command: Command, outcome: &CommandOutcome) -> String {
    match (command, outcome) {
        (Command::Pump, CommandOutcome::Acknowledged(_)) => "Watering complete!".to_string(),
        (Command::Pump, CommandOutcome::Silence) => "Done (no serial response).".to_string(),
        (_, CommandOutcome::Silence) => "No response from device.".to_string(),
        (_, CommandOutcome::Acknowledged(text) | CommandOutcome::UnrecognizedReply(text)) => {
            text.clone()
        }
    }
}
