use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use super::bootstrap::HostError;

#[derive(Debug)]
pub(crate) enum PumpEvent {
    Line(String),
    Failed(io::Error),
}

/// Starts the reader thread. The receiver disconnects once input is exhausted.
pub(crate) fn spawn_line_pump(script_path: Option<&Path>) -> Result<Receiver<PumpEvent>, HostError> {
    let (tx, rx) = mpsc::channel();
    let builder = thread::Builder::new().name("line-pump".to_string());

    let spawned = match script_path {
        Some(path) => {
            let file = File::open(path).map_err(|source| HostError::OpenScript {
                path: path.to_path_buf(),
                source,
            })?;
            builder.spawn(move || pump_lines(BufReader::new(file), &tx))
        }
        None => builder.spawn(move || pump_lines(io::stdin().lock(), &tx)),
    };
    spawned.map_err(HostError::SpawnReader)?;

    Ok(rx)
}

fn pump_lines<R: BufRead>(reader: R, tx: &Sender<PumpEvent>) {
    let mut forwarded = 0usize;
    for line in reader.lines() {
        let event = match line {
            Ok(line) => match command_line(&line) {
                Some(command) => PumpEvent::Line(command.to_string()),
                None => continue,
            },
            Err(err) => PumpEvent::Failed(err),
        };
        let failed = matches!(event, PumpEvent::Failed(_));
        if tx.send(event).is_err() || failed {
            break;
        }
        forwarded += 1;
    }
    debug!(forwarded, "line_pump_finished");
}

/// Blank lines and `#` comments carry no command.
fn command_line(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed)
    }
}
