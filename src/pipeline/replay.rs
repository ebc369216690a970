//! Scripted replay source for pipeline events.
//!
//! Plays a JSONL script of timed pipeline events into a channel, standing in
//! for a live sensor pipeline during demos and integration tests. Each line
//! holds one [`ScriptedEvent`]: an offset in milliseconds from script start
//! plus the event to deliver.

use crate::pipeline::types::PipelineEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// One line of a replay script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Milliseconds from script start at which to deliver the event
    pub at_ms: u64,
    /// The pipeline event to deliver
    pub event: PipelineEvent,
}

/// Errors that can occur while loading or running a replay script.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    Io(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Replay source is already running"),
            SourceError::Io(e) => write!(f, "IO error: {e}"),
            SourceError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// A frame source that replays a pre-recorded script of pipeline events.
pub struct ReplaySource {
    script: Vec<ScriptedEvent>,
    sender: Sender<PipelineEvent>,
    receiver: Receiver<PipelineEvent>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ReplaySource {
    /// Create a replay source from an in-memory script.
    pub fn new(script: Vec<ScriptedEvent>) -> Self {
        let (sender, receiver) = bounded(10_000);
        Self {
            script,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Load a replay script from a JSONL file, failing fast on malformed lines.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SourceError::Io(e.to_string()))?;

        let mut script = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: ScriptedEvent = serde_json::from_str(line).map_err(|e| {
                SourceError::Parse {
                    line: idx + 1,
                    message: e.to_string(),
                }
            })?;
            script.push(event);
        }

        Ok(Self::new(script))
    }

    /// Start replaying events on a background thread.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let script = self.script.clone();
        let sender = self.sender.clone();
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            'script: for scripted in script {
                let due = Duration::from_millis(scripted.at_ms);
                // Sleep in short slices so stop() is not held up by long
                // gaps between scripted events.
                while start.elapsed() < due {
                    if !running.load(Ordering::SeqCst) {
                        break 'script;
                    }
                    let remaining = due.saturating_sub(start.elapsed());
                    thread::sleep(remaining.min(Duration::from_millis(50)));
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if sender.send(scripted.event).is_err() {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the replay and join the background thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the replay is still delivering events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for pipeline events.
    pub fn receiver(&self) -> &Receiver<PipelineEvent> {
        &self.receiver
    }

    /// Number of events in the loaded script.
    pub fn len(&self) -> usize {
        self.script.len()
    }

    /// Whether the loaded script is empty.
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{GestureEvent, GestureFrame};

    fn short_script() -> Vec<ScriptedEvent> {
        vec![
            ScriptedEvent {
                at_ms: 0,
                event: PipelineEvent::TrackingAcquired { tracking_id: 1 },
            },
            ScriptedEvent {
                at_ms: 5,
                event: PipelineEvent::Frame(GestureFrame::new(
                    1,
                    vec![GestureEvent::discrete("TakeOff", true, 0.9)],
                )),
            },
            ScriptedEvent {
                at_ms: 10,
                event: PipelineEvent::TrackingLost { tracking_id: 1 },
            },
        ]
    }

    #[test]
    fn test_replay_delivers_script_in_order() {
        let mut source = ReplaySource::new(short_script());
        source.start().unwrap();

        let first = source
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        assert!(matches!(
            first,
            PipelineEvent::TrackingAcquired { tracking_id: 1 }
        ));

        let second = source
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        assert!(matches!(second, PipelineEvent::Frame(_)));

        let third = source
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        assert!(matches!(
            third,
            PipelineEvent::TrackingLost { tracking_id: 1 }
        ));

        source.stop();
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut source = ReplaySource::new(vec![ScriptedEvent {
            at_ms: 200,
            event: PipelineEvent::TrackingAcquired { tracking_id: 1 },
        }]);
        source.start().unwrap();
        assert!(matches!(source.start(), Err(SourceError::AlreadyRunning)));
        source.stop();
    }

    #[test]
    fn test_script_from_jsonl() {
        let dir = std::env::temp_dir().join("gesture-relay-replay-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("script.jsonl");

        let mut lines = String::new();
        for event in short_script() {
            lines.push_str(&serde_json::to_string(&event).unwrap());
            lines.push('\n');
        }
        std::fs::write(&path, lines).unwrap();

        let source = ReplaySource::from_path(&path).unwrap();
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_malformed_script_line_is_reported() {
        let dir = std::env::temp_dir().join("gesture-relay-replay-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.jsonl");
        std::fs::write(&path, "{\"at_ms\": 0}\n").unwrap();

        match ReplaySource::from_path(&path) {
            Err(SourceError::Parse { line, .. }) => assert_eq!(line, 1),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected parse error"),
        }
    }
}
