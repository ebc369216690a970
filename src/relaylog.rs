//! Dispatch accounting log.
//!
//! Tracks what the relay has done this session (frames seen, commands fired,
//! detections suppressed, transport failures) without retaining any frame
//! content. Counters can be persisted to disk so `gesture-relay status` can
//! report on a running agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Relay statistics for the current session.
#[derive(Debug)]
pub struct RelayLog {
    /// Number of gesture frames processed
    frames_processed: AtomicU64,
    /// Number of outbound commands handed to the transport
    commands_fired: AtomicU64,
    /// Number of detections suppressed by cooldown or pause
    detections_suppressed: AtomicU64,
    /// Number of outbound commands that failed in transport
    transport_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RelayLog {
    /// Create a new relay log.
    pub fn new() -> Self {
        Self {
            frames_processed: AtomicU64::new(0),
            commands_fired: AtomicU64::new(0),
            detections_suppressed: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a relay log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            eprintln!("Note: Could not load previous relay stats: {e}");
        }

        log
    }

    /// Record a processed frame.
    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fired command.
    pub fn record_command_fired(&self) {
        self.commands_fired.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a suppressed detection.
    pub fn record_suppressed(&self) {
        self.detections_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transport failure.
    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            commands_fired: self.commands_fired.load(Ordering::Relaxed),
            detections_suppressed: self.detections_suppressed.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Relay Statistics:\n\
             - Frames processed: {}\n\
             - Commands fired: {}\n\
             - Detections suppressed: {}\n\
             - Transport failures: {}\n\
             - Session duration: {} seconds",
            stats.frames_processed,
            stats.commands_fired,
            stats.detections_suppressed,
            stats.transport_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                frames_processed: stats.frames_processed,
                commands_fired: stats.commands_fired,
                detections_suppressed: stats.detections_suppressed,
                transport_failures: stats.transport_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_processed
                    .store(persisted.frames_processed, Ordering::Relaxed);
                self.commands_fired
                    .store(persisted.commands_fired, Ordering::Relaxed);
                self.detections_suppressed
                    .store(persisted.detections_suppressed, Ordering::Relaxed);
                self.transport_failures
                    .store(persisted.transport_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.frames_processed.store(0, Ordering::Relaxed);
        self.commands_fired.store(0, Ordering::Relaxed);
        self.detections_suppressed.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for RelayLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of relay statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayStats {
    pub frames_processed: u64,
    pub commands_fired: u64,
    pub detections_suppressed: u64,
    pub transport_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    frames_processed: u64,
    commands_fired: u64,
    detections_suppressed: u64,
    transport_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared relay log.
pub type SharedRelayLog = Arc<RelayLog>;

/// Create a new shared relay log.
pub fn create_shared_log() -> SharedRelayLog {
    Arc::new(RelayLog::new())
}

/// Create a new shared relay log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRelayLog {
    Arc::new(RelayLog::with_persistence(path))
}
