//! Event types delivered by the body-tracking pipeline.
//!
//! The pipeline classifies gestures upstream; the relay only ever sees
//! per-frame results, never skeletal data.

use serde::{Deserialize, Serialize};

/// How a gesture is classified by the sensor pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    /// A single detected/not-detected result per frame.
    Discrete,
    /// A scalar progress value per frame. Never dispatched.
    Continuous,
}

/// One gesture-classification result within a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Identifier of the gesture as named in the gesture database
    pub gesture_id: String,
    /// Discrete or continuous classification
    pub kind: GestureKind,
    /// Whether the gesture was detected in this frame
    pub detected: bool,
    /// Classifier confidence in [0.0, 1.0]
    pub confidence: f32,
}

impl GestureEvent {
    /// Create a discrete gesture result.
    pub fn discrete(gesture_id: impl Into<String>, detected: bool, confidence: f32) -> Self {
        Self {
            gesture_id: gesture_id.into(),
            kind: GestureKind::Discrete,
            detected,
            confidence,
        }
    }

    /// Create a continuous gesture result.
    pub fn continuous(gesture_id: impl Into<String>, confidence: f32) -> Self {
        Self {
            gesture_id: gesture_id.into(),
            kind: GestureKind::Continuous,
            detected: false,
            confidence,
        }
    }
}

/// One frame of classification results for a single tracked body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureFrame {
    /// Body tracking ID this frame belongs to
    pub tracking_id: u64,
    /// Per-gesture results that arrived with the frame
    pub events: Vec<GestureEvent>,
}

impl GestureFrame {
    pub fn new(tracking_id: u64, events: Vec<GestureEvent>) -> Self {
        Self {
            tracking_id,
            events,
        }
    }

}

/// Push notifications delivered by the sensor pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A body acquired a valid tracking ID
    TrackingAcquired { tracking_id: u64 },
    /// A frame of gesture results arrived
    Frame(GestureFrame),
    /// The tracking ID was lost (body left the sensor's view)
    TrackingLost { tracking_id: u64 },
}

/// Frame acquisition failure reported by the pipeline.
///
/// Recoverable: the dispatcher treats the notification as an empty frame.
#[derive(Debug, Clone)]
pub struct FrameError {
    pub reason: String,
}

impl FrameError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame acquisition failed: {}", self.reason)
    }
}

impl std::error::Error for FrameError {}
