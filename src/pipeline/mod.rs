//! Frame delivery from the body-tracking pipeline.
//!
//! Sensor initialization and gesture classification happen upstream; this
//! module defines the event types the relay consumes and a scripted replay
//! source for driving the dispatcher without live hardware.

pub mod replay;
pub mod types;

pub use replay::{ReplaySource, ScriptedEvent, SourceError};
pub use types::{FrameError, GestureEvent, GestureFrame, GestureKind, PipelineEvent};
