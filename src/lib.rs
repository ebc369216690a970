//! Gesture Relay - gesture-event dispatch engine.
//!
//! Consumes frames of classified gesture results from an external
//! body-tracking pipeline and translates detected discrete gestures into
//! outbound HTTP commands against a remote controller, with per-gesture
//! cooldowns and a post-fire pause so a held pose never hammers the
//! controller.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Gesture Relay                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐ │
//! │  │ Pipeline │──▶│ Dispatcher │──▶│ Cooldown │──▶│ Command │ │
//! │  │ (frames) │   │  (table)   │   │  (gate)  │   │  Relay  │ │
//! │  └──────────┘   └────────────┘   └──────────┘   └─────────┘ │
//! │       │               │                              │      │
//! │       ▼               ▼                              ▼      │
//! │  tracking-lost    Relay Log                   HTTP GET to   │
//! │  status updates   (counters)                  controller    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gesture_relay::{Config, GestureDispatcher, PipelineEvent};
//! use gesture_relay::relaylog::create_shared_log;
//!
//! let config = Config::default();
//! let table = config.build_action_table().expect("invalid action table");
//!
//! let (commands, _command_rx) = crossbeam_channel::unbounded();
//! let mut dispatcher =
//!     GestureDispatcher::new(table, config.pause_after_fire, commands, create_shared_log());
//!
//! dispatcher.handle_event(PipelineEvent::TrackingAcquired { tracking_id: 42 });
//! // Frames delivered by the pipeline now drive outbound commands.
//! ```

pub mod actions;
pub mod config;
pub mod controller;
pub mod cooldown;
pub mod dispatch;
pub mod pipeline;
pub mod relaylog;

// Re-export key types at crate root for convenience
pub use actions::{ActionEntry, ActionTable, ActionTableError};
pub use config::{ActionConfig, Config, ConfigError};
pub use controller::{
    BlockingControllerClient, CommandRelay, CommandRequest, ControllerClient, ControllerConfig,
    TransportError,
};
pub use cooldown::{CooldownGate, DetectorState};
pub use dispatch::{GestureDispatcher, StatusUpdate};
pub use pipeline::{
    FrameError, GestureEvent, GestureFrame, GestureKind, PipelineEvent, ReplaySource, SourceError,
};
pub use relaylog::{RelayLog, RelayStats, SharedRelayLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
