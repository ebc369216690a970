//! Gesture dispatch engine.
//!
//! Consumes frames of classified gesture results for one tracked body,
//! matches detected discrete gestures against the action table, applies the
//! cooldown/pause policy, and hands qualifying commands to the relay channel.
//! The frame handler never waits on the network: firing a command is a
//! channel send, transport happens on the relay worker.
//!
//! Each dispatcher owns the state for exactly one tracked body, so no
//! cross-detector synchronization is needed; hosts run one dispatcher per
//! live tracking ID.

use crate::actions::ActionTable;
use crate::controller::CommandRequest;
use crate::cooldown::{CooldownGate, DetectorState};
use crate::pipeline::types::{FrameError, GestureFrame, GestureKind, PipelineEvent};
use crate::relaylog::SharedRelayLog;
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

/// Status update for the result view. Emitted when tracking is lost.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub tracked: bool,
    pub detected: bool,
    pub confidence: f32,
}

impl StatusUpdate {
    /// The "not tracked" update sent when a body leaves the sensor's view.
    pub fn not_tracked() -> Self {
        Self {
            tracked: false,
            detected: false,
            confidence: 0.0,
        }
    }
}

/// Tracking state for the body this dispatcher is bound to.
enum TrackingState {
    /// No valid tracking ID; all frames are stale and ignored
    Untracked,
    /// Actively receiving frames for one tracking ID
    Tracking(DetectorState),
}

/// Table-driven gesture dispatcher for a single tracked body.
pub struct GestureDispatcher {
    table: ActionTable,
    gate: CooldownGate,
    /// Detector-wide suppression window armed after every fired action.
    /// `None` disables the cross-gesture throttle.
    pause_after_fire: Option<Duration>,
    state: TrackingState,
    commands: Sender<CommandRequest>,
    status: Option<Sender<StatusUpdate>>,
    log: SharedRelayLog,
}

impl GestureDispatcher {
    /// Create a dispatcher. Starts untracked; no dispatch happens until the
    /// pipeline reports a valid tracking ID.
    pub fn new(
        table: ActionTable,
        pause_after_fire: Option<Duration>,
        commands: Sender<CommandRequest>,
        log: SharedRelayLog,
    ) -> Self {
        Self {
            table,
            gate: CooldownGate,
            pause_after_fire,
            state: TrackingState::Untracked,
            commands,
            status: None,
            log,
        }
    }

    /// Attach a result-view channel for tracking status updates.
    pub fn with_status_sender(mut self, status: Sender<StatusUpdate>) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the dispatcher currently has a valid tracking ID.
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking(_))
    }

    /// The tracking ID this dispatcher is bound to, when tracking.
    pub fn tracking_id(&self) -> Option<u64> {
        match &self.state {
            TrackingState::Tracking(state) => Some(state.tracking_id),
            TrackingState::Untracked => None,
        }
    }

    /// Manually pause or resume the detector (e.g. while its tracking ID is
    /// being revalidated). Distinct from the post-fire pause window.
    pub fn set_paused(&mut self, paused: bool) {
        if let TrackingState::Tracking(state) = &mut self.state {
            state.paused = paused;
        }
    }

    /// Handle one pipeline notification.
    pub fn handle_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::TrackingAcquired { tracking_id } => {
                self.tracking_acquired(tracking_id)
            }
            PipelineEvent::Frame(frame) => self.handle_frame(&frame),
            PipelineEvent::TrackingLost { tracking_id } => self.tracking_lost(tracking_id),
        }
    }

    /// The pipeline assigned or validated a tracking ID for this detector.
    ///
    /// A new tracking session starts with fresh state: cooldown history never
    /// carries across sessions, even for a reused tracking ID.
    pub fn tracking_acquired(&mut self, tracking_id: u64) {
        match &self.state {
            TrackingState::Tracking(state) if state.tracking_id == tracking_id => {
                // Revalidation of the current session; keep state.
            }
            _ => {
                tracing::info!(tracking_id, "tracking acquired");
                self.state = TrackingState::Tracking(DetectorState::new(tracking_id));
            }
        }
    }

    /// The pipeline lost the tracking ID. Halts dispatch immediately, clears
    /// transient pause state, and reports "not tracked" to the result view.
    pub fn tracking_lost(&mut self, tracking_id: u64) {
        match &mut self.state {
            TrackingState::Tracking(state) if state.tracking_id == tracking_id => {
                state.clear_pause();
                tracing::info!(tracking_id, "tracking lost");
                self.state = TrackingState::Untracked;
                if let Some(status) = &self.status {
                    let _ = status.send(StatusUpdate::not_tracked());
                }
            }
            _ => {
                tracing::debug!(tracking_id, "tracking-lost for unknown id, ignored");
            }
        }
    }

    /// Handle the outcome of a frame acquisition.
    ///
    /// Acquisition failures are contained at the frame boundary: the
    /// notification is treated as an empty frame and dispatch continues.
    pub fn handle_frame_result(&mut self, result: Result<GestureFrame, FrameError>) {
        match result {
            Ok(frame) => self.handle_frame(&frame),
            Err(e) => {
                tracing::warn!(error = %e, "frame dropped");
            }
        }
    }

    /// Process one frame of gesture results.
    pub fn handle_frame(&mut self, frame: &GestureFrame) {
        self.handle_frame_at(frame, Instant::now());
    }

    /// Process one frame against an explicit clock reading.
    pub fn handle_frame_at(&mut self, frame: &GestureFrame, now: Instant) {
        let state = match &mut self.state {
            TrackingState::Tracking(state) if state.tracking_id == frame.tracking_id => state,
            TrackingState::Tracking(state) => {
                tracing::debug!(
                    frame_id = frame.tracking_id,
                    bound_id = state.tracking_id,
                    "frame for foreign tracking id, ignored"
                );
                return;
            }
            TrackingState::Untracked => {
                tracing::debug!(frame_id = frame.tracking_id, "stale frame while untracked");
                return;
            }
        };

        self.log.record_frame();

        // Match in the table's registration order; entries target disjoint
        // gesture ids, so ordering across gestures is not observable.
        for entry in self.table.iter() {
            for event in frame
                .events
                .iter()
                .filter(|e| e.gesture_id == entry.gesture_id)
            {
                if event.kind != GestureKind::Discrete || !event.detected {
                    continue;
                }

                if !self
                    .gate
                    .try_fire(state, &entry.gesture_id, now, entry.cooldown)
                {
                    self.log.record_suppressed();
                    tracing::debug!(gesture = %entry.gesture_id, "detection suppressed");
                    continue;
                }

                // Pause is armed before the send is enqueued, mirroring the
                // one-command-in-flight throttle of the reference behavior.
                if let Some(delay) = self.pause_after_fire {
                    state.pause_until(now + delay);
                }

                self.log.record_command_fired();
                tracing::info!(
                    gesture = %entry.gesture_id,
                    endpoint = %entry.endpoint,
                    confidence = event.confidence,
                    "gesture fired"
                );

                let request = CommandRequest {
                    gesture_id: entry.gesture_id.clone(),
                    endpoint: entry.endpoint.clone(),
                };
                if self.commands.send(request).is_err() {
                    tracing::error!("command channel closed; relay worker gone");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionEntry;
    use crate::pipeline::types::GestureEvent;
    use crate::relaylog::create_shared_log;
    use crossbeam_channel::{unbounded, Receiver};

    const COOLDOWN: Duration = Duration::from_secs(2);

    fn table() -> ActionTable {
        ActionTable::new(vec![
            ActionEntry::new("TakeOff", "http://c:5000/", COOLDOWN),
            ActionEntry::new("Land_Left", "http://c:5000/land", COOLDOWN),
        ])
        .unwrap()
    }

    fn dispatcher(
        pause_after_fire: Option<Duration>,
    ) -> (GestureDispatcher, Receiver<CommandRequest>) {
        let (tx, rx) = unbounded();
        let dispatcher = GestureDispatcher::new(table(), pause_after_fire, tx, create_shared_log());
        (dispatcher, rx)
    }

    fn detected(gesture_id: &str) -> GestureFrame {
        GestureFrame::new(1, vec![GestureEvent::discrete(gesture_id, true, 0.9)])
    }

    fn drain(rx: &Receiver<CommandRequest>) -> Vec<String> {
        rx.try_iter().map(|c| c.gesture_id).collect()
    }

    #[test]
    fn test_untracked_dispatcher_ignores_frames() {
        let (mut d, rx) = dispatcher(None);
        d.handle_frame_at(&detected("TakeOff"), Instant::now());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_detected_discrete_gesture_fires_once() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        d.handle_frame_at(&detected("TakeOff"), Instant::now());

        let commands = drain(&rx);
        assert_eq!(commands, vec!["TakeOff"]);
    }

    #[test]
    fn test_unconfigured_gesture_is_ignored() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        d.handle_frame_at(&detected("Wave"), Instant::now());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_undetected_and_continuous_events_never_fire() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);

        let frame = GestureFrame::new(
            1,
            vec![
                GestureEvent::discrete("TakeOff", false, 0.3),
                GestureEvent::continuous("Land_Left", 0.99),
            ],
        );
        d.handle_frame_at(&frame, Instant::now());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_cooldown_suppresses_repeat_within_window() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        let t0 = Instant::now();

        d.handle_frame_at(&detected("TakeOff"), t0);
        d.handle_frame_at(&detected("TakeOff"), t0 + Duration::from_millis(500));
        assert_eq!(drain(&rx), vec!["TakeOff"]);

        d.handle_frame_at(&detected("TakeOff"), t0 + Duration::from_millis(2100));
        assert_eq!(drain(&rx), vec!["TakeOff"]);
    }

    #[test]
    fn test_cooldown_buckets_independent_across_gestures() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        let t0 = Instant::now();

        // Same instant: TakeOff's cooldown must not block Land_Left.
        d.handle_frame_at(&detected("TakeOff"), t0);
        d.handle_frame_at(&detected("Land_Left"), t0);
        assert_eq!(drain(&rx), vec!["TakeOff", "Land_Left"]);
    }

    #[test]
    fn test_pause_after_fire_throttles_all_gestures() {
        let (mut d, rx) = dispatcher(Some(Duration::from_secs(5)));
        d.tracking_acquired(1);
        let t0 = Instant::now();

        d.handle_frame_at(&detected("TakeOff"), t0);
        // A different gesture within the pause window is suppressed.
        d.handle_frame_at(&detected("Land_Left"), t0 + Duration::from_secs(3));
        assert_eq!(drain(&rx), vec!["TakeOff"]);

        // Past the pause deadline the detector resumes on its own.
        d.handle_frame_at(&detected("Land_Left"), t0 + Duration::from_secs(5));
        assert_eq!(drain(&rx), vec!["Land_Left"]);
    }

    #[test]
    fn test_tracking_lost_halts_dispatch() {
        let (tx, rx) = unbounded();
        let (status_tx, status_rx) = unbounded();
        let mut d = GestureDispatcher::new(table(), None, tx, create_shared_log())
            .with_status_sender(status_tx);

        d.tracking_acquired(1);
        d.tracking_lost(1);

        // Qualifying event delivered after the loss is stale.
        d.handle_frame_at(&detected("TakeOff"), Instant::now());
        assert!(drain(&rx).is_empty());

        let status = status_rx.try_recv().unwrap();
        assert_eq!(status, StatusUpdate::not_tracked());
    }

    #[test]
    fn test_tracking_lost_for_foreign_id_is_ignored() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        d.tracking_lost(2);

        assert!(d.is_tracking());
        d.handle_frame_at(&detected("TakeOff"), Instant::now());
        assert_eq!(drain(&rx), vec!["TakeOff"]);
    }

    #[test]
    fn test_fresh_session_carries_no_stale_cooldown() {
        let (mut d, rx) = dispatcher(None);
        let t0 = Instant::now();

        d.tracking_acquired(1);
        d.handle_frame_at(&detected("TakeOff"), t0);
        d.tracking_lost(1);

        // Same tracking ID, new session: the old cooldown is gone.
        d.tracking_acquired(1);
        d.handle_frame_at(&detected("TakeOff"), t0 + Duration::from_millis(100));
        assert_eq!(drain(&rx), vec!["TakeOff", "TakeOff"]);
    }

    #[test]
    fn test_frame_for_foreign_tracking_id_is_ignored() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);

        let frame = GestureFrame::new(9, vec![GestureEvent::discrete("TakeOff", true, 0.9)]);
        d.handle_frame_at(&frame, Instant::now());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_manual_pause_suppresses_unconditionally() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);
        d.set_paused(true);

        d.handle_frame_at(&detected("TakeOff"), Instant::now());
        assert!(drain(&rx).is_empty());

        d.set_paused(false);
        d.handle_frame_at(&detected("TakeOff"), Instant::now());
        assert_eq!(drain(&rx), vec!["TakeOff"]);
    }

    #[test]
    fn test_frame_acquisition_failure_is_contained() {
        let (mut d, rx) = dispatcher(None);
        d.tracking_acquired(1);

        d.handle_frame_result(Err(FrameError::new("sensor hiccup")));
        assert!(d.is_tracking());
        assert!(drain(&rx).is_empty());

        // Subsequent frames dispatch normally.
        d.handle_frame_result(Ok(detected("TakeOff")));
        assert_eq!(drain(&rx), vec!["TakeOff"]);
    }

    #[test]
    fn test_replay_determinism() {
        // Identical frame sequences against identically configured
        // dispatchers produce identical command sequences.
        let t0 = Instant::now();
        let frames = vec![
            (t0, detected("TakeOff")),
            (t0 + Duration::from_millis(500), detected("TakeOff")),
            (t0 + Duration::from_millis(600), detected("Land_Left")),
            (t0 + Duration::from_millis(2100), detected("TakeOff")),
        ];

        let mut runs = Vec::new();
        for _ in 0..2 {
            let (mut d, rx) = dispatcher(None);
            d.tracking_acquired(1);
            for (at, frame) in &frames {
                d.handle_frame_at(frame, *at);
            }
            runs.push(drain(&rx));
        }

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[0], vec!["TakeOff", "Land_Left", "TakeOff"]);
    }
}
