//! Per-detector cooldown and pause policy.
//!
//! Cooldown buckets are scoped per (detector, gesture id): a Launch firing
//! never blocks a Land firing in the same instant. The post-fire pause is a
//! deadline checked lazily against `now`, so no timer task needs to run or be
//! cancelled when tracking is lost.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Mutable dispatch state for one tracked body.
///
/// Created when a body acquires a valid tracking ID and dropped when tracking
/// is lost; cooldown history never survives a tracking session.
#[derive(Debug)]
pub struct DetectorState {
    /// Body tracking ID this state belongs to
    pub tracking_id: u64,
    /// Manual suppression (detector-level pause)
    pub paused: bool,
    /// Post-fire throttle: dispatch is suppressed until this instant
    pub resume_at: Option<Instant>,
    /// Last successful fire per gesture id
    last_fire: HashMap<String, Instant>,
}

impl DetectorState {
    pub fn new(tracking_id: u64) -> Self {
        Self {
            tracking_id,
            paused: false,
            resume_at: None,
            last_fire: HashMap::new(),
        }
    }

    /// Whether dispatch is currently suppressed for this detector.
    pub fn is_suppressed(&self, now: Instant) -> bool {
        if self.paused {
            return true;
        }
        match self.resume_at {
            Some(deadline) => now < deadline,
            None => false,
        }
    }

    /// Arm the post-fire pause; dispatch resumes once `now` passes the deadline.
    pub fn pause_until(&mut self, deadline: Instant) {
        self.resume_at = Some(deadline);
    }

    /// Clear any transient pause, e.g. on a tracking transition.
    pub fn clear_pause(&mut self) {
        self.paused = false;
        self.resume_at = None;
    }

    /// When the given gesture last fired, if ever.
    pub fn last_fire(&self, gesture_id: &str) -> Option<Instant> {
        self.last_fire.get(gesture_id).copied()
    }
}

/// Decides whether a qualified detection may fire, given firing history.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownGate;

impl CooldownGate {
    /// Attempt to claim a firing slot for `gesture_id` at `now`.
    ///
    /// Returns true and records the fire time when the detector is not
    /// suppressed and the gesture is past its cooldown (a first-ever
    /// detection is always past it). A false return leaves the recorded
    /// fire time untouched, so failed attempts never extend the window.
    pub fn try_fire(
        &self,
        state: &mut DetectorState,
        gesture_id: &str,
        now: Instant,
        cooldown: Duration,
    ) -> bool {
        if state.is_suppressed(now) {
            return false;
        }

        if let Some(last) = state.last_fire.get(gesture_id) {
            if now.duration_since(*last) < cooldown {
                return false;
            }
        }

        state.last_fire.insert(gesture_id.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(2);

    #[test]
    fn test_first_detection_always_fires() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        assert!(gate.try_fire(&mut state, "TakeOff", Instant::now(), COOLDOWN));
    }

    #[test]
    fn test_refire_within_cooldown_is_suppressed() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        let t0 = Instant::now();

        assert!(gate.try_fire(&mut state, "TakeOff", t0, COOLDOWN));
        assert!(!gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_millis(500), COOLDOWN));
        assert!(gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_millis(2100), COOLDOWN));
    }

    #[test]
    fn test_cooldown_buckets_are_per_gesture() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        let t0 = Instant::now();

        assert!(gate.try_fire(&mut state, "TakeOff", t0, COOLDOWN));
        // A different gesture is an independent bucket, even at the same instant.
        assert!(gate.try_fire(&mut state, "Land_Left", t0, COOLDOWN));
    }

    #[test]
    fn test_failed_attempt_does_not_reset_timer() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        let t0 = Instant::now();

        assert!(gate.try_fire(&mut state, "TakeOff", t0, COOLDOWN));
        let fired_at = state.last_fire("TakeOff").unwrap();

        assert!(!gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_secs(1), COOLDOWN));
        assert_eq!(state.last_fire("TakeOff").unwrap(), fired_at);

        // 2s after the original fire the window has expired, which would not
        // be the case had the failed attempt pushed the timer forward.
        assert!(gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_secs(2), COOLDOWN));
    }

    #[test]
    fn test_paused_detector_never_fires() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        state.paused = true;
        assert!(!gate.try_fire(&mut state, "TakeOff", Instant::now(), COOLDOWN));
    }

    #[test]
    fn test_pause_deadline_suppresses_until_reached() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        let t0 = Instant::now();
        state.pause_until(t0 + Duration::from_secs(5));

        assert!(!gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_secs(4), COOLDOWN));
        assert!(gate.try_fire(&mut state, "TakeOff", t0 + Duration::from_secs(5), COOLDOWN));
    }

    #[test]
    fn test_clear_pause_resumes_dispatch() {
        let gate = CooldownGate;
        let mut state = DetectorState::new(1);
        let t0 = Instant::now();
        state.pause_until(t0 + Duration::from_secs(5));
        state.clear_pause();

        assert!(gate.try_fire(&mut state, "TakeOff", t0, COOLDOWN));
    }
}
