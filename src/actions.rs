//! Action table mapping gesture identifiers to controller endpoints.
//!
//! Adding a new gesture is a configuration change, not a code change: the
//! dispatcher iterates this table instead of branching per gesture name.

use std::collections::HashMap;
use std::time::Duration;

/// One gesture-to-command binding.
#[derive(Debug, Clone)]
pub struct ActionEntry {
    /// Gesture identifier as named by the classifier
    pub gesture_id: String,
    /// Absolute URL to GET when the gesture fires
    pub endpoint: String,
    /// Minimum time between successive firings of this action
    pub cooldown: Duration,
}

impl ActionEntry {
    pub fn new(gesture_id: impl Into<String>, endpoint: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            gesture_id: gesture_id.into(),
            endpoint: endpoint.into(),
            cooldown,
        }
    }
}

/// Immutable gesture-to-action mapping, built once at startup.
#[derive(Debug, Clone)]
pub struct ActionTable {
    entries: Vec<ActionEntry>,
    index: HashMap<String, usize>,
}

/// Ambiguous or invalid action-table configuration. Fatal at startup.
#[derive(Debug)]
pub enum ActionTableError {
    DuplicateGesture(String),
    Empty,
}

impl std::fmt::Display for ActionTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionTableError::DuplicateGesture(id) => {
                write!(f, "duplicate action entry for gesture '{id}'")
            }
            ActionTableError::Empty => write!(f, "action table has no entries"),
        }
    }
}

impl std::error::Error for ActionTableError {}

impl ActionTable {
    /// Build the table, rejecting duplicate gesture identifiers.
    pub fn new(entries: Vec<ActionEntry>) -> Result<Self, ActionTableError> {
        if entries.is_empty() {
            return Err(ActionTableError::Empty);
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.gesture_id.clone(), i).is_some() {
                return Err(ActionTableError::DuplicateGesture(entry.gesture_id.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// Look up the action bound to a gesture identifier.
    ///
    /// Returns `None` for unrecognized identifiers; gestures without a
    /// binding (continuous gestures included) are simply not dispatched.
    pub fn lookup(&self, gesture_id: &str) -> Option<&ActionEntry> {
        self.index.get(gesture_id).map(|&i| &self.entries[i])
    }

    /// Entries in registration order, the order frames are matched in.
    pub fn iter(&self) -> impl Iterator<Item = &ActionEntry> {
        self.entries.iter()
    }

    /// Number of configured actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ActionTable {
        ActionTable::new(vec![
            ActionEntry::new("TakeOff", "http://controller:5000/", Duration::from_secs(2)),
            ActionEntry::new(
                "Land_Left",
                "http://controller:5000/land",
                Duration::from_secs(2),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_known_gesture() {
        let table = table();
        let entry = table.lookup("Land_Left").unwrap();
        assert_eq!(entry.endpoint, "http://controller:5000/land");
        assert_eq!(entry.cooldown, Duration::from_secs(2));
    }

    #[test]
    fn test_lookup_unknown_gesture_is_none() {
        let table = table();
        assert!(table.lookup("SwipeProgress").is_none());
    }

    #[test]
    fn test_duplicate_gesture_is_rejected() {
        let result = ActionTable::new(vec![
            ActionEntry::new("TakeOff", "http://a/", Duration::from_secs(1)),
            ActionEntry::new("TakeOff", "http://b/", Duration::from_secs(1)),
        ]);
        match result {
            Err(ActionTableError::DuplicateGesture(id)) => assert_eq!(id, "TakeOff"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(matches!(
            ActionTable::new(Vec::new()),
            Err(ActionTableError::Empty)
        ));
    }

    #[test]
    fn test_iter_preserves_registration_order() {
        let table = table();
        let ids: Vec<&str> = table.iter().map(|e| e.gesture_id.as_str()).collect();
        assert_eq!(ids, vec!["TakeOff", "Land_Left"]);
    }
}
