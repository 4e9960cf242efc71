use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub action: String,
    pub recorded_at: DateTime<Utc>,
}

/// Stack of opaque descriptors for mutations the caller performed.
///
/// Nothing is undone here; a caller that wants rollback re-invokes the
/// core operations itself.
#[derive(Debug, Default)]
pub struct ActionJournal {
    entries: Mutex<Vec<ActionEntry>>,
}

impl ActionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, action: impl Into<String>) {
        let action = action.into();
        tracing::debug!(action = %action, "Action recorded");
        self.entries.lock().push(ActionEntry {
            action,
            recorded_at: Utc::now(),
        });
    }

    pub fn last(&self) -> Option<ActionEntry> {
        self.entries.lock().last().cloned()
    }

    /// Remove and return the most recent entry
    pub fn pop(&self) -> Option<ActionEntry> {
        self.entries.lock().pop()
    }

    pub fn history(&self) -> Vec<ActionEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
