use crate::state::messages::FetchKey;
use std::collections::HashMap;

/// Result slot for one remote resource. Failures and reloads keep the last
/// value that loaded, so a failed re-fetch never blanks a list on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Remote<T> {
    Idle,
    Loading {
        previous: Option<T>,
    },
    Loaded(T),
    Failed {
        error: String,
        previous: Option<T>,
    },
}

impl<T> Default for Remote<T> {
    fn default() -> Self {
        Remote::Idle
    }
}

impl<T> Remote<T> {
    pub fn start(&mut self) {
        let previous = std::mem::take(self).into_value();
        *self = Remote::Loading { previous };
    }

    pub fn finish(&mut self, value: T) {
        *self = Remote::Loaded(value);
    }

    pub fn fail(&mut self, error: String) {
        let previous = std::mem::take(self).into_value();
        *self = Remote::Failed { error, previous };
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Remote::Idle => None,
            Remote::Loaded(value) => Some(value),
            Remote::Loading { previous } | Remote::Failed { previous, .. } => previous.as_ref(),
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Remote::Idle => None,
            Remote::Loaded(value) => Some(value),
            Remote::Loading { previous } | Remote::Failed { previous, .. } => previous.as_mut(),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Remote::Idle => None,
            Remote::Loaded(value) => Some(value),
            Remote::Loading { previous } | Remote::Failed { previous, .. } => previous,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Remote::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Monotonic id attached to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Hands out request tokens and remembers the newest one per fetch key.
/// A response is applied only if it carries the newest token for its key.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    latest: HashMap<FetchKey, RequestToken>,
}

impl RequestSequencer {
    pub fn issue(&mut self, key: FetchKey) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.latest.insert(key, token);
        token
    }

    pub fn is_current(&self, key: FetchKey, token: RequestToken) -> bool {
        self.latest.get(&key) == Some(&token)
    }

    /// Make every outstanding token stale, e.g. when the session changes.
    pub fn invalidate_all(&mut self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reload_keeps_previous_value() {
        let mut slot: Remote<Vec<u32>> = Remote::default();
        assert!(slot.value().is_none());

        slot.start();
        assert!(slot.is_loading());
        slot.finish(vec![1, 2, 3]);
        assert_eq!(slot.value(), Some(&vec![1, 2, 3]));

        slot.start();
        assert_eq!(slot.value(), Some(&vec![1, 2, 3]));
        slot.fail("timeout".into());
        assert_eq!(slot.error(), Some("timeout"));
        assert_eq!(slot.value(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn only_newest_token_is_current() {
        let mut sequencer = RequestSequencer::default();
        let key = FetchKey::Roster(4);
        let first = sequencer.issue(key);
        let second = sequencer.issue(key);
        assert!(first < second);
        assert!(!sequencer.is_current(key, first));
        assert!(sequencer.is_current(key, second));
    }

    #[test]
    fn tokens_are_tracked_per_key() {
        let mut sequencer = RequestSequencer::default();
        let roster = sequencer.issue(FetchKey::Roster(1));
        let other = sequencer.issue(FetchKey::Roster(2));
        assert!(sequencer.is_current(FetchKey::Roster(1), roster));
        assert!(sequencer.is_current(FetchKey::Roster(2), other));
        assert!(!sequencer.is_current(FetchKey::Roster(2), roster));

        sequencer.invalidate_all();
        assert!(!sequencer.is_current(FetchKey::Roster(1), roster));
        assert!(!sequencer.is_current(FetchKey::Roster(2), other));
    }
}
