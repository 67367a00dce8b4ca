#![forbid(unsafe_code)]

//! Bookkeeping for event listeners attached to DOM targets.
//!
//! The registry only stores what was attached so it can be detached later.
//! It never touches the DOM itself: callers attach before [`ListenerRegistry::attach`]
//! and detach whatever [`ListenerRegistry::attach`], [`ListenerRegistry::prune`]
//! or [`ListenerRegistry::drain`] hands back.

/// One attached listener.
#[derive(Debug)]
pub struct Registration<T, L> {
    pub target: T,
    pub event: &'static str,
    pub capture: bool,
    pub listener: L,
}

/// Listeners keyed by `(target, event, capture)`.
///
/// At most one listener is kept per key, so re-attaching after a frame
/// reload replaces the earlier entry instead of growing the set.
#[derive(Debug)]
pub struct ListenerRegistry<T, L> {
    entries: Vec<Registration<T, L>>,
}

impl<T, L> Default for ListenerRegistry<T, L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq, L> ListenerRegistry<T, L> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attached listener. Returns the entry it replaced, which the
    /// caller must detach.
    pub fn attach(
        &mut self,
        target: T,
        event: &'static str,
        capture: bool,
        listener: L,
    ) -> Option<Registration<T, L>> {
        let entry = Registration {
            target,
            event,
            capture,
            listener,
        };
        match self.entries.iter().position(|e| {
            e.target == entry.target && e.event == entry.event && e.capture == entry.capture
        }) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index], entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Whether a listener for this key is recorded.
    #[must_use]
    pub fn contains(&self, target: &T, event: &str, capture: bool) -> bool {
        self.entries
            .iter()
            .any(|e| &e.target == target && e.event == event && e.capture == capture)
    }

    /// Remove entries whose target fails `keep`.
    pub fn prune(&mut self, mut keep: impl FnMut(&T) -> bool) -> Vec<Registration<T, L>> {
        let (kept, removed) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| keep(&e.target));
        self.entries = kept;
        removed
    }

    /// Remove every entry.
    pub fn drain(&mut self) -> Vec<Registration<T, L>> {
        std::mem::take(&mut self.entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
