#![forbid(unsafe_code)]

//! On-page diagnostic toasts.
//!
//! At most one toast is visible. Pushing a new toast replaces the current
//! one; `tick` hides it once its deadline passes. The host renders the
//! [`DiagnosticAction`]s it receives and never reads the queue directly.

use core::time::Duration;

/// Identifier of a pushed toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

/// A visible diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Identifier.
    pub id: ToastId,
    /// Multi-line message.
    pub message: String,
    /// Monotonic time after which the toast is hidden.
    pub expires_at: Duration,
}

/// Rendering instructions for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticAction {
    /// Display the toast, replacing whatever is shown.
    Show(Toast),
    /// Remove the toast with this id if it is still displayed.
    Hide(ToastId),
}

/// Queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticStats {
    /// Toasts pushed.
    pub total_pushed: u64,
    /// Toasts replaced before expiring.
    pub replaced: u64,
    /// Toasts hidden by expiry.
    pub auto_expired: u64,
}

/// Single-slot toast queue.
#[derive(Debug, Default)]
pub struct DiagnosticQueue {
    visible: Option<Toast>,
    next_id: u64,
    stats: DiagnosticStats,
}

impl DiagnosticQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` until `now + duration`, replacing any visible toast.
    pub fn push(
        &mut self,
        message: impl Into<String>,
        now: Duration,
        duration: Duration,
    ) -> Vec<DiagnosticAction> {
        self.stats.total_pushed += 1;
        let mut actions = Vec::with_capacity(2);
        if let Some(previous) = self.visible.take() {
            self.stats.replaced += 1;
            actions.push(DiagnosticAction::Hide(previous.id));
        }

        self.next_id += 1;
        let toast = Toast {
            id: ToastId(self.next_id),
            message: message.into(),
            expires_at: now.saturating_add(duration),
        };
        actions.push(DiagnosticAction::Show(toast.clone()));
        self.visible = Some(toast);
        actions
    }

    /// Hide the visible toast if it has expired.
    pub fn tick(&mut self, now: Duration) -> Vec<DiagnosticAction> {
        match &self.visible {
            Some(toast) if toast.expires_at <= now => {
                let id = toast.id;
                self.visible = None;
                self.stats.auto_expired += 1;
                vec![DiagnosticAction::Hide(id)]
            }
            _ => Vec::new(),
        }
    }

    /// The visible toast.
    #[must_use]
    pub fn visible(&self) -> Option<&Toast> {
        self.visible.as_ref()
    }

    /// Deadline of the visible toast.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.visible.as_ref().map(|toast| toast.expires_at)
    }

    /// Statistics.
    #[must_use]
    pub fn stats(&self) -> DiagnosticStats {
        self.stats
    }
}

/// Text of the stuck diagnostic.
#[must_use]
pub fn stuck_message(count: u32, rationale: &str, delta: f64, positions: usize) -> String {
    format!(
        "\u{26a0}\u{fe0f} STUCK ({count}x)\n{rationale}\n\nScroll delta: {delta:.1}px\nPositions found: {positions}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn push_shows_and_tick_expires() {
        let mut queue = DiagnosticQueue::new();
        let actions = queue.push("hello", ms(0), ms(5000));
        assert!(matches!(&actions[..], [DiagnosticAction::Show(t)] if t.message == "hello"));
        assert_eq!(queue.next_deadline(), Some(ms(5000)));

        assert!(queue.tick(ms(4999)).is_empty());
        let hidden = queue.tick(ms(5000));
        assert_eq!(hidden, vec![DiagnosticAction::Hide(ToastId(1))]);
        assert!(queue.visible().is_none());
        assert_eq!(queue.stats().auto_expired, 1);
    }

    #[test]
    fn new_toast_replaces_visible_one() {
        let mut queue = DiagnosticQueue::new();
        queue.push("first", ms(0), ms(5000));
        let actions = queue.push("second", ms(100), ms(5000));
        assert_eq!(actions[0], DiagnosticAction::Hide(ToastId(1)));
        assert!(matches!(&actions[1], DiagnosticAction::Show(t) if t.id == ToastId(2)));
        assert_eq!(queue.visible().map(|t| t.message.as_str()), Some("second"));
        assert_eq!(queue.stats().replaced, 1);

        // The first toast's deadline no longer applies.
        assert!(queue.tick(ms(5000)).is_empty());
    }

    #[test]
    fn stuck_message_format() {
        let message = stuck_message(2, "S: No images below", 0.0, 7);
        assert_eq!(
            message,
            "\u{26a0}\u{fe0f} STUCK (2x)\nS: No images below\n\nScroll delta: 0.0px\nPositions found: 7"
        );
    }
}
