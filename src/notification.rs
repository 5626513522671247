//! User-facing notifications.
//!
//! The controller only sees the [`Notifier`] trait. [`NotificationCenter`] is
//! the stock implementation: an explicitly constructed context object that
//! keeps the visible toasts, dismisses each one after a fixed display
//! duration, and broadcasts every change to its subscribers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;

/// How long a notification stays visible.
pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(3000);

const EVENT_CAPACITY: usize = 64;

/// Severity of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Info => write!(f, "info"),
            NotificationKind::Warning => write!(f, "warning"),
        }
    }
}

/// A visible notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
}

/// Change broadcast to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationEvent {
    Added(Notification),
    Dismissed(String),
}

/// Sink for user-facing messages. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Type alias for shared notifier reference.
pub type NotifierRef = Arc<dyn Notifier>;

/// Notifier that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str, _kind: NotificationKind) {}
}

struct Inner {
    visible: Mutex<Vec<Notification>>,
    events: broadcast::Sender<NotificationEvent>,
    display_duration: Duration,
}

impl Inner {
    fn visible(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.visible.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dismiss(&self, id: &str) -> bool {
        let removed = {
            let mut visible = self.visible();
            let before = visible.len();
            visible.retain(|n| n.id != id);
            visible.len() != before
        };

        if removed {
            // No subscribers is fine
            let _ = self.events.send(NotificationEvent::Dismissed(id.to_string()));
        }
        removed
    }
}

/// Shared notification context. Clones observe the same notifications.
///
/// # Example
///
/// ```
/// use crud_kit::notification::{NotificationCenter, NotificationKind};
///
/// let center = NotificationCenter::new();
/// let id = center.success("Saved");
///
/// assert_eq!(center.notifications()[0].kind, NotificationKind::Success);
/// center.dismiss(&id);
/// assert!(center.notifications().is_empty());
/// ```
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// New center with the default 3 second display duration.
    pub fn new() -> Self {
        Self::with_display_duration(DEFAULT_DISPLAY_DURATION)
    }

    /// New center with a custom display duration.
    pub fn with_display_duration(display_duration: Duration) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        NotificationCenter {
            inner: Arc::new(Inner {
                visible: Mutex::new(Vec::new()),
                events,
                display_duration,
            }),
        }
    }

    /// Show a notification and return its id.
    ///
    /// Inside a Tokio runtime the notification is dismissed automatically
    /// after the display duration; outside one it stays until dismissed.
    pub fn add(&self, message: impl Into<String>, kind: NotificationKind) -> String {
        let notification = Notification {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            kind,
        };
        let id = notification.id.clone();

        debug!("Notification {} ({}): {}", id, kind, notification.message);
        self.inner.visible().push(notification.clone());
        let _ = self.inner.events.send(NotificationEvent::Added(notification));

        self.schedule_dismiss(id.clone());
        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.add(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.add(message, NotificationKind::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.add(message, NotificationKind::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.add(message, NotificationKind::Warning)
    }

    /// Remove a notification before its timer fires. Returns false if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        self.inner.dismiss(id)
    }

    /// Snapshot of visible notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.visible().clone()
    }

    /// Subscribe to add/dismiss events. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    fn schedule_dismiss(&self, id: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        // The timer must not keep a dropped center alive
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.display_duration;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.dismiss(&id);
            }
        });
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.add(message, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_dismiss_without_runtime() {
        let center = NotificationCenter::new();

        let first = center.info("one");
        let second = center.warning("two");
        assert_ne!(first, second);

        let visible = center.notifications();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].message, "one");
        assert_eq!(visible[1].kind, NotificationKind::Warning);

        assert!(center.dismiss(&first));
        assert!(!center.dismiss(&first));
        assert_eq!(center.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_display_duration() {
        let center = NotificationCenter::new();
        center.success("saved");

        tokio::time::sleep(Duration::from_millis(2_999)).await;
        assert_eq!(center.notifications().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_add_and_dismiss() {
        let center = NotificationCenter::new();
        let mut rx = center.subscribe();

        let id = center.error("boom");
        center.dismiss(&id);

        match rx.recv().await.expect("added event") {
            NotificationEvent::Added(n) => {
                assert_eq!(n.message, "boom");
                assert_eq!(n.kind, NotificationKind::Error);
            }
            other => panic!("Expected Added, got {:?}", other),
        }
        assert_eq!(
            rx.recv().await.expect("dismissed event"),
            NotificationEvent::Dismissed(id)
        );

        drop(rx);
        assert_eq!(center.subscriber_count(), 0);
    }

    #[test]
    fn test_notifier_trait_object() {
        let center = NotificationCenter::new();
        let notifier: NotifierRef = Arc::new(center.clone());

        notifier.notify("hello", NotificationKind::Info);
        assert_eq!(center.notifications()[0].message, "hello");
    }

    #[test]
    fn test_independent_centers() {
        let a = NotificationCenter::new();
        let b = NotificationCenter::new();

        a.info("only in a");
        assert!(b.notifications().is_empty());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NotificationKind::Success.to_string(), "success");
        assert_eq!(NotificationKind::Warning.to_string(), "warning");
    }
}
