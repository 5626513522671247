//! Network connectivity signal.
//!
//! [`ConnectivityMonitor`] is an explicitly constructed context object: the
//! host creates one, feeds it online/offline transitions, and hands clones to
//! the cache layer. Consumers subscribe through a `watch` receiver and
//! unsubscribe by dropping it.

use std::sync::Arc;
use tokio::sync::watch;

/// Connectivity snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectivityState {
    /// The environment reports network connectivity.
    pub is_online: bool,
    /// Set when the connection drops, cleared when it returns.
    pub is_offline_mode: bool,
}

impl ConnectivityState {
    fn online() -> Self {
        ConnectivityState {
            is_online: true,
            is_offline_mode: false,
        }
    }
}

/// Shared connectivity context. Clones observe the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<ConnectivityState>>,
}

impl ConnectivityMonitor {
    /// New monitor reporting online.
    pub fn new() -> Self {
        Self::with_state(ConnectivityState::online())
    }

    /// New monitor with an initial online flag.
    pub fn starting(is_online: bool) -> Self {
        Self::with_state(ConnectivityState {
            is_online,
            is_offline_mode: false,
        })
    }

    fn with_state(state: ConnectivityState) -> Self {
        let (tx, _rx) = watch::channel(state);
        ConnectivityMonitor {
            state: Arc::new(tx),
        }
    }

    /// Current online flag, read synchronously.
    pub fn is_online(&self) -> bool {
        self.state.borrow().is_online
    }

    /// True after the connection dropped and until it comes back.
    pub fn is_offline_mode(&self) -> bool {
        self.state.borrow().is_offline_mode
    }

    /// Full snapshot.
    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Record an online/offline transition. Repeated values do not notify.
    pub fn set_online(&self, is_online: bool) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_online == is_online {
                return false;
            }
            state.is_online = is_online;
            state.is_offline_mode = !is_online;
            true
        });

        if changed {
            if is_online {
                info!("Connectivity restored");
            } else {
                warn!("Connectivity lost, switching to offline mode");
            }
        }
    }

    /// Subscribe to transitions. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}
