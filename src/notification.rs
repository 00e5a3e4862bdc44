// ============================================================================
// Unsaved-Changes Notification
// ============================================================================
//
// Two states, kept in lockstep with the change set:
//
//   Quiescent ──first track──> Pending
//   Pending ──commit / discard──> Quiescent
//
// Subscribers are woken on toggles only, never on repeated edits.
//
// ============================================================================

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Quiescent,
    Pending,
}

impl std::fmt::Display for NotificationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationPhase::Quiescent => write!(f, "QUIESCENT"),
            NotificationPhase::Pending => write!(f, "PENDING"),
        }
    }
}

#[derive(Debug)]
pub struct NotificationState {
    sender: watch::Sender<bool>,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn is_pending(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn phase(&self) -> NotificationPhase {
        if self.is_pending() {
            NotificationPhase::Pending
        } else {
            NotificationPhase::Quiescent
        }
    }

    /// Set the flag. Returns `true` if this was a transition.
    pub fn set(&self, pending: bool) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == pending {
                false
            } else {
                *current = pending;
                true
            }
        })
    }

    /// Receiver that observes each quiescent/pending toggle
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
