use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use super::notifications::Notification;
use super::widget::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub notification: Notification,
    pub phase: ToastPhase,
}

/// Live toasts in arrival order; the last one is the newest.
#[derive(Debug, Default)]
pub struct ToastTray {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) -> ToastId {
        self.next_id += 1;
        let id = ToastId(self.next_id);
        self.toasts.push(Toast { id, notification, phase: ToastPhase::Visible });
        id
    }

    /// False if the toast is already gone.
    pub fn fade(&mut self, id: ToastId) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.phase = ToastPhase::Fading;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ToastId) -> Option<Toast> {
        let pos = self.toasts.iter().position(|t| t.id == id)?;
        Some(self.toasts.remove(pos))
    }

    pub fn newest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// One-shot timer for a single toast: visible, then fading, then gone.
/// A toast closed early simply ignores the late messages.
pub fn schedule_dismissal(tx: UnboundedSender<Outcome>, id: ToastId, visible: Duration, fade: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(visible).await;
        if tx.send(Outcome::ToastFading(id)).is_err() {
            return;
        }
        tokio::time::sleep(fade).await;
        let _ = tx.send(Outcome::ToastExpired(id));
    });
}
