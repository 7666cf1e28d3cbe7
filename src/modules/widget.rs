use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::api::NotificationApi;
use super::cues::Cues;
use super::notifications::{Notification, NotificationId, UnreadSummary};
use super::poller::PollHandle;
use super::reconcile::{PollResult, Reconciler, RequestSeq};
use super::render::badge_text;
use super::toasts::{schedule_dismissal, ToastId, ToastTray};
use crate::config::Config;
use crate::error::FetchFailure;

/// Completion messages from timers and in-flight requests. They are applied
/// one at a time, in arrival order, by whoever owns the widget.
#[derive(Debug)]
pub enum Outcome {
    PollTick,
    Unread { seq: RequestSeq, result: Result<UnreadSummary, FetchFailure> },
    FullList(Result<Vec<Notification>, FetchFailure>),
    MarkedRead { id: NotificationId, result: Result<(), FetchFailure> },
    MarkedAllRead(Result<(), FetchFailure>),
    ToastFading(ToastId),
    ToastExpired(ToastId),
}

/// Everything the user can ask the widget to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleDropdown,
    CloseDropdown,
    MarkRead(NotificationId),
    /// Clicking the body of a toast: mark it read and take it down.
    OpenToast(ToastId),
    /// The toast's close control: take it down, leave it unread.
    DismissToast(ToastId),
    MarkAllRead,
    PollNow,
}

#[derive(Debug, Clone)]
pub struct WidgetSettings {
    pub poll_interval: Duration,
    pub toast_visible: Duration,
    pub toast_fade: Duration,
    pub discard_stale: bool,
    pub cues: Cues,
}

impl WidgetSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            toast_visible: config.toast_visible(),
            toast_fade: config.toast_fade(),
            discard_stale: config.discard_stale_responses,
            cues: Cues { sound: config.sound, desktop: config.desktop_notifications },
        }
    }
}

pub struct NotificationWidget {
    api: Arc<dyn NotificationApi>,
    settings: WidgetSettings,
    reconciler: Reconciler,
    toasts: ToastTray,
    dropdown_open: bool,
    poll: Option<PollHandle>,
    last_failure: Option<String>,
    tx: UnboundedSender<Outcome>,
    rx: UnboundedReceiver<Outcome>,
}

impl NotificationWidget {
    pub fn new(api: Arc<dyn NotificationApi>, settings: WidgetSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            reconciler: Reconciler::new(settings.discard_stale),
            settings,
            toasts: ToastTray::new(),
            dropdown_open: false,
            poll: None,
            last_failure: None,
            tx,
            rx,
        }
    }

    /// Loads the badge and list once, then starts the recurring poll.
    pub fn start(&mut self) {
        if self.poll.is_some() {
            return;
        }
        self.spawn_unread();
        self.spawn_list();
        self.poll = Some(PollHandle::spawn(self.settings.poll_interval, self.tx.clone()));
    }

    /// The only place polling ends.
    pub fn teardown(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_running)
    }

    pub fn badge(&self) -> Option<String> {
        badge_text(self.reconciler.state().unread_count)
    }

    pub fn unread_count(&self) -> u32 {
        self.reconciler.state().unread_count
    }

    pub fn list(&self) -> &[Notification] {
        &self.reconciler.state().list
    }

    pub fn list_loaded(&self) -> bool {
        self.reconciler.state().list_loaded
    }

    pub fn dropdown_open(&self) -> bool {
        self.dropdown_open
    }

    pub fn toasts(&self) -> &ToastTray {
        &self.toasts
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn execute(&mut self, command: Command) {
        tracing::debug!(?command, "command");
        match command {
            Command::ToggleDropdown => {
                self.dropdown_open = !self.dropdown_open;
                if self.dropdown_open {
                    self.spawn_list();
                }
            }
            Command::CloseDropdown => self.dropdown_open = false,
            Command::MarkRead(id) => self.spawn_mark_read(id),
            Command::OpenToast(toast) => {
                if let Some(t) = self.toasts.remove(toast) {
                    self.spawn_mark_read(t.notification.id);
                }
            }
            Command::DismissToast(toast) => {
                self.toasts.remove(toast);
            }
            Command::MarkAllRead => {
                self.reconciler.zero_badge();
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.mark_all_read().await;
                    let _ = tx.send(Outcome::MarkedAllRead(result));
                });
            }
            Command::PollNow => self.spawn_unread(),
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::PollTick => self.spawn_unread(),
            Outcome::Unread { seq, result } => {
                let failure = result.as_ref().err().map(|e| format!("Unread fetch failed: {e}"));
                match self.reconciler.apply_unread(seq, result) {
                    PollResult::Applied { fresh } => {
                        self.last_failure = None;
                        for notification in fresh {
                            self.surface(notification);
                        }
                    }
                    PollResult::Failed => self.last_failure = failure,
                    PollResult::Stale => {}
                }
            }
            Outcome::FullList(result) => {
                let failure = result.as_ref().err().map(|e| format!("List fetch failed: {e}"));
                if !self.reconciler.apply_list(result) {
                    self.last_failure = failure;
                }
            }
            Outcome::MarkedRead { id, result } => match result {
                Ok(()) => self.converge(),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "mark read failed");
                    self.last_failure = Some(format!("Mark read failed: {e}"));
                }
            },
            Outcome::MarkedAllRead(result) => match result {
                Ok(()) => {
                    self.reconciler.zero_badge();
                    self.converge();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "mark all read failed");
                    self.last_failure = Some(format!("Mark all read failed: {e}"));
                }
            },
            Outcome::ToastFading(id) => {
                self.toasts.fade(id);
            }
            Outcome::ToastExpired(id) => {
                self.toasts.remove(id);
            }
        }
    }

    /// Applies every outcome that is already waiting. Never blocks.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    fn surface(&mut self, notification: Notification) {
        self.settings.cues.announce(&notification);
        let id = self.toasts.push(notification);
        schedule_dismissal(self.tx.clone(), id, self.settings.toast_visible, self.settings.toast_fade);
    }

    /// Best-effort refresh of both views after a successful mutation.
    fn converge(&mut self) {
        self.spawn_unread();
        self.spawn_list();
    }

    fn spawn_unread(&mut self) {
        let seq = self.reconciler.begin_unread();
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_unread().await;
            let _ = tx.send(Outcome::Unread { seq, result });
        });
    }

    fn spawn_list(&self) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_all().await;
            let _ = tx.send(Outcome::FullList(result));
        });
    }

    fn spawn_mark_read(&self, id: NotificationId) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.mark_read(id).await;
            let _ = tx.send(Outcome::MarkedRead { id, result });
        });
    }
}
