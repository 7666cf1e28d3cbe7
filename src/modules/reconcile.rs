use super::notifications::{Notification, UnreadSummary};
use super::seen::SeenSet;
use crate::error::FetchFailure;

/// Sequence number stamped on every unread fetch when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(pub u64);

/// What the user is shown, as of the last successful fetches.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WidgetState {
    pub unread_count: u32,
    pub list: Vec<Notification>,
    pub list_loaded: bool,
}

#[derive(Debug, PartialEq)]
pub enum PollResult {
    /// Badge updated; `fresh` holds the notifications to toast, in received order.
    Applied { fresh: Vec<Notification> },
    Failed,
    Stale,
}

/// The state half of the polling loop: applies fetch results to
/// [`WidgetState`] and decides which notifications deserve a toast.
///
/// Results are applied in the order they complete. With `discard_stale` set,
/// an unread result that started before the newest already-applied one is
/// dropped instead.
#[derive(Debug, Default)]
pub struct Reconciler {
    seen: SeenSet,
    state: WidgetState,
    issued: u64,
    applied: Option<RequestSeq>,
    discard_stale: bool,
}

impl Reconciler {
    pub fn new(discard_stale: bool) -> Self {
        Self { discard_stale, ..Self::default() }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    #[cfg(test)]
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn begin_unread(&mut self) -> RequestSeq {
        self.issued += 1;
        RequestSeq(self.issued)
    }

    pub fn apply_unread(&mut self, seq: RequestSeq, result: Result<UnreadSummary, FetchFailure>) -> PollResult {
        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(seq = seq.0, kind = e.kind(), error = %e, "unread fetch failed; keeping previous state");
                return PollResult::Failed;
            }
        };

        if self.discard_stale && self.applied.is_some_and(|last| seq < last) {
            tracing::debug!(seq = seq.0, "discarding stale unread summary");
            return PollResult::Stale;
        }
        self.applied = Some(self.applied.map_or(seq, |last| last.max(seq)));

        self.state.unread_count = summary.count;
        let fresh: Vec<Notification> = summary
            .notifications
            .into_iter()
            .filter(|n| self.seen.first_sighting(n.id))
            .collect();
        if !fresh.is_empty() {
            tracing::info!(count = summary.count, fresh = fresh.len(), "new notifications");
        }
        PollResult::Applied { fresh }
    }

    /// Read-through refresh of the dropdown list; no dedup.
    pub fn apply_list(&mut self, result: Result<Vec<Notification>, FetchFailure>) -> bool {
        match result {
            Ok(list) => {
                self.state.list = list;
                self.state.list_loaded = true;
                true
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "list fetch failed; keeping previous list");
                false
            }
        }
    }

    /// Optimistic zeroing after mark-all-read. The next successful poll
    /// overwrites it either way.
    pub fn zero_badge(&mut self) {
        self.state.unread_count = 0;
    }
}
