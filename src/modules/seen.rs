use std::collections::HashSet;

use super::notifications::NotificationId;

/// Ids that have already been surfaced as a toast this session.
///
/// Grows monotonically; nothing is ever evicted. This is not the read flag:
/// an id stays here after it is read, and an unread id leaves nothing here
/// until its first toast.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<NotificationId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, id: NotificationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn mark_seen(&mut self, id: NotificationId) {
        self.ids.insert(id);
    }

    /// Returns true exactly once per id.
    pub fn first_sighting(&mut self, id: NotificationId) -> bool {
        if self.has_seen(id) {
            return false;
        }
        self.mark_seen(id);
        true
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_remembered() {
        let mut seen = SeenSet::new();
        assert!(!seen.has_seen(NotificationId(4)));
        seen.mark_seen(NotificationId(4));
        seen.mark_seen(NotificationId(4));
        assert!(seen.has_seen(NotificationId(4)));
        assert!(!seen.has_seen(NotificationId(5)));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn first_sighting_fires_once() {
        let mut seen = SeenSet::new();
        assert!(seen.first_sighting(NotificationId(1)));
        assert!(!seen.first_sighting(NotificationId(1)));
        assert!(seen.has_seen(NotificationId(1)));
    }
}
