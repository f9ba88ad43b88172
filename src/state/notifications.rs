//! Transient notices shown in the status bar

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Most notices kept at once; older ones are dropped first
const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Sink for user-facing feedback such as upload confirmations
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
}

/// Queue of notices that expire after [`NOTICE_TTL`]
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            kind,
            message: message.into(),
            shown_at: now,
        });
    }

    /// Drop expired notices
    pub fn prune(&mut self, now: Instant) {
        self.notices
            .retain(|n| now.saturating_duration_since(n.shown_at) < NOTICE_TTL);
    }

    /// Most recent notice
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Notifier that records notices at `now`
    pub fn stamped(&mut self, now: Instant) -> StampedNotifier<'_> {
        StampedNotifier { queue: self, now }
    }
}

pub struct StampedNotifier<'a> {
    queue: &'a mut NoticeQueue,
    now: Instant,
}

impl Notifier for StampedNotifier<'_> {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        self.queue.push(kind, message, self.now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_notice_wins() {
        let now = Instant::now();
        let mut queue = NoticeQueue::new();
        queue.push(NoticeKind::Info, "first", now);
        queue.push(NoticeKind::Success, "second", now);
        assert_eq!(queue.latest().map(|n| n.message.as_str()), Some("second"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_prune_drops_expired() {
        let now = Instant::now();
        let mut queue = NoticeQueue::new();
        queue.push(NoticeKind::Info, "old", now);
        queue.push(NoticeKind::Info, "new", now + Duration::from_millis(1500));
        queue.prune(now + NOTICE_TTL);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.latest().map(|n| n.message.as_str()), Some("new"));
    }

    #[test]
    fn test_queue_is_bounded() {
        let now = Instant::now();
        let mut queue = NoticeQueue::new();
        for i in 0..10 {
            queue.push(NoticeKind::Info, format!("n{i}"), now);
        }
        assert_eq!(queue.len(), MAX_NOTICES);
    }

    #[test]
    fn test_stamped_notifier_uses_given_time() {
        let now = Instant::now();
        let mut queue = NoticeQueue::new();
        queue.stamped(now).notify(NoticeKind::Error, "failed");
        let notice = queue.latest().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.shown_at, now);
        queue.prune(now + NOTICE_TTL);
        assert!(queue.is_empty());
    }
}
