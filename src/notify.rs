//! Popup notifications: one queue, one subscriber.
//!
//! Any task may post through the shared [`NotificationQueue`] (a
//! `static` in the firmware).  The UI task owns the
//! [`NotificationDispatcher`], which drains the queue once per frame and
//! hands every event to the current subscriber.
//!
//! The subscriber is a plain function pointer that receives a
//! caller-owned context (`&mut C`) at drain time, so the handler can
//! mutate UI state without the dispatcher borrowing it in between.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::String;

use crate::channel::MessageChannel;
use crate::config::{NOTIFICATION_CONTENT_LEN, NOTIFICATION_QUEUE_SIZE, NOTIFICATION_TITLE_LEN};
use crate::text::truncated;

pub type Title = String<NOTIFICATION_TITLE_LEN>;
pub type Content = String<NOTIFICATION_CONTENT_LEN>;

/// A request to show a popup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotificationEvent {
    pub title: Title,
    pub content: Content,
    /// Auto-dismiss delay in ms. `0` keeps the popup until replaced.
    pub timeout_ms: u32,
}

impl NotificationEvent {
    /// Build an event, truncating text that does not fit.
    pub fn new(title: &str, content: &str, timeout_ms: u32) -> Self {
        Self {
            title: truncated(title),
            content: truncated(content),
            timeout_ms,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.timeout_ms == 0
    }
}

/// Multi-producer notification queue.
pub struct NotificationQueue {
    channel: MessageChannel<CriticalSectionRawMutex, NotificationEvent, NOTIFICATION_QUEUE_SIZE>,
}

impl NotificationQueue {
    pub const fn new() -> Self {
        Self {
            channel: MessageChannel::new(),
        }
    }

    /// Queue a notification. Returns `false` if the queue is full.
    pub fn post(&self, title: &str, content: &str, timeout_ms: u32) -> bool {
        debug!(
            "notification posted: {=str} / {=str} ({} ms)",
            title,
            content,
            timeout_ms
        );
        self.post_event(NotificationEvent::new(title, content, timeout_ms))
    }

    pub fn post_event(&self, event: NotificationEvent) -> bool {
        self.channel.post(event)
    }

    /// Events waiting for the next `process_pending`.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    fn drain_all(&self, visit: impl FnMut(NotificationEvent)) -> usize {
        self.channel.drain_all(visit)
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber callback: receives the dispatcher owner's context and the
/// event, which it consumes.
pub type NotificationHandler<C> = fn(&mut C, NotificationEvent);

/// Single-subscriber dispatcher over a [`NotificationQueue`].
pub struct NotificationDispatcher<'q, C> {
    queue: &'q NotificationQueue,
    handler: Option<NotificationHandler<C>>,
}

impl<'q, C> NotificationDispatcher<'q, C> {
    pub const fn new(queue: &'q NotificationQueue) -> Self {
        Self {
            queue,
            handler: None,
        }
    }

    /// Install `handler`, replacing any previous one. Last caller wins.
    pub fn subscribe(&mut self, handler: NotificationHandler<C>) {
        if self.handler.is_some() {
            debug!("notification subscriber replaced");
        }
        self.handler = Some(handler);
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.is_some()
    }

    /// Same as [`NotificationQueue::post`].
    pub fn post(&self, title: &str, content: &str, timeout_ms: u32) -> bool {
        self.queue.post(title, content, timeout_ms)
    }

    /// Drain every pending event in arrival order and deliver it.
    ///
    /// Without a subscriber the events are drained and dropped, never left
    /// queued. Returns how many events were drained.
    pub fn process_pending(&mut self, ctx: &mut C) -> usize {
        match self.handler {
            Some(handler) => self.queue.drain_all(|event| handler(ctx, event)),
            None => {
                let discarded = self.queue.drain_all(|_| {});
                if discarded > 0 {
                    debug!("{} notifications discarded, no subscriber", discarded);
                }
                discarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(log: &mut Vec<NotificationEvent>, event: NotificationEvent) {
        log.push(event);
    }

    fn record_titles_upper(log: &mut Vec<NotificationEvent>, mut event: NotificationEvent) {
        let upper = event.title.to_uppercase();
        event.title = truncated(&upper);
        log.push(event);
    }

    #[test]
    fn events_are_delivered_in_arrival_order() {
        let queue = NotificationQueue::new();
        let mut dispatcher = NotificationDispatcher::new(&queue);
        dispatcher.subscribe(record);

        assert!(dispatcher.post("Volumio", "Connected", 5000));
        assert!(queue.post("Updating", "Starting...", 0));

        let mut log = Vec::new();
        assert_eq!(dispatcher.process_pending(&mut log), 2);
        assert_eq!(log[0], NotificationEvent::new("Volumio", "Connected", 5000));
        assert_eq!(log[1].title.as_str(), "Updating");
        assert!(log[1].is_persistent());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn events_without_subscriber_are_discarded() {
        let queue = NotificationQueue::new();
        let mut dispatcher: NotificationDispatcher<'_, Vec<NotificationEvent>> =
            NotificationDispatcher::new(&queue);
        queue.post("a", "b", 1);
        queue.post("c", "d", 1);

        let mut log = Vec::new();
        assert_eq!(dispatcher.process_pending(&mut log), 2);
        assert_eq!(queue.pending(), 0);

        // Subscribing later does not resurrect them.
        dispatcher.subscribe(record);
        assert_eq!(dispatcher.process_pending(&mut log), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn last_subscriber_wins() {
        let queue = NotificationQueue::new();
        let mut dispatcher = NotificationDispatcher::new(&queue);
        dispatcher.subscribe(record);
        dispatcher.subscribe(record_titles_upper);
        assert!(dispatcher.is_subscribed());

        queue.post("wifi", "lost", 5000);
        let mut log = Vec::new();
        dispatcher.process_pending(&mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].title.as_str(), "WIFI");
    }

    #[test]
    fn post_fails_when_queue_is_full() {
        let queue = NotificationQueue::new();
        for i in 0..NOTIFICATION_QUEUE_SIZE {
            assert!(queue.post("n", "", i as u32));
        }
        assert!(!queue.post("overflow", "", 0));
        assert_eq!(queue.pending(), NOTIFICATION_QUEUE_SIZE);
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "x".repeat(NOTIFICATION_CONTENT_LEN + 10);
        let event = NotificationEvent::new("t", &long, 0);
        assert_eq!(event.content.len(), NOTIFICATION_CONTENT_LEN);
    }
}
