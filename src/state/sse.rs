use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

const EVENT_CAPACITY: usize = 256;
const TICK_CAPACITY: usize = 64;

/// Broadcast hub used by the SSE services.
///
/// Countdown ticks travel on their own lossy channel so that a slow client falling behind on
/// ticks never overwrites round results or score hand-offs waiting on the event channel.
pub struct SseHub {
    events: broadcast::Sender<ServerEvent>,
    ticks: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub with the default capacities.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CAPACITY, TICK_CAPACITY)
    }

    /// Hub whose event and tick channels hold the given number of pending messages.
    pub fn with_capacity(events: usize, ticks: usize) -> Self {
        let (events, _receiver) = broadcast::channel(events);
        let (ticks, _receiver) = broadcast::channel(ticks);
        Self { events, ticks }
    }

    /// Register a subscriber to lifecycle events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Register a subscriber to countdown ticks sent after this call.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<ServerEvent> {
        self.ticks.subscribe()
    }

    /// Send a lifecycle event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }

    /// Send a countdown tick, ignoring delivery errors.
    pub fn broadcast_tick(&self, event: ServerEvent) {
        let _ = self.ticks.send(event);
    }
}

impl Default for SseHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_sent_after_subscribing() {
        let hub = SseHub::new();
        hub.broadcast(ServerEvent::new(Some("early".into()), "lost".into()));

        let mut rx = hub.subscribe();
        hub.broadcast(ServerEvent::new(Some("round.ended".into()), "{}".into()));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("round.ended"));
        assert_eq!(event.data, "{}");
    }

    #[tokio::test]
    async fn ticks_stay_off_the_event_channel() {
        let hub = SseHub::new();
        let mut events = hub.subscribe();
        let mut ticks = hub.subscribe_ticks();

        hub.broadcast_tick(ServerEvent::new(Some("round.tick".into()), "{}".into()));

        assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
        let tick = ticks.recv().await.unwrap();
        assert_eq!(tick.event.as_deref(), Some("round.tick"));
    }

    #[tokio::test]
    async fn tick_overflow_keeps_pending_events() {
        let hub = SseHub::with_capacity(4, 2);
        let mut events = hub.subscribe();
        let mut ticks = hub.subscribe_ticks();

        hub.broadcast(ServerEvent::new(Some("round.ended".into()), "{}".into()));
        for _ in 0..10 {
            hub.broadcast_tick(ServerEvent::new(Some("round.tick".into()), "{}".into()));
        }

        assert!(matches!(ticks.try_recv(), Err(TryRecvError::Lagged(8))));
        let ended = events.recv().await.unwrap();
        assert_eq!(ended.event.as_deref(), Some("round.ended"));
    }
}
