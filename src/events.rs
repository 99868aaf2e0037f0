use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveEventKind {
    ClockIn,
    ClockOut,
    TrackingPing,
    LeaveDecision,
}

/// One dashboard update: who did what, when.
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub kind: LiveEventKind,
    pub employee_id: u64,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(kind: LiveEventKind, employee_id: u64, message: impl Into<String>) -> Self {
        Self {
            kind,
            employee_id,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Live-update hub for the admin dashboard. Constructed once by the
/// composition root and injected as app data — handlers publish, SSE
/// connections subscribe. `shutdown` closes every open stream.
pub struct EventHub {
    subscribers: Mutex<Vec<UnboundedSender<LiveEvent>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<LiveEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .expect("event hub poisoned")
            .push(tx);
        rx
    }

    /// Fan the event out; subscribers whose connection has gone away are
    /// dropped on the spot.
    pub fn publish(&self, event: LiveEvent) {
        let mut subs = self.subscribers.lock().expect("event hub poisoned");
        subs.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event hub poisoned").len()
    }

    pub fn shutdown(&self) {
        let mut subs = self.subscribers.lock().expect("event hub poisoned");
        for tx in subs.drain(..) {
            tx.close_channel();
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-sent events stream of live updates
#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "text/event-stream of live dashboard updates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn stream_events(
    auth: AuthUser,
    hub: web::Data<EventHub>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let stream = hub.subscribe().map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, actix_web::Error>(web::Bytes::from(format!("data: {payload}\n\n")))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn publish_reaches_subscriber() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.publish(LiveEvent::new(LiveEventKind::ClockIn, 42, "clock-in"));

        let event = block_on(rx.next()).unwrap();
        assert_eq!(event.employee_id, 42);
        assert_eq!(event.message, "clock-in");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(rx);
        hub.publish(LiveEvent::new(LiveEventKind::TrackingPing, 1, "ping"));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn shutdown_closes_streams() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.shutdown();
        assert_eq!(hub.subscriber_count(), 0);
        assert!(block_on(rx.next()).is_none());
    }
}
