use std::convert::Infallible;
use std::pin::Pin;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;

use crate::context::AcquisitionContext;

pub type LiveStream = Sse<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

fn to_event<T: Serialize>(name: &'static str, value: &T) -> Option<Result<Event, Infallible>> {
    match serde_json::to_string(value) {
        Ok(payload) => Some(Ok(Event::default().event(name).data(payload))),
        Err(err) => {
            log::warn!("[HTTP] Dropping unserializable {} event: {}", name, err);
            None
        }
    }
}

/// Server-Sent Events stream of `sample` and `recording` events.
///
/// Lagged subscribers silently skip the messages they missed.
pub fn live(context: &AcquisitionContext) -> LiveStream {
    let samples = BroadcastStream::new(context.subscribe_samples()).filter_map(|result| async move {
        result.ok().and_then(|sample| to_event("sample", &sample))
    });
    let events = BroadcastStream::new(context.subscribe_events()).filter_map(|result| async move {
        result.ok().and_then(|event| to_event("recording", &event))
    });

    let stream = futures::stream::select(samples, events);
    Sse::new(Box::pin(stream) as Pin<Box<_>>).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("roast-keepalive"),
    )
}
