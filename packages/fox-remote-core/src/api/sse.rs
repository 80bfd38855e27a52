//! Server-Sent Events endpoint for live status.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::{header, HeaderValue, Version};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;

use crate::api::AppState;
use crate::error::{ControlError, ControlResult};
use crate::events::{encode_status, Frame, Subscription};

/// GET /api/v1/events
///
/// Registers a subscriber, sends the current status as the first frame, then
/// relays every published frame until the client goes away or the server
/// force-closes the stream.
pub async fn events_handler(
    State(state): State<AppState>,
    version: Version,
) -> ControlResult<Response> {
    // HTTP/0.9 has no headers to carry the event-stream content type.
    // HTTP/1.0 streams with the body delimited by connection close.
    if version == Version::HTTP_09 {
        return Err(ControlError::StreamingUnsupported);
    }

    // Register before reading status so no change can fall between the
    // initial frame and the first relayed one.
    let subscription = state.subscribers().register();
    let initial = encode_status(&state.player.status())?;

    log::info!("[SSE] Stream opened: {}", subscription.id());

    let mut response = Sse::new(relay(subscription, initial)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if version == Version::HTTP_11 {
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    Ok(response)
}

/// Builds the per-connection event stream.
///
/// The subscription is owned by the stream, so dropping the response body
/// (client disconnect) or ending the loop (cancellation) deregisters it.
fn relay(
    mut subscription: Subscription,
    initial: Frame,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        yield Ok(Event::default().data(&*initial));

        let cancel_token = subscription.cancel_token().clone();
        loop {
            let next = tokio::select! {
                frame = subscription.recv() => frame,
                _ = cancel_token.cancelled() => None,
            };
            match next {
                Some(frame) => yield Ok(Event::default().data(&*frame)),
                None => break,
            }
        }

        log::info!("[SSE] Stream closed: {}", subscription.id());
    }
}
