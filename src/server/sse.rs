//! Server-sent events stream that tells preview pages to reload.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::build::RefreshNotifier;
use crate::emit::REFRESH_ROUTE;

/// Create the refresh stream router.
pub fn create_refresh_router(refresh: RefreshNotifier) -> Router {
    Router::new()
        .route(REFRESH_ROUTE, get(refresh_handler))
        .with_state(refresh)
}

/// One `refresh` event per client-refresh signal.
async fn refresh_handler(
    State(refresh): State<RefreshNotifier>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("Preview client connected");
    Sse::new(refresh_events(&refresh)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Stream of refresh events. A lagging client skips missed signals; one
/// reload covers them all.
fn refresh_events(refresh: &RefreshNotifier) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(refresh.subscribe()).filter_map(|signal| match signal {
        Ok(n) => Some(Ok(Event::default().event("refresh").data(n.to_string()))),
        Err(e) => {
            tracing::debug!(error = %e, "Preview client lagged");
            None
        }
    })
}
