use super::{
    error::{Error, Result, TransportError},
    transport::{PendingFetch, RawResponse},
};

use bytes::Bytes;

use futures::executor::block_on;
use futures::future::{poll_fn, FutureExt};
use futures::lock::Mutex;
use futures::task::{AtomicWaker, Poll};

use reqwest::header::HeaderMap;

use serde::de::DeserializeOwned;

use std::fmt;
use std::future::Future;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

enum State {
    Unresolved(Box<dyn PendingFetch>),
    Resolved(Arc<RawResponse>),
    Failed(TransportError),
    Disconnected,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Unresolved(_) => f.write_str("Unresolved"),
            State::Resolved(raw) => f.debug_tuple("Resolved").field(&raw.status).finish(),
            State::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            State::Disconnected => f.write_str("Disconnected"),
        }
    }
}

impl State {
    /// Turns the outcome of the fetch into the next state.
    fn settle(&mut self, outcome: std::result::Result<RawResponse, TransportError>) {
        *self = match outcome {
            Ok(raw) => {
                debug!(status = raw.status, bytes = raw.body.len(), "response materialized");
                State::Resolved(Arc::new(raw))
            }
            Err(e) => {
                debug!(error = %e, "fetch failed");
                State::Failed(e)
            }
        };
    }

    /// Cancels the fetch if a disconnection was requested before it completed.
    fn apply_disconnect(&mut self, disconnect: &Disconnect) {
        if let State::Unresolved(fetch) = self {
            if disconnect.is_requested() && !fetch.is_done() && !fetch.is_cancelled() {
                debug!("disconnecting pending fetch");
                fetch.cancel();
            }

            if fetch.is_cancelled() {
                *self = State::Disconnected;
            }
        }
    }

    /// The snapshot, if the fetch has been waited on already.
    fn settled(&mut self, disconnect: &Disconnect) -> Option<Result<Arc<RawResponse>>> {
        self.apply_disconnect(disconnect);

        match self {
            State::Unresolved(_) => None,
            State::Resolved(raw) => Some(Ok(raw.clone())),
            State::Failed(e) => Some(Err(e.clone().into())),
            State::Disconnected => Some(Err(Error::Disconnected)),
        }
    }
}

/// Disconnection requests, readable without taking the state lock.
#[derive(Debug, Default)]
struct Disconnect {
    requested: AtomicBool,
    waiter: AtomicWaker,
}

impl Disconnect {
    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.waiter.wake();
    }

    /// Waits for `fetch`, or yields `None` if a disconnection is requested before it completes.
    fn race<'a>(
        &'a self,
        fetch: &'a mut Box<dyn PendingFetch>,
    ) -> impl Future<Output = Option<std::result::Result<RawResponse, TransportError>>> + 'a {
        poll_fn(move |cx| {
            self.waiter.register(cx.waker());

            if self.is_requested() && !fetch.is_done() {
                return Poll::Ready(None);
            }

            fetch.poll_unpin(cx).map(Some)
        })
    }
}

/// A response backed by a fetch that may still be in flight.
///
/// Nothing blocks when the response is created. The first call to [`status_code`],
/// [`header`], [`body_stream`] (or any other accessor) waits for the fetch to complete and
/// keeps an immutable snapshot of it; every later call reads that snapshot. Concurrent first
/// accesses wait for the same fetch.
///
/// The blocking accessors park the calling thread. From inside an async task, call
/// [`resolve`] first: the accessors won't block afterwards.
///
/// Cloning a `DeferredResponse` is cheap and yields a handle to the same response.
///
/// [`status_code`]: Self::status_code
/// [`header`]: Self::header
/// [`body_stream`]: Self::body_stream
/// [`resolve`]: Self::resolve
#[derive(Debug, Clone)]
pub struct DeferredResponse {
    state: Arc<Mutex<State>>,
    disconnect: Arc<Disconnect>,
}

impl DeferredResponse {
    /// Wraps a pending fetch. The response owns the fetch from now on.
    pub fn new(fetch: Box<dyn PendingFetch>) -> Self {
        Self::with_state(State::Unresolved(fetch))
    }

    /// A response that is resolved from the start.
    pub fn ready(raw: RawResponse) -> Self {
        Self::with_state(State::Resolved(Arc::new(raw)))
    }

    fn with_state(state: State) -> Self {
        DeferredResponse {
            state: Arc::new(Mutex::new(state)),
            disconnect: Arc::default(),
        }
    }

    fn snapshot(&self) -> Result<Arc<RawResponse>> {
        let mut state = block_on(self.state.lock());

        if let Some(settled) = state.settled(&self.disconnect) {
            return settled;
        }

        if let State::Unresolved(fetch) = &mut *state {
            trace!("waiting for pending fetch");
            let outcome = block_on(self.disconnect.race(fetch));

            if let Some(outcome) = outcome {
                state.settle(outcome);
            }
        }

        state
            .settled(&self.disconnect)
            .unwrap_or(Err(Error::Disconnected))
    }

    /// Waits for the fetch without blocking the thread. Once this returned, the other accessors
    /// are pure reads.
    pub async fn resolve(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(settled) = state.settled(&self.disconnect) {
            return settled.map(drop);
        }

        if let State::Unresolved(fetch) = &mut *state {
            trace!("awaiting pending fetch");
            let outcome = self.disconnect.race(fetch).await;

            if let Some(outcome) = outcome {
                state.settle(outcome);
            }
        }

        state
            .settled(&self.disconnect)
            .unwrap_or(Err(Error::Disconnected))
            .map(drop)
    }

    /// Whether the response has been materialized already. Never blocks for the fetch.
    pub fn is_resolved(&self) -> bool {
        match self.state.try_lock() {
            Some(state) => matches!(*state, State::Resolved(_)),
            None => false,
        }
    }

    /// The HTTP status code.
    pub fn status_code(&self) -> Result<u16> {
        Ok(self.snapshot()?.status)
    }

    /// The value of the header `name`, or `None` if the response doesn't have it. The lookup is
    /// case-insensitive. When a header appears several times, the first value is returned.
    pub fn header(&self, name: &str) -> Result<Option<String>> {
        let raw = self.snapshot()?;

        Ok(raw
            .headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()))
    }

    /// All the response headers.
    pub fn header_fields(&self) -> Result<HeaderMap> {
        Ok(self.snapshot()?.headers.clone())
    }

    /// A reader over the body. Each call returns a new reader starting at the beginning of the
    /// body.
    pub fn body_stream(&self) -> Result<Cursor<Bytes>> {
        Ok(Cursor::new(self.body()?))
    }

    pub fn body(&self) -> Result<Bytes> {
        Ok(self.snapshot()?.body.clone())
    }

    /// The body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.snapshot()?.body).into_owned())
    }

    /// Deserializes the JSON body into a `T`, whatever the status code.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.snapshot()?;
        serde_json::from_slice(&raw.body).map_err(Error::deserialization::<T>)
    }

    /// Cancels the fetch if it's still in flight. Calling it again, or after the fetch
    /// completed, does nothing. Never waits: a caller already waiting for the fetch is woken up
    /// and gets [`Error::Disconnected`].
    ///
    /// Reading a disconnected response fails with [`Error::Disconnected`].
    pub fn disconnect(&self) {
        self.disconnect.request();

        // otherwise the current waiter cancels the fetch
        if let Some(mut state) = self.state.try_lock() {
            state.apply_disconnect(&self.disconnect);
        }
    }
}
