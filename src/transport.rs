use super::error::{TransportError, TransportErrorKind};

use bytes::Bytes;

use futures::task::{Context, Poll};

use reqwest::header::HeaderMap;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

/// What a fetch eventually yields: the status code, response headers and the raw body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// An in-flight, cancellable fetch.
///
/// Polling it drives the fetch to completion. It is polled at most until it yields once.
pub trait PendingFetch:
    Future<Output = Result<RawResponse, TransportError>> + Send + Unpin
{
    /// Whether the fetch has completed, successfully or not.
    fn is_done(&self) -> bool;

    /// Whether [`cancel`](Self::cancel) was called before completion.
    fn is_cancelled(&self) -> bool;

    /// Requests cancellation of the fetch.
    fn cancel(&mut self);
}

/// Starts fetches.
pub trait Transport: Send + Sync {
    fn start_fetch(&self, request: reqwest::Request) -> Box<dyn PendingFetch>;
}

/// The tokio runtime fetches are spawned on.
#[derive(Clone)]
pub(crate) enum RuntimeHandle {
    /// The runtime the client was created in.
    Ambient(Handle),
    /// A runtime created for the client. It lives until the client and every fetch it started
    /// are dropped.
    Owned(Arc<Runtime>),
}

impl RuntimeHandle {
    /// Uses the current runtime if there is one, otherwise builds a dedicated one.
    pub(crate) fn current_or_owned() -> std::io::Result<Self> {
        match Handle::try_current() {
            Ok(handle) => Ok(RuntimeHandle::Ambient(handle)),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("twasync-fetch")
                    .enable_all()
                    .build()?;

                Ok(RuntimeHandle::Owned(Arc::new(runtime)))
            }
        }
    }

    fn handle(&self) -> &Handle {
        match self {
            RuntimeHandle::Ambient(handle) => handle,
            RuntimeHandle::Owned(runtime) => runtime.handle(),
        }
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeHandle::Ambient(_) => f.write_str("Ambient"),
            RuntimeHandle::Owned(_) => f.write_str("Owned"),
        }
    }
}

/// [`Transport`] executing requests with `reqwest` on a tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: RuntimeHandle,
}

impl HttpTransport {
    pub(crate) fn new(client: reqwest::Client, runtime: RuntimeHandle) -> Self {
        HttpTransport { client, runtime }
    }
}

impl Transport for HttpTransport {
    fn start_fetch(&self, request: reqwest::Request) -> Box<dyn PendingFetch> {
        let client = self.client.clone();

        let handle = self.runtime.handle().spawn(async move {
            let response = client.execute(request).await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        });

        Box::new(SpawnedFetch {
            handle,
            cancelled: false,
            _runtime: self.runtime.clone(),
        })
    }
}

/// A fetch running as a tokio task.
#[derive(Debug)]
pub struct SpawnedFetch {
    handle: JoinHandle<Result<RawResponse, TransportError>>,
    cancelled: bool,
    // an owned runtime shuts its tasks down when dropped
    _runtime: RuntimeHandle,
}

impl Future for SpawnedFetch {
    type Output = Result<RawResponse, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(
                TransportError::with_source(TransportErrorKind::Interrupted, e),
            )),
            Poll::Ready(Err(e)) => Poll::Ready(Err(TransportError::with_source(
                TransportErrorKind::Panicked,
                e,
            ))),
        }
    }
}

impl PendingFetch for SpawnedFetch {
    fn is_done(&self) -> bool {
        self.handle.is_finished()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn cancel(&mut self) {
        self.handle.abort();
        self.cancelled = true;
    }
}
