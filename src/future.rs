use super::{error::Result, response::DeferredResponse};

use derivative::Derivative;

use tracing::trace;

/// The result of an API call, produced on first access and cached afterwards.
///
/// Endpoint methods return a `FutureResult` as soon as the request has been started. The
/// response is only waited on and parsed when [`get`](Self::get) (or
/// [`get_async`](Self::get_async)) is called for the first time.
///
/// Only successful results are cached: if producing the result fails, the error is returned
/// and the next call to `get` tries again. Retrying over a response whose fetch failed or was
/// disconnected fails again with the same error, since the response keeps it.
///
/// ```no_run
/// # use twasync::client::Client;
/// # use twasync::status::StatusModel;
/// # fn main() -> twasync::error::Result<()> {
/// let client = Client::new("MyProject/1.0")?;
///
/// // the request is in flight...
/// let mut status = client.show_status(20)?;
///
/// // ...and this waits for it
/// assert_eq!(status.get()?.id()?, 20);
/// # Ok(()) }
/// ```
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FutureResult<T> {
    response: Option<DeferredResponse>,
    #[derivative(Debug = "ignore")]
    produce: Box<dyn FnMut() -> Result<T> + Send>,
    result: Option<T>,
}

impl<T> FutureResult<T> {
    /// Wraps an arbitrary production step.
    pub fn from_fn<F>(produce: F) -> Self
    where
        F: FnMut() -> Result<T> + Send + 'static,
    {
        FutureResult {
            response: None,
            produce: Box::new(produce),
            result: None,
        }
    }

    /// Wraps a production step reading `response`.
    pub fn with_response<F>(response: DeferredResponse, mut produce: F) -> Self
    where
        F: FnMut(&DeferredResponse) -> Result<T> + Send + 'static,
    {
        let source = response.clone();

        FutureResult {
            response: Some(response),
            produce: Box::new(move || produce(&source)),
            result: None,
        }
    }

    /// Returns the result, producing it first if this is the first successful call. May block
    /// while the response is being fetched.
    pub fn get(&mut self) -> Result<&T> {
        let value = match self.result.take() {
            Some(value) => value,
            None => {
                trace!(model = std::any::type_name::<T>(), "producing result");
                (self.produce)()?
            }
        };

        Ok(self.result.insert(value))
    }

    /// Like [`get`](Self::get), but waits for the response without blocking the thread.
    pub async fn get_async(&mut self) -> Result<&T> {
        if self.result.is_none() {
            if let Some(response) = &self.response {
                response.resolve().await?;
            }
        }

        self.get()
    }

    /// Consumes the `FutureResult`, returning the result. Produces it if needed.
    pub fn into_inner(mut self) -> Result<T> {
        match self.result.take() {
            Some(value) => Ok(value),
            None => (self.produce)(),
        }
    }

    /// Whether a result has been produced and cached.
    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }

    /// The response backing this result, if any. Useful to inspect the status code or headers.
    pub fn response(&self) -> Option<&DeferredResponse> {
        self.response.as_ref()
    }

    /// Disconnects the backing response. Does nothing if there's none or it already completed.
    pub fn cancel(&self) {
        if let Some(response) = &self.response {
            response.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError, TransportErrorKind};
    use crate::transport::stub::{json_response, StubFetch};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn counting<T: Send + 'static>(
        mut outcomes: Vec<Result<T>>,
    ) -> (FutureResult<T>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        outcomes.reverse();

        let future = FutureResult::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            outcomes.pop().unwrap_or(Err(Error::Disconnected))
        });

        (future, calls)
    }

    #[test]
    fn produces_at_most_once() {
        let (mut future, calls) = counting(vec![Ok(String::from("status"))]);

        assert!(!future.is_done());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        for _ in 0..5 {
            assert_eq!(future.get().unwrap(), "status");
        }

        assert!(future.is_done());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_retried_on_next_get() {
        let (mut future, calls) = counting(vec![
            Err(Error::Http {
                code: 502,
                message: None,
            }),
            Ok(7u64),
        ]);

        assert_eq!(future.get().unwrap_err().status_code(), Some(502));
        assert!(!future.is_done());

        assert_eq!(*future.get().unwrap(), 7);
        assert_eq!(*future.get().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retry_over_a_failed_fetch_fails_again() {
        let fetch = StubFetch::in_flight(Err(TransportError::new(
            TransportErrorKind::Request,
            "connection reset",
        )));
        let polls = fetch.poll_count();
        let response = DeferredResponse::new(Box::new(fetch));

        let mut future = FutureResult::with_response(response, |res| res.status_code());

        assert!(future.get().unwrap_err().is_transport());
        assert!(future.get().unwrap_err().is_transport());
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn production_reads_the_response() {
        #[derive(Debug, serde::Deserialize)]
        struct Model {
            id: u64,
        }

        let fetch = StubFetch::in_flight(Ok(json_response(200, r#"{"id":42}"#)));
        let polls = fetch.poll_count();
        let response = DeferredResponse::new(Box::new(fetch));

        let mut future = FutureResult::with_response(response, |res| res.json::<Model>());

        assert!(!future.response().unwrap().is_resolved());
        assert_eq!(future.get().unwrap().id, 42);
        assert_eq!(future.response().unwrap().status_code().unwrap(), 200);
        assert_eq!(future.into_inner().unwrap().id, 42);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_disconnects_the_response() {
        let response = DeferredResponse::new(Box::new(StubFetch::stalled()));
        let mut future = FutureResult::with_response(response, |res| res.status_code());

        future.cancel();

        assert!(future.get().unwrap_err().is_disconnected());
    }

    #[test]
    fn into_inner_produces_if_needed() {
        let (future, calls) = counting(vec![Ok(1u8)]);

        assert_eq!(future.into_inner().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_async_resolves_first() {
        let fetch = StubFetch::in_flight(Ok(json_response(200, "[1,2,3]")));
        let response = DeferredResponse::new(Box::new(fetch));

        let mut future = FutureResult::with_response(response, |res| res.json::<Vec<u8>>());

        assert_eq!(future.get_async().await.unwrap(), &vec![1, 2, 3]);
        assert!(future.response().unwrap().is_resolved());
    }
}
