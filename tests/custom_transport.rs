use bytes::Bytes;

use futures::task::{Context, Poll};

use reqwest::header::HeaderMap;

use std::future::Future;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use twasync::client::Client;
use twasync::config::Config;
use twasync::error::{Error, TransportError};
use twasync::factory::ModelStrategy;
use twasync::status::{LazyStatus, Status, StatusModel};
use twasync::transport::{PendingFetch, RawResponse, Transport};

const STATUS: &str = r#"{
    "id": 42,
    "text": "hello @twasync",
    "created_at": "Wed Aug 27 13:08:45 +0000 2008"
}"#;

/// Answers every request with the same body, without any network.
#[derive(Default)]
struct CannedTransport {
    started: AtomicUsize,
    polled: Arc<AtomicUsize>,
    paths: Mutex<Vec<String>>,
}

struct CannedFetch {
    body: Option<&'static str>,
    polled: Arc<AtomicUsize>,
    cancelled: bool,
}

impl Future for CannedFetch {
    type Output = Result<RawResponse, TransportError>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.polled.fetch_add(1, Ordering::SeqCst);

        match self.body.take() {
            Some(body) => Poll::Ready(Ok(RawResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            })),
            None => Poll::Pending,
        }
    }
}

impl PendingFetch for CannedFetch {
    fn is_done(&self) -> bool {
        self.body.is_none()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

impl Transport for CannedTransport {
    fn start_fetch(&self, request: reqwest::Request) -> Box<dyn PendingFetch> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.paths
            .lock()
            .unwrap()
            .push(request.url().path().to_string());

        Box::new(CannedFetch {
            body: Some(STATUS),
            polled: self.polled.clone(),
            cancelled: false,
        })
    }
}

fn client(strategy: ModelStrategy) -> (Client, Arc<CannedTransport>) {
    let transport = Arc::new(CannedTransport::default());

    let client = Client::with_transport(
        Config::new()
            .rest_base_url("http://twasync.invalid/1/")
            .model_strategy(strategy),
        transport.clone(),
    )
    .unwrap();

    (client, transport)
}

#[test]
fn status_code_is_read_once() {
    let (client, transport) = client(ModelStrategy::Eager);

    let mut status = client.show_status(42).unwrap();
    assert_eq!(transport.started.load(Ordering::SeqCst), 1);
    assert_eq!(transport.polled.load(Ordering::SeqCst), 0);

    let response = status.response().unwrap().clone();
    for _ in 0..3 {
        assert_eq!(response.status_code().unwrap(), 200);
    }
    assert_eq!(status.get().unwrap().id().unwrap(), 42);

    assert_eq!(transport.polled.load(Ordering::SeqCst), 1);
    assert_eq!(
        transport.paths.lock().unwrap().as_slice(),
        ["/1/statuses/show/42.json"]
    );
}

#[test]
fn cancelled_result_is_an_error() {
    let (client, transport) = client(ModelStrategy::Eager);

    let mut status = client.show_status(42).unwrap();
    status.cancel();

    assert!(matches!(
        status.response().unwrap().status_code(),
        Err(Error::Disconnected)
    ));
    assert!(status.get().unwrap_err().is_disconnected());
    assert_eq!(transport.polled.load(Ordering::SeqCst), 0);
}

#[test]
fn lazy_handles_defer_everything() {
    let (client, transport) = client(ModelStrategy::Lazy);

    let first = client.show_status_handle(42).unwrap();
    let second = client.show_status_handle(42).unwrap();
    assert_eq!(transport.started.load(Ordering::SeqCst), 2);
    assert_eq!(transport.polled.load(Ordering::SeqCst), 0);

    assert!(first.mentions("twasync").unwrap());
    assert_eq!(first.text().unwrap(), second.text().unwrap());
    assert_eq!(transport.polled.load(Ordering::SeqCst), 2);

    let first: LazyStatus = first.right().unwrap();
    let second: LazyStatus = second.right().unwrap();
    let first: Status = first.into_inner().unwrap();
    let second: Status = second.into_inner().unwrap();
    assert_eq!(first, second);
}
