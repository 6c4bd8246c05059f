//! Client for the [Twitter](https://dev.twitter.com/doc) REST and search APIs, where responses
//! are fetched in the background and only waited on when they're read.
//!
//! ## Usage
//!
//! First, create a [`Client`]. You have to provide a descriptive User-Agent for your project.
//!
//! ```no_run
//! # use twasync::client::Client;
//! # fn main() -> Result<(), twasync::error::Error> {
//! let client = Client::new("MyProject/1.0")?;
//! # Ok(()) }
//! ```
//!
//! Endpoint methods start their request and return right away, with a [`FutureResult`]. Its
//! [`get`] method waits for the response the first time it's called, and hands out the parsed
//! model from then on:
//!
//! ```no_run
//! # use twasync::client::Client;
//! # use twasync::status::StatusModel;
//! # fn main() -> Result<(), twasync::error::Error> {
//! # let client = Client::new("MyProject/1.0")?;
//! // both requests are in flight at the same time
//! let mut first = client.show_status(20)?;
//! let mut second = client.show_status(21)?;
//!
//! println!("{}", first.get()?.text()?);
//! println!("{}", second.get()?.text()?);
//! # Ok(()) }
//! ```
//!
//! From async code, use [`get_async`] instead, which doesn't block the thread.
//!
//! ## Lazy models
//!
//! With [`ModelStrategy::Lazy`], the `*_handle` methods return models that only wait for and
//! parse their response when one of their methods is first called. Every method of a model
//! capability trait ([`StatusModel`], [`UserModel`]) returns a [`Result`] for that reason.
//!
//! ```no_run
//! # use twasync::client::Client;
//! # use twasync::config::Config;
//! # use twasync::factory::ModelStrategy;
//! # use twasync::status::StatusModel;
//! # fn main() -> Result<(), twasync::error::Error> {
//! let client = Client::with_config(Config::new().model_strategy(ModelStrategy::Lazy))?;
//!
//! let status = client.show_status_handle(20)?;
//! assert_eq!(status.id()?, 20);
//! # Ok(()) }
//! ```
//!
//! ## Logging
//!
//! `twasync` reports what it does through [`tracing`](https://docs.rs/tracing). It never installs
//! a subscriber.
//!
//! [`Client`]: client::Client
//! [`FutureResult`]: future::FutureResult
//! [`get`]: future::FutureResult::get
//! [`get_async`]: future::FutureResult::get_async
//! [`ModelStrategy::Lazy`]: factory::ModelStrategy::Lazy
//! [`StatusModel`]: status::StatusModel
//! [`UserModel`]: user::UserModel
//! [`Result`]: error::Result

mod utils;

/// Client related structures.
pub mod client;

/// Client configuration.
pub mod config;

/// Error management.
pub mod error;

/// Model construction strategies.
pub mod factory;

/// Favorite endpoints.
pub mod favorite;

/// Results computed on first access.
pub mod future;

/// Models built on first use.
pub mod lazy;

/// List endpoints.
pub mod list;

/// Responses materialized on first access.
pub mod response;

/// Lists of models along with rate limit information.
pub mod response_list;

/// Search API.
pub mod search;

/// Status management.
pub mod status;

/// Fetch plumbing.
pub mod transport;

/// User management.
pub mod user;
