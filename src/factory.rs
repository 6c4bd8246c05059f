use super::{
    error::{Error, Result},
    response::DeferredResponse,
    status::{LazyStatus, Status},
    user::{LazyUser, User},
};

use either::Either;

use serde::{Deserialize, Serialize};

use std::{fmt, str::FromStr};

use tracing::trace;

/// How models are built out of responses.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelStrategy {
    /// Wait for the response and parse it as soon as the model is requested.
    #[default]
    Eager,

    /// Hand out a placeholder, only waiting for and parsing the response on its first use.
    Lazy,
}

impl FromStr for ModelStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "lazy" => Ok(Self::Lazy),
            _ => Err(Error::Config(format!("unknown model strategy {:?}", s))),
        }
    }
}

impl fmt::Display for ModelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
        })
    }
}

/// A status, built according to the client's [`ModelStrategy`].
pub type StatusHandle = Either<Status, LazyStatus>;

/// A user, built according to the client's [`ModelStrategy`].
pub type UserHandle = Either<User, LazyUser>;

/// Builds models out of responses. Every [`Client`](crate::client::Client) owns one, configured
/// by [`Config::model_strategy`](crate::config::Config::model_strategy).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ModelFactory {
    strategy: ModelStrategy,
}

impl ModelFactory {
    pub fn new(strategy: ModelStrategy) -> Self {
        ModelFactory { strategy }
    }

    pub fn strategy(&self) -> ModelStrategy {
        self.strategy
    }

    /// With [`ModelStrategy::Eager`], blocks until the response is there and fails if it can't
    /// be parsed. With [`ModelStrategy::Lazy`], returns immediately.
    pub fn create_status(&self, response: DeferredResponse) -> Result<StatusHandle> {
        trace!(strategy = %self.strategy, "creating status");

        match self.strategy {
            ModelStrategy::Eager => Status::from_response(&response).map(Either::Left),
            ModelStrategy::Lazy => Ok(Either::Right(LazyStatus::new(
                response,
                Status::from_response,
            ))),
        }
    }

    /// Same as [`create_status`](Self::create_status), for users.
    pub fn create_user(&self, response: DeferredResponse) -> Result<UserHandle> {
        trace!(strategy = %self.strategy, "creating user");

        match self.strategy {
            ModelStrategy::Eager => User::from_response(&response).map(Either::Left),
            ModelStrategy::Lazy => Ok(Either::Right(LazyUser::new(response, User::from_response))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusModel;
    use crate::transport::stub::{json_response, StubFetch};
    use crate::user::UserModel;
    use std::sync::atomic::Ordering;

    const STATUS: &str = include_str!("mocked/status_20.json");
    const USER: &str = include_str!("mocked/user_twitter.json");

    #[test]
    fn parse_strategy() {
        assert_eq!("eager".parse::<ModelStrategy>().unwrap(), ModelStrategy::Eager);
        assert_eq!(" Lazy ".parse::<ModelStrategy>().unwrap(), ModelStrategy::Lazy);
        assert!(matches!(
            "reflective".parse::<ModelStrategy>(),
            Err(Error::Config(_))
        ));
        assert_eq!(ModelStrategy::default(), ModelStrategy::Eager);
        assert_eq!(ModelStrategy::Lazy.to_string(), "lazy");
    }

    #[test]
    fn eager_factory_parses_right_away() {
        let fetch = StubFetch::in_flight(Ok(json_response(200, STATUS)));
        let polls = fetch.poll_count();

        let status = ModelFactory::new(ModelStrategy::Eager)
            .create_status(DeferredResponse::new(Box::new(fetch)))
            .unwrap();

        assert!(status.is_left());
        assert_eq!(polls.load(Ordering::SeqCst), 1);
        assert_eq!(status.id().unwrap(), 20);
    }

    #[test]
    fn eager_factory_reports_parse_errors() {
        let response = DeferredResponse::ready(json_response(200, r#"{"id":"twenty"}"#));

        let err = ModelFactory::new(ModelStrategy::Eager)
            .create_status(response)
            .unwrap_err();

        assert!(err.is_deserialization());
    }

    #[test]
    fn lazy_factory_waits_for_first_use() {
        let fetch = StubFetch::in_flight(Ok(json_response(200, USER)));
        let polls = fetch.poll_count();

        let user = ModelFactory::new(ModelStrategy::Lazy)
            .create_user(DeferredResponse::new(Box::new(fetch)))
            .unwrap();

        assert!(user.is_right());
        assert_eq!(polls.load(Ordering::SeqCst), 0);

        assert_eq!(user.screen_name().unwrap(), "twitter");
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lazy_factory_defers_parse_errors() {
        let response = DeferredResponse::ready(json_response(200, "[]"));

        let status = ModelFactory::new(ModelStrategy::Lazy)
            .create_status(response)
            .unwrap();

        assert!(status.text().unwrap_err().is_deserialization());
    }
}
