use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use thiserror::Error;

/// Result type for `twasync`, using [`Error`].
pub type Result<T> = ::std::result::Result<T, Error>;

/// Enum for `twasync` errors.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The underlying fetch failed, was interrupted or never completed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response was read after [`disconnect`] cancelled its fetch. This is a misuse of the
    /// response, not a transient condition.
    ///
    /// [`disconnect`]: crate::response::DeferredResponse::disconnect
    #[error("response already disconnected")]
    Disconnected,

    /// The response body doesn't match the shape of the expected model.
    #[error("couldn't deserialize {model}: {cause}")]
    Deserialization {
        /// Name of the model that was being built.
        model: &'static str,
        #[source]
        cause: Arc<serde_json::Error>,
    },

    /// The API answered with a non-success status code. The message is the reason given by the
    /// API, if available.
    #[error("HTTP error {code}{}", http_reason(*.code, .message))]
    Http { code: u16, message: Option<String> },

    /// The client couldn't be created. Contains a description of the error.
    #[error("couldn't create client: {0}")]
    CannotCreateClient(String),

    /// The configuration is invalid. Contains a description of the error.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The endpoint requires authorization but the client has none.
    #[error("authorization is required for this endpoint")]
    NotAuthorized,
}

impl Error {
    pub(crate) fn deserialization<T>(cause: serde_json::Error) -> Self {
        Error::Deserialization {
            model: std::any::type_name::<T>(),
            cause: Arc::new(cause),
        }
    }

    /// Returns true if the fetch itself failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns true if the response was read after being disconnected.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Error::Disconnected)
    }

    /// Returns true if the response body couldn't be turned into a model.
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Error::Deserialization { .. })
    }

    /// Returns the HTTP status code if this is an [`Error::Http`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn http_reason(code: u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        // Give em a generic reason
        None => match code {
            304 => String::from(" Not Modified: There was no new data to return"),
            400 => String::from(" Bad Request: The request was invalid or exceeded the rate limit"),
            401 => String::from(" Unauthorized: Authentication credentials were missing or incorrect"),
            403 => String::from(" Forbidden: The request is understood, but it has been refused"),
            404 => String::from(" Not Found: The URI requested is invalid or the resource doesn't exist"),
            406 => String::from(" Not Acceptable: An invalid format was specified in the request"),
            420 => String::from(" Enhance Your Calm: The search rate limit was exceeded"),
            500 => String::from(" Internal Server Error: Something is broken on the server"),
            502 => String::from(" Bad Gateway: The API is down or being upgraded"),
            503 => String::from(" Service Unavailable: The servers are up, but overloaded with requests"),
            _ => String::new(),
        },
    }
}

/// Error bodies returned by the API, either `{"error": "..."}` or
/// `{"errors": [{"code": 34, "message": "..."}]}`.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Single { error: String },
    Many { errors: Vec<ApiErrorItem> },
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorItem {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        match self {
            ApiErrorBody::Single { error } => Some(error),
            ApiErrorBody::Many { errors } if errors.is_empty() => None,
            ApiErrorBody::Many { errors } => Some(
                errors
                    .iter()
                    .map(|e| match e.code {
                        Some(code) => format!("{} (code {})", e.message, code),
                        None => e.message.clone(),
                    })
                    .join("; "),
            ),
        }
    }
}

/// What went wrong while waiting on a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request couldn't be sent or its body couldn't be read.
    Request,
    /// The fetch was aborted while it was being waited on.
    Interrupted,
    /// The task running the fetch panicked.
    Panicked,
}

/// A failed fetch. Keeps the original cause, available through [`StdError::source`].
#[derive(Debug, Clone)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        TransportError {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(kind: TransportErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        TransportError {
            kind,
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransportErrorKind::Request => write!(f, "request failed: {}", self.message),
            TransportErrorKind::Interrupted => write!(f, "fetch interrupted: {}", self.message),
            TransportErrorKind::Panicked => write!(f, "fetch panicked: {}", self.message),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::with_source(TransportErrorKind::Request, e)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Error {
        Error::CannotCreateClient(format!("Invalid header value: {}", e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::Config(format!("invalid URL: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_uses_api_message() {
        let e = Error::Http {
            code: 404,
            message: Some(String::from("Sorry, that page does not exist")),
        };

        assert_eq!(e.to_string(), "HTTP error 404: Sorry, that page does not exist");
        assert_eq!(e.status_code(), Some(404));
    }

    #[test]
    fn http_error_falls_back_to_generic_reason() {
        let e = Error::Http {
            code: 401,
            message: None,
        };

        assert!(e.to_string().starts_with("HTTP error 401 Unauthorized"));
    }

    #[test]
    fn transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let e = Error::from(TransportError::with_source(TransportErrorKind::Request, io));

        assert!(e.is_transport());
        assert!(!e.is_disconnected());

        let transport = e.source().unwrap();
        let io = transport.source().unwrap();
        assert_eq!(io.to_string(), "reset by peer");
    }

    #[test]
    fn api_error_bodies() {
        let single: ApiErrorBody =
            serde_json::from_str(r#"{"error":"Not found","request":"/1/statuses/show/1.json"}"#)
                .unwrap();
        assert_eq!(single.into_message().as_deref(), Some("Not found"));

        let many: ApiErrorBody = serde_json::from_str(
            r#"{"errors":[{"code":34,"message":"Sorry"},{"message":"Again"}]}"#,
        )
        .unwrap();
        assert_eq!(
            many.into_message().as_deref(),
            Some("Sorry (code 34); Again")
        );
    }
}
