use super::{
    config::Config,
    error::{ApiErrorBody, Error, Result, TransportError},
    factory::ModelFactory,
    future::FutureResult,
    response::DeferredResponse,
    transport::{HttpTransport, RuntimeHandle, Transport},
};

use derivative::Derivative;

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, RequestBuilder,
};

use serde::{de::DeserializeOwned, Serialize};

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use url::Url;

/// Query or form parameters of a request.
pub(crate) type Params = Vec<(&'static str, String)>;

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Authorization {
    /// No credentials. Endpoints needing a user context fail with [`Error::NotAuthorized`].
    #[default]
    None,
    /// A pre-issued bearer token.
    Bearer(String),
    /// Username and password, sent with HTTP basic authentication.
    Basic { username: String, password: String },
}

impl Authorization {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Authorization::None)
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Authorization::None => builder,
            Authorization::Bearer(token) => builder.bearer_auth(token),
            Authorization::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorization::None => f.write_str("None"),
            Authorization::Bearer(token) => f.debug_tuple("Bearer").field(&mask(token)).finish(),
            Authorization::Basic { username, password } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &mask(password))
                .finish(),
        }
    }
}

/// Client struct.
///
/// Endpoint methods start their request right away and return a [`FutureResult`] without
/// waiting for the response.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Client {
    client: reqwest::Client,
    #[derivative(Debug = "ignore")]
    transport: Arc<dyn Transport>,
    config: Config,
    authorization: Authorization,
    factory: ModelFactory,
}

impl Client {
    /// Create a new client with the default configuration and the specified value for the
    /// User-Agent header, which mustn't be empty.
    ///
    /// Requests run on the tokio runtime the client is created in. Outside of a runtime, the
    /// client starts its own.
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::new().user_agent(user_agent))
    }

    /// Create a new client from a configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let client = build_http_client(&config)?;

        let runtime = RuntimeHandle::current_or_owned()
            .map_err(|e| Error::CannotCreateClient(format!("couldn't start runtime: {}", e)))?;

        let transport = Arc::new(HttpTransport::new(client.clone(), runtime));

        Self::from_parts(config, client, transport)
    }

    /// Create a new client sending its requests through `transport`.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let client = build_http_client(&config)?;

        Self::from_parts(config, client, transport)
    }

    fn from_parts(
        config: Config,
        client: reqwest::Client,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Client {
            client,
            transport,
            factory: ModelFactory::new(config.get_model_strategy()),
            config,
            authorization: Authorization::None,
        })
    }

    /// Authenticate with a username and a password.
    pub fn login(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.authorization = Authorization::Basic {
            username: username.into(),
            password: password.into(),
        };
    }

    /// Authenticate with a bearer token.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.authorization = Authorization::Bearer(token.into());
    }

    pub fn set_authorization(&mut self, authorization: Authorization) {
        self.authorization = authorization;
    }

    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The factory building the models returned by `*_handle` methods.
    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    pub(crate) fn ensure_authorization_enabled(&self) -> Result<()> {
        if self.authorization.is_enabled() {
            Ok(())
        } else {
            Err(Error::NotAuthorized)
        }
    }

    /// URL of a REST endpoint, made of path segments below the REST base URL.
    pub(crate) fn rest_endpoint(&self, segments: &[&str]) -> Result<Url> {
        join_segments(self.config.rest_url()?, segments)
    }

    /// URL of a search endpoint, made of path segments below the search base URL.
    pub(crate) fn search_endpoint(&self, segments: &[&str]) -> Result<Url> {
        join_segments(self.config.search_url()?, segments)
    }

    pub(crate) fn entities_param(&self) -> (&'static str, String) {
        ("include_entities", self.config.is_include_entities().to_string())
    }

    pub(crate) fn rts_param(&self) -> (&'static str, String) {
        ("include_rts", self.config.is_include_rts().to_string())
    }

    /// Starts a GET request.
    pub(crate) fn get<Q: Serialize + ?Sized>(&self, url: Url, query: &Q) -> Result<DeferredResponse> {
        self.start(self.client.request(Method::GET, url).query(query))
    }

    /// Starts a POST request, with an optional url-encoded form body.
    pub(crate) fn post<Q: Serialize + ?Sized>(
        &self,
        url: Url,
        query: &Q,
        form: Option<&Params>,
    ) -> Result<DeferredResponse> {
        let builder = self.client.request(Method::POST, url).query(query);

        self.start(match form {
            Some(form) => builder.form(form),
            None => builder,
        })
    }

    fn start(&self, builder: RequestBuilder) -> Result<DeferredResponse> {
        let request = self
            .authorization
            .apply(builder)
            .build()
            .map_err(TransportError::from)?;

        debug!(method = %request.method(), url = %request.url(), "starting fetch");

        Ok(DeferredResponse::new(self.transport.start_fetch(request)))
    }

    /// Starts a GET request and returns a result parsing its JSON body.
    pub(crate) fn get_json<T, Q>(&self, url: Url, query: &Q) -> Result<FutureResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
        Q: Serialize + ?Sized,
    {
        let response = self.get(url, query)?;

        Ok(FutureResult::with_response(response, parse_json::<T>))
    }

    /// Starts a POST request and returns a result parsing its JSON body.
    pub(crate) fn post_json<T, Q>(
        &self,
        url: Url,
        query: &Q,
        form: Option<&Params>,
    ) -> Result<FutureResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
        Q: Serialize + ?Sized,
    {
        let response = self.post(url, query, form)?;

        Ok(FutureResult::with_response(response, parse_json::<T>))
    }
}

fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    config.validate()?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(config.get_user_agent())?,
    );

    let mut builder = reqwest::Client::builder().default_headers(headers);

    if let Some(timeout) = config.get_timeout() {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| Error::CannotCreateClient(format!("{:?}", e)))
}

fn join_segments(mut url: Url, segments: &[&str]) -> Result<Url> {
    let base = url.to_string();

    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Parses the JSON body of a successful response. Non-success status codes become
/// [`Error::Http`], with the reason given by the API if the body has one.
pub fn parse_json<T: DeserializeOwned>(response: &DeferredResponse) -> Result<T> {
    let code = response.status_code()?;

    if !(200..300).contains(&code) {
        let message = response
            .json::<ApiErrorBody>()
            .ok()
            .and_then(ApiErrorBody::into_message);

        return Err(Error::Http { code, message });
    }

    response.json()
}

/// Waits for a result without blocking the thread, and takes it.
pub(crate) async fn resolve_owned<T>(future: Result<FutureResult<T>>) -> Result<T> {
    let mut future = future?;
    future.get_async().await?;
    future.into_inner()
}

#[cfg(test)]
pub(crate) fn mocked_client() -> Client {
    Client::with_config(
        Config::new()
            .rest_base_url(format!("{}/1/", mockito::server_url()))
            .search_base_url(format!("{}/", mockito::server_url()))
            .user_agent("twasync/unit_test"),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::json_response;

    #[test]
    fn client_new() {
        Client::new("twasync/unit_test").unwrap();
    }

    #[test]
    #[should_panic]
    fn client_new_requires_non_empty_user_agent() {
        Client::new("").unwrap();
    }

    #[test]
    fn authorization_is_masked() {
        let mut client = Client::new("twasync/unit_test").unwrap();
        assert!(matches!(
            client.ensure_authorization_enabled(),
            Err(Error::NotAuthorized)
        ));

        client.login("twasync", "hunter2");
        assert!(client.ensure_authorization_enabled().is_ok());

        let debug = format!("{:?}", client.authorization());
        assert!(debug.contains("twasync"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("*******"));
    }

    #[test]
    fn endpoints_are_joined_below_the_base() {
        let client = Client::with_config(
            Config::new()
                .rest_base_url("http://localhost:1234/1/")
                .search_base_url("http://localhost:1234/"),
        )
        .unwrap();

        assert_eq!(
            client
                .rest_endpoint(&["statuses", "show", "42.json"])
                .unwrap()
                .as_str(),
            "http://localhost:1234/1/statuses/show/42.json"
        );
        assert_eq!(
            client.rest_endpoint(&["a b", "1.json"]).unwrap().as_str(),
            "http://localhost:1234/1/a%20b/1.json"
        );
        assert_eq!(
            client.search_endpoint(&["search.json"]).unwrap().as_str(),
            "http://localhost:1234/search.json"
        );
    }

    #[test]
    fn opaque_base_url_is_rejected() {
        let base = Url::parse("mailto:jack@example.com").unwrap();

        match join_segments(base, &["statuses", "show", "42.json"]) {
            Err(Error::Config(message)) => {
                assert_eq!(message, "mailto:jack@example.com cannot be a base URL")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn parse_json_checks_the_status() {
        #[derive(Debug, serde::Deserialize)]
        struct Model {
            id: u64,
        }

        let ok = DeferredResponse::ready(json_response(200, r#"{"id":42}"#));
        assert_eq!(parse_json::<Model>(&ok).unwrap().id, 42);

        let not_found = DeferredResponse::ready(json_response(
            404,
            r#"{"error":"Not found","request":"/1/statuses/show/1.json"}"#,
        ));
        match parse_json::<Model>(&not_found) {
            Err(Error::Http { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message.as_deref(), Some("Not found"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let garbage = DeferredResponse::ready(json_response(500, "<html>oops</html>"));
        assert_eq!(parse_json::<Model>(&garbage).unwrap_err().status_code(), Some(500));
    }
}
