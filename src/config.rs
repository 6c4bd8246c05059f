use super::{
    error::{Error, Result},
    factory::ModelStrategy,
};

use serde::{Deserialize, Serialize};

use std::time::Duration;

use url::Url;

pub const DEFAULT_REST_BASE_URL: &str = "https://api.twitter.com/1/";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://search.twitter.com/";
pub const DEFAULT_USER_AGENT: &str = concat!("twasync/", env!("CARGO_PKG_VERSION"));

/// Client configuration.
///
/// Can be deserialized (every field is optional), read from the environment with
/// [`Config::from_env`], or built with the setters:
///
/// ```
/// # use twasync::config::Config;
/// # use twasync::factory::ModelStrategy;
/// let config = Config::new()
///     .rest_base_url("https://api.twitter.com/1/")
///     .user_agent("MyProject/1.0")
///     .include_entities(false)
///     .model_strategy(ModelStrategy::Lazy)
///     .timeout_secs(30);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    rest_base_url: String,
    search_base_url: String,
    user_agent: String,
    include_entities: bool,
    include_rts: bool,
    model_strategy: ModelStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rest_base_url: String::from(DEFAULT_REST_BASE_URL),
            search_base_url: String::from(DEFAULT_SEARCH_BASE_URL),
            user_agent: String::from(DEFAULT_USER_AGENT),
            include_entities: true,
            include_rts: true,
            model_strategy: ModelStrategy::default(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Create a new instance of `Config` with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the defaults and override them with the `TWASYNC_*` environment variables
    /// that are set: `TWASYNC_REST_BASE_URL`, `TWASYNC_SEARCH_BASE_URL`, `TWASYNC_USER_AGENT`,
    /// `TWASYNC_INCLUDE_ENTITIES`, `TWASYNC_INCLUDE_RTS`, `TWASYNC_MODEL_STRATEGY` (`eager` or
    /// `lazy`) and `TWASYNC_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("TWASYNC_REST_BASE_URL") {
            config.rest_base_url = v;
        }

        if let Some(v) = lookup("TWASYNC_SEARCH_BASE_URL") {
            config.search_base_url = v;
        }

        if let Some(v) = lookup("TWASYNC_USER_AGENT") {
            config.user_agent = v;
        }

        if let Some(v) = lookup("TWASYNC_INCLUDE_ENTITIES") {
            config.include_entities = parse_bool("TWASYNC_INCLUDE_ENTITIES", &v)?;
        }

        if let Some(v) = lookup("TWASYNC_INCLUDE_RTS") {
            config.include_rts = parse_bool("TWASYNC_INCLUDE_RTS", &v)?;
        }

        if let Some(v) = lookup("TWASYNC_MODEL_STRATEGY") {
            config.model_strategy = v.parse()?;
        }

        if let Some(v) = lookup("TWASYNC_TIMEOUT_SECS") {
            config.timeout_secs = Some(v.parse().map_err(|_| {
                Error::Config(format!("TWASYNC_TIMEOUT_SECS is not a number: {:?}", v))
            })?);
        }

        config.validate()?;

        Ok(config)
    }

    /// Set the base URL of the REST API. Must end with a `/`.
    pub fn rest_base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// Set the base URL of the search API. Must end with a `/`.
    pub fn search_base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.search_base_url = url.into();
        self
    }

    /// Set the value of the User-Agent header. Mustn't be empty.
    pub fn user_agent<T: Into<String>>(mut self, user_agent: T) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Whether to ask for entities (mentions, URLs, hashtags) along with statuses.
    pub fn include_entities(mut self, include_entities: bool) -> Self {
        self.include_entities = include_entities;
        self
    }

    /// Whether timelines should contain native retweets.
    pub fn include_rts(mut self, include_rts: bool) -> Self {
        self.include_rts = include_rts;
        self
    }

    /// How models handed out by `*_handle` methods are built.
    pub fn model_strategy(mut self, strategy: ModelStrategy) -> Self {
        self.model_strategy = strategy;
        self
    }

    /// Set a timeout for whole requests. There is none by default.
    pub fn timeout_secs<T: Into<Option<u64>>>(mut self, timeout: T) -> Self {
        self.timeout_secs = timeout.into();
        self
    }

    /// Checks that the base URLs are valid and that the User-Agent isn't empty.
    pub fn validate(&self) -> Result<()> {
        parse_base_url("rest_base_url", &self.rest_base_url)?;
        parse_base_url("search_base_url", &self.search_base_url)?;

        if self.user_agent.is_empty() {
            return Err(Error::Config(String::from("User Agent mustn't be empty")));
        }

        Ok(())
    }

    pub(crate) fn rest_url(&self) -> Result<Url> {
        parse_base_url("rest_base_url", &self.rest_base_url)
    }

    pub(crate) fn search_url(&self) -> Result<Url> {
        parse_base_url("search_base_url", &self.search_base_url)
    }

    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn is_include_entities(&self) -> bool {
        self.include_entities
    }

    pub fn is_include_rts(&self) -> bool {
        self.include_rts
    }

    pub fn get_model_strategy(&self) -> ModelStrategy {
        self.model_strategy
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_base_url(name: &str, url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::Config(format!("{}: {}", name, e)))?;

    if parsed.cannot_be_a_base() || !parsed.path().ends_with('/') {
        return Err(Error::Config(format!(
            "{} must be a base URL ending with '/': {}",
            name, url
        )));
    }

    Ok(parsed)
}

fn parse_bool(name: &str, v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} is not a boolean: {:?}", name, v))),
    }
}
