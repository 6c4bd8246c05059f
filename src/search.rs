use super::{
    client::{parse_json, resolve_owned, Client},
    error::Result,
    future::FutureResult,
    utils::rfc2822_date,
};

use chrono::{DateTime, NaiveDate, Utc};

use either::Either;

use futures::stream::unfold;
use futures::{Stream, StreamExt};

use serde::{Deserialize, Serialize};

use std::fmt;

use tracing::debug;

/// Which kind of results a [`Query`] prefers.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Both popular and real time results.
    Mixed,
    /// Only the most recent results.
    Recent,
    /// Only the most popular results.
    Popular,
}

/// Unit of a [`GeoCode`] radius.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Unit {
    Miles,
    Kilometers,
}

/// Restricts results to users located within a radius around a point.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct GeoCode {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub unit: Unit,
}

impl fmt::Display for GeoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            Unit::Miles => "mi",
            Unit::Kilometers => "km",
        };

        write!(f, "{},{},{}{}", self.latitude, self.longitude, self.radius, unit)
    }
}

/// A search query returning [`Tweet`]s.
///
/// ```
/// # use twasync::search::{Query, ResultType};
/// let query = Query::new("#rust")
///     .lang("en")
///     .per_page(50)
///     .page(2)
///     .since_id(1)
///     .result_type(ResultType::Recent);
/// ```
#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Query {
    q: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,

    #[serde(rename = "rpp", skip_serializing_if = "Option::is_none")]
    per_page: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    since_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    geocode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    result_type: Option<ResultType>,
}

impl Query {
    pub fn new<S: Into<String>>(query: S) -> Self {
        Query {
            q: query.into(),
            lang: None,
            locale: None,
            per_page: None,
            page: None,
            since_id: None,
            max_id: None,
            geocode: None,
            until: None,
            result_type: None,
        }
    }

    /// Restrict results to a language, given as an ISO 639-1 code.
    pub fn lang<T: Into<Option<S>>, S: Into<String>>(mut self, lang: T) -> Self {
        self.lang = lang.into().map(Into::into);
        self
    }

    /// Language of the query itself. Only `ja` is effective.
    pub fn locale<T: Into<Option<S>>, S: Into<String>>(mut self, locale: T) -> Self {
        self.locale = locale.into().map(Into::into);
        self
    }

    /// Number of tweets per page, up to 100.
    pub fn per_page<T: Into<Option<u16>>>(mut self, per_page: T) -> Self {
        self.per_page = per_page.into();
        self
    }

    /// Page to return, starting at 1.
    pub fn page<T: Into<Option<u32>>>(mut self, page: T) -> Self {
        self.page = page.into();
        self
    }

    /// Only return tweets with an id greater than `since_id`.
    pub fn since_id<T: Into<Option<u64>>>(mut self, since_id: T) -> Self {
        self.since_id = since_id.into();
        self
    }

    /// Only return tweets with an id up to `max_id`.
    pub fn max_id<T: Into<Option<u64>>>(mut self, max_id: T) -> Self {
        self.max_id = max_id.into();
        self
    }

    pub fn geocode<T: Into<Option<GeoCode>>>(mut self, geocode: T) -> Self {
        self.geocode = geocode.into().map(|g| g.to_string());
        self
    }

    /// Only return tweets posted before the given date.
    pub fn until<T: Into<Option<NaiveDate>>>(mut self, until: T) -> Self {
        self.until = until.into();
        self
    }

    pub fn result_type<T: Into<Option<ResultType>>>(mut self, result_type: T) -> Self {
        self.result_type = result_type.into();
        self
    }

    pub fn get_query(&self) -> &str {
        &self.q
    }
}

/// A tweet, as returned by the search API.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Tweet {
    pub id: u64,
    pub text: String,
    pub from_user: String,
    pub from_user_id: u64,
    #[serde(default)]
    pub to_user: Option<String>,
    #[serde(default)]
    pub to_user_id: Option<u64>,
    #[serde(default)]
    pub iso_language_code: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(deserialize_with = "rfc2822_date")]
    pub created_at: DateTime<Utc>,
}

/// A page of search results.
#[derive(Debug, PartialEq, Deserialize, Clone)]
#[non_exhaustive]
pub struct QueryResult {
    #[serde(rename = "results")]
    pub tweets: Vec<Tweet>,
    #[serde(default)]
    pub since_id: u64,
    #[serde(default)]
    pub max_id: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub completed_in: f64,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

impl QueryResult {
    /// A result with no tweets, for a query that matched nothing.
    pub fn empty(query: &Query) -> Self {
        QueryResult {
            tweets: Vec::new(),
            since_id: query.since_id.unwrap_or(0),
            max_id: 0,
            page: query.page.unwrap_or(1),
            results_per_page: query.per_page.map_or(0, u32::from),
            completed_in: 0.0,
            query: query.q.clone(),
            refresh_url: None,
            next_page: None,
            warning: None,
        }
    }

    /// Whether there are more results after this page.
    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }
}

impl Client {
    /// Returns the tweets matching a query. No authorization is needed.
    ///
    /// The search API answers with a 404 when nothing matches: this is turned into an empty
    /// result.
    pub fn search(&self, query: Query) -> Result<FutureResult<QueryResult>> {
        let response = self.get(self.search_endpoint(&["search.json"])?, &query)?;
        let empty = QueryResult::empty(&query);

        Ok(FutureResult::with_response(response, move |res| {
            match parse_json::<QueryResult>(res) {
                Err(e) if e.status_code() == Some(404) => {
                    debug!(query = %empty.query, "no search results");
                    Ok(empty.clone())
                }
                other => other,
            }
        }))
    }

    /// Returns a Stream over all the [`Tweet`]s matching a query, one page after the other.
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::search::Query;
    /// use futures::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> twasync::error::Result<()> {
    /// let client = Client::new("MyProject/1.0")?;
    ///
    /// let tweets = client.search_stream(Query::new("#rust").per_page(100));
    /// futures::pin_mut!(tweets);
    ///
    /// while let Some(tweet) = tweets.next().await {
    ///     let tweet = tweet?;
    ///     println!("@{}: {}", tweet.from_user, tweet.text);
    /// }
    /// # Ok(()) }
    /// ```
    pub fn search_stream(&self, query: Query) -> impl Stream<Item = Result<Tweet>> + '_ + Send {
        unfold(Some(query), move |query| self.search_page(query))
            .map(futures::stream::iter)
            .flatten()
    }

    async fn search_page(
        &self,
        query: Option<Query>,
    ) -> Option<(impl Iterator<Item = Result<Tweet>>, Option<Query>)> {
        // `None` after an error or the last page
        let mut query = query?;

        let result = match resolve_owned(self.search(query.clone())).await {
            Err(e) => return Some((Either::Left(std::iter::once(Err(e))), None)),
            Ok(r) if r.tweets.is_empty() => return None,
            Ok(r) => r,
        };

        let next = if result.has_next_page() {
            query.page = Some(query.page.unwrap_or(1) + 1);
            Some(query)
        } else {
            None
        };

        Some((Either::Right(result.tweets.into_iter().map(Ok)), next))
    }
}
