use super::{
    client::{parse_json, Client},
    error::{Error, Result},
    factory::UserHandle,
    future::FutureResult,
    lazy::lazy_model,
    response::DeferredResponse,
    response_list::ResponseList,
    utils::{nullable_bool, twitter_date},
};

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use serde_with::{formats::CommaSeparator, serde_as, StringWithSeparator};

use std::fmt;

/// Read access to a user's properties.
pub trait UserModel {
    fn id(&self) -> Result<u64>;
    fn name(&self) -> Result<&str>;
    fn screen_name(&self) -> Result<&str>;
    fn description(&self) -> Result<Option<&str>>;
    fn location(&self) -> Result<Option<&str>>;
    fn followers_count(&self) -> Result<u64>;
    fn friends_count(&self) -> Result<u64>;
    fn statuses_count(&self) -> Result<u64>;
    fn created_at(&self) -> Result<DateTime<Utc>>;
    fn is_protected(&self) -> Result<bool>;
    fn is_verified(&self) -> Result<bool>;
}

/// A Twitter account.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct User {
    pub id: u64,
    pub name: String,
    pub screen_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable_bool")]
    pub protected: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(deserialize_with = "twitter_date")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_bool")]
    pub verified: bool,
    #[serde(default)]
    pub lang: Option<String>,
}

impl User {
    pub fn from_response(response: &DeferredResponse) -> Result<Self> {
        parse_json(response)
    }
}

impl UserModel for User {
    fn id(&self) -> Result<u64> {
        Ok(self.id)
    }

    fn name(&self) -> Result<&str> {
        Ok(&self.name)
    }

    fn screen_name(&self) -> Result<&str> {
        Ok(&self.screen_name)
    }

    fn description(&self) -> Result<Option<&str>> {
        Ok(self.description.as_deref())
    }

    fn location(&self) -> Result<Option<&str>> {
        Ok(self.location.as_deref())
    }

    fn followers_count(&self) -> Result<u64> {
        Ok(self.followers_count)
    }

    fn friends_count(&self) -> Result<u64> {
        Ok(self.friends_count)
    }

    fn statuses_count(&self) -> Result<u64> {
        Ok(self.statuses_count)
    }

    fn created_at(&self) -> Result<DateTime<Utc>> {
        Ok(self.created_at)
    }

    fn is_protected(&self) -> Result<bool> {
        Ok(self.protected)
    }

    fn is_verified(&self) -> Result<bool> {
        Ok(self.verified)
    }
}

lazy_model! {
    /// A [`User`] that is only parsed on first use. Any method may block while the response is
    /// fetched.
    pub struct LazyUser(User): UserModel {
        fn id(&self) -> u64;
        fn name(&self) -> &str;
        fn screen_name(&self) -> &str;
        fn description(&self) -> Option<&str>;
        fn location(&self) -> Option<&str>;
        fn followers_count(&self) -> u64;
        fn friends_count(&self) -> u64;
        fn statuses_count(&self) -> u64;
        fn created_at(&self) -> DateTime<Utc>;
        fn is_protected(&self) -> bool;
        fn is_verified(&self) -> bool;
    }
}

/// Designates a user, either by numeric id or by screen name.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum UserRef {
    Id(u64),
    ScreenName(String),
}

impl UserRef {
    /// The query parameter designating this user.
    pub(crate) fn to_param(&self) -> (&'static str, String) {
        match self {
            UserRef::Id(id) => ("user_id", id.to_string()),
            UserRef::ScreenName(name) => ("screen_name", name.clone()),
        }
    }
}

impl From<u64> for UserRef {
    fn from(id: u64) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(screen_name: &str) -> Self {
        UserRef::ScreenName(screen_name.to_owned())
    }
}

impl From<String> for UserRef {
    fn from(screen_name: String) -> Self {
        UserRef::ScreenName(screen_name)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "#{}", id),
            UserRef::ScreenName(name) => write!(f, "@{}", name),
        }
    }
}

type CommaSeparated<T> = StringWithSeparator<CommaSeparator, T>;

/// How many users [`Client::lookup_users`] accepts at once.
pub const LOOKUP_LIMIT: usize = 100;

#[serde_as]
#[derive(Serialize)]
struct LookupQuery {
    #[serde_as(as = "CommaSeparated<u64>")]
    user_id: Vec<u64>,
    include_entities: bool,
}

impl Client {
    /// Returns the extended information of a user.
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::user::UserModel;
    /// # fn main() -> twasync::error::Result<()> {
    /// let client = Client::new("MyProject/1.0")?;
    ///
    /// let mut user = client.show_user("twitter")?;
    /// println!("{} followers", user.get()?.followers_count()?);
    /// # Ok(()) }
    /// ```
    pub fn show_user<U: Into<UserRef>>(&self, user: U) -> Result<FutureResult<User>> {
        let query = [self.entities_param(), user.into().to_param()];

        self.get_json(self.rest_endpoint(&["users", "show.json"])?, &query[..])
    }

    /// Like [`show_user`](Self::show_user), with the model built by the client's
    /// [`ModelFactory`](crate::factory::ModelFactory).
    pub fn show_user_handle<U: Into<UserRef>>(&self, user: U) -> Result<UserHandle> {
        let query = [self.entities_param(), user.into().to_param()];

        let response = self.get(self.rest_endpoint(&["users", "show.json"])?, &query[..])?;
        self.factory().create_user(response)
    }

    /// Returns up to [`LOOKUP_LIMIT`] users at once. Ids that don't exist are left out of the
    /// result.
    pub fn lookup_users(&self, ids: &[u64]) -> Result<FutureResult<ResponseList<User>>> {
        self.ensure_authorization_enabled()?;

        if ids.is_empty() || ids.len() > LOOKUP_LIMIT {
            return Err(Error::Config(format!(
                "lookup needs between 1 and {} ids, got {}",
                LOOKUP_LIMIT,
                ids.len()
            )));
        }

        let query = LookupQuery {
            user_id: ids.to_vec(),
            include_entities: self.config().is_include_entities(),
        };

        let response = self.get(self.rest_endpoint(&["users", "lookup.json"])?, &query)?;

        Ok(FutureResult::with_response(
            response,
            ResponseList::from_response,
        ))
    }

    /// Blocks a user. Returns the blocked user.
    pub fn create_block<U: Into<UserRef>>(&self, user: U) -> Result<FutureResult<User>> {
        self.ensure_authorization_enabled()?;

        let query = [self.entities_param(), user.into().to_param()];

        self.post_json(
            self.rest_endpoint(&["blocks", "create.json"])?,
            &query[..],
            None,
        )
    }

    /// Unblocks a user. Returns the unblocked user.
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::user::UserModel;
    /// # fn main() -> twasync::error::Result<()> {
    /// let mut client = Client::new("MyProject/1.0")?;
    /// client.login("username", "password");
    ///
    /// let mut unblocked = client.destroy_block("spammer")?;
    /// println!("unblocked @{}", unblocked.get()?.screen_name()?);
    /// # Ok(()) }
    /// ```
    pub fn destroy_block<U: Into<UserRef>>(&self, user: U) -> Result<FutureResult<User>> {
        self.ensure_authorization_enabled()?;

        let query = [self.entities_param(), user.into().to_param()];

        self.post_json(
            self.rest_endpoint(&["blocks", "destroy.json"])?,
            &query[..],
            None,
        )
    }
}
