use super::{
    client::{parse_json, Client, Params},
    error::Result,
    factory::StatusHandle,
    future::FutureResult,
    lazy::lazy_model,
    response::DeferredResponse,
    response_list::ResponseList,
    user::{User, UserRef},
    utils::{nullable_bool, twitter_date},
};

use chrono::{DateTime, Utc};

use serde::Deserialize;

/// Read access to a status' properties.
pub trait StatusModel {
    fn id(&self) -> Result<u64>;
    fn text(&self) -> Result<&str>;
    /// The client the status was posted from, usually as an HTML link.
    fn source(&self) -> Result<&str>;
    fn created_at(&self) -> Result<DateTime<Utc>>;
    fn is_truncated(&self) -> Result<bool>;
    fn is_favorited(&self) -> Result<bool>;
    fn retweet_count(&self) -> Result<u64>;
    fn in_reply_to_status_id(&self) -> Result<Option<u64>>;
    fn in_reply_to_screen_name(&self) -> Result<Option<&str>>;
    /// The author. Missing when the API was asked to trim users.
    fn user(&self) -> Result<Option<&User>>;
    fn retweeted_status(&self) -> Result<Option<&Status>>;
    fn is_retweet(&self) -> Result<bool>;
    /// Whether the text mentions `@screen_name`, ignoring case.
    fn mentions(&self, screen_name: &str) -> Result<bool>;
}

/// A tweet.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Status {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub source: String,
    #[serde(deserialize_with = "twitter_date")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_bool")]
    pub truncated: bool,
    #[serde(default, deserialize_with = "nullable_bool")]
    pub favorited: bool,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<u64>,
    #[serde(default)]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub retweeted_status: Option<Box<Status>>,
}

impl Status {
    pub fn from_response(response: &DeferredResponse) -> Result<Self> {
        parse_json(response)
    }
}

fn mentions(text: &str, screen_name: &str) -> bool {
    let wanted = screen_name.trim_start_matches('@');

    text.match_indices('@').any(|(at, _)| {
        let name: String = text[at + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        !name.is_empty() && name.eq_ignore_ascii_case(wanted)
    })
}

impl StatusModel for Status {
    fn id(&self) -> Result<u64> {
        Ok(self.id)
    }

    fn text(&self) -> Result<&str> {
        Ok(&self.text)
    }

    fn source(&self) -> Result<&str> {
        Ok(&self.source)
    }

    fn created_at(&self) -> Result<DateTime<Utc>> {
        Ok(self.created_at)
    }

    fn is_truncated(&self) -> Result<bool> {
        Ok(self.truncated)
    }

    fn is_favorited(&self) -> Result<bool> {
        Ok(self.favorited)
    }

    fn retweet_count(&self) -> Result<u64> {
        Ok(self.retweet_count)
    }

    fn in_reply_to_status_id(&self) -> Result<Option<u64>> {
        Ok(self.in_reply_to_status_id)
    }

    fn in_reply_to_screen_name(&self) -> Result<Option<&str>> {
        Ok(self.in_reply_to_screen_name.as_deref())
    }

    fn user(&self) -> Result<Option<&User>> {
        Ok(self.user.as_ref())
    }

    fn retweeted_status(&self) -> Result<Option<&Status>> {
        Ok(self.retweeted_status.as_deref())
    }

    fn is_retweet(&self) -> Result<bool> {
        Ok(self.retweeted_status.is_some())
    }

    fn mentions(&self, screen_name: &str) -> Result<bool> {
        Ok(mentions(&self.text, screen_name))
    }
}

lazy_model! {
    /// A [`Status`] that is only parsed on first use. Any method may block while the response
    /// is fetched.
    pub struct LazyStatus(Status): StatusModel {
        fn id(&self) -> u64;
        fn text(&self) -> &str;
        fn source(&self) -> &str;
        fn created_at(&self) -> DateTime<Utc>;
        fn is_truncated(&self) -> bool;
        fn is_favorited(&self) -> bool;
        fn retweet_count(&self) -> u64;
        fn in_reply_to_status_id(&self) -> Option<u64>;
        fn in_reply_to_screen_name(&self) -> Option<&str>;
        fn user(&self) -> Option<&User>;
        fn retweeted_status(&self) -> Option<&Status>;
        fn is_retweet(&self) -> bool;
        fn mentions(&self, screen_name: &str) -> bool;
    }
}

impl Client {
    /// Returns a single status.
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::status::StatusModel;
    /// # fn main() -> twasync::error::Result<()> {
    /// let client = Client::new("MyProject/1.0")?;
    ///
    /// let mut status = client.show_status(20)?;
    /// println!("{}", status.get()?.text()?);
    /// # Ok(()) }
    /// ```
    pub fn show_status(&self, id: u64) -> Result<FutureResult<Status>> {
        let id = format!("{}.json", id);

        self.get_json(
            self.rest_endpoint(&["statuses", "show", &id])?,
            &[self.entities_param()][..],
        )
    }

    /// Like [`show_status`](Self::show_status), with the model built by the client's
    /// [`ModelFactory`](crate::factory::ModelFactory).
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::config::Config;
    /// # use twasync::factory::ModelStrategy;
    /// # use twasync::status::StatusModel;
    /// # fn main() -> twasync::error::Result<()> {
    /// let client = Client::with_config(Config::new().model_strategy(ModelStrategy::Lazy))?;
    ///
    /// // returns right away...
    /// let status = client.show_status_handle(20)?;
    ///
    /// // ...and this waits for the response
    /// println!("{}", status.text()?);
    /// # Ok(()) }
    /// ```
    pub fn show_status_handle(&self, id: u64) -> Result<StatusHandle> {
        let id = format!("{}.json", id);

        let response = self.get(
            self.rest_endpoint(&["statuses", "show", &id])?,
            &[self.entities_param()][..],
        )?;

        self.factory().create_status(response)
    }

    /// Posts a new status for the authenticated user.
    pub fn update_status(&self, text: &str) -> Result<FutureResult<Status>> {
        self.update(text, None)
    }

    /// Posts a new status in reply to another one. The text must mention the author of the
    /// status being replied to, or the API ignores the reply.
    pub fn reply_to_status(&self, text: &str, in_reply_to: u64) -> Result<FutureResult<Status>> {
        self.update(text, Some(in_reply_to))
    }

    fn update(&self, text: &str, in_reply_to: Option<u64>) -> Result<FutureResult<Status>> {
        self.ensure_authorization_enabled()?;

        let mut form: Params = vec![("status", text.to_owned())];
        if let Some(id) = in_reply_to {
            form.push(("in_reply_to_status_id", id.to_string()));
        }

        self.post_json(
            self.rest_endpoint(&["statuses", "update.json"])?,
            &[self.entities_param()][..],
            Some(&form),
        )
    }

    /// Deletes a status of the authenticated user. Returns the deleted status.
    pub fn destroy_status(&self, id: u64) -> Result<FutureResult<Status>> {
        self.ensure_authorization_enabled()?;

        let id = format!("{}.json", id);

        self.post_json(
            self.rest_endpoint(&["statuses", "destroy", &id])?,
            &[self.entities_param()][..],
            None,
        )
    }

    /// Returns the most recent statuses of the authenticated user and the users they follow.
    /// Pages start at 1.
    pub fn home_timeline(&self, page: Option<u32>) -> Result<FutureResult<ResponseList<Status>>> {
        self.ensure_authorization_enabled()?;

        let mut query: Params = vec![self.entities_param(), self.rts_param()];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }

        let response = self.get(self.rest_endpoint(&["statuses", "home_timeline.json"])?, &query)?;

        Ok(FutureResult::with_response(
            response,
            ResponseList::from_response,
        ))
    }

    /// Returns the most recent statuses posted by a user.
    pub fn user_timeline<U: Into<UserRef>>(
        &self,
        user: U,
    ) -> Result<FutureResult<ResponseList<Status>>> {
        let query = [self.entities_param(), self.rts_param(), user.into().to_param()];

        let response = self.get(
            self.rest_endpoint(&["statuses", "user_timeline.json"])?,
            &query[..],
        )?;

        Ok(FutureResult::with_response(
            response,
            ResponseList::from_response,
        ))
    }
}
