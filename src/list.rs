use super::{
    client::{parse_json, resolve_owned, Client},
    error::Result,
    future::FutureResult,
    response::DeferredResponse,
    response_list::RateLimitStatus,
    user::User,
};

use either::Either;

use futures::stream::unfold;
use futures::{Stream, StreamExt};

use serde::Deserialize;

use serde_with::{serde_as, DisplayFromStr};

use std::ops::Deref;

/// Cursor to pass to get the first page of a cursored endpoint.
pub const FIRST_CURSOR: i64 = -1;

/// One page of a cursored list, with the cursors pointing to its neighbours. A cursor of `0`
/// means there is no page in that direction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PagableResponseList<T> {
    items: Vec<T>,
    previous_cursor: i64,
    next_cursor: i64,
    rate_limit: Option<RateLimitStatus>,
}

impl<T> PagableResponseList<T> {
    pub fn previous_cursor(&self) -> i64 {
        self.previous_cursor
    }

    pub fn next_cursor(&self) -> i64 {
        self.next_cursor
    }

    pub fn has_previous(&self) -> bool {
        self.previous_cursor != 0
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor != 0
    }

    pub fn rate_limit_status(&self) -> Option<&RateLimitStatus> {
        self.rate_limit.as_ref()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for PagableResponseList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

// The `_str` cursors are exact, unlike the numbers for clients parsing JSON numbers as floats.
#[serde_as]
#[derive(Deserialize)]
struct UsersPage {
    users: Vec<User>,
    #[serde_as(as = "DisplayFromStr")]
    previous_cursor_str: i64,
    #[serde_as(as = "DisplayFromStr")]
    next_cursor_str: i64,
}

impl PagableResponseList<User> {
    fn users_from_response(response: &DeferredResponse) -> Result<Self> {
        let page: UsersPage = parse_json(response)?;

        Ok(PagableResponseList {
            items: page.users,
            previous_cursor: page.previous_cursor_str,
            next_cursor: page.next_cursor_str,
            rate_limit: RateLimitStatus::from_response(response)?,
        })
    }
}

impl Client {
    /// Returns a page of the members of a list. Start with [`FIRST_CURSOR`] and follow
    /// [`next_cursor`](PagableResponseList::next_cursor).
    ///
    /// ```no_run
    /// # use twasync::client::Client;
    /// # use twasync::list::FIRST_CURSOR;
    /// # fn main() -> twasync::error::Result<()> {
    /// let mut client = Client::new("MyProject/1.0")?;
    /// client.login("username", "password");
    ///
    /// let mut members = client.user_list_members("twitter", 8044403, FIRST_CURSOR)?;
    /// for user in members.get()?.iter() {
    ///     println!("@{}", user.screen_name);
    /// }
    /// # Ok(()) }
    /// ```
    pub fn user_list_members(
        &self,
        list_owner_screen_name: &str,
        list_id: u64,
        cursor: i64,
    ) -> Result<FutureResult<PagableResponseList<User>>> {
        self.ensure_authorization_enabled()?;

        let list_id = list_id.to_string();
        let url = self.rest_endpoint(&[list_owner_screen_name, &list_id, "members.json"])?;

        let response = self.get(url, &[("cursor", cursor.to_string()), self.entities_param()][..])?;

        Ok(FutureResult::with_response(
            response,
            PagableResponseList::users_from_response,
        ))
    }

    /// Returns a Stream over all the members of a list, following the cursors.
    pub fn user_list_members_stream<'a>(
        &'a self,
        list_owner_screen_name: &'a str,
        list_id: u64,
    ) -> impl Stream<Item = Result<User>> + 'a + Send {
        unfold(Some(FIRST_CURSOR), move |cursor| {
            self.user_list_members_page(list_owner_screen_name, list_id, cursor)
        })
        .map(futures::stream::iter)
        .flatten()
    }

    async fn user_list_members_page(
        &self,
        list_owner_screen_name: &str,
        list_id: u64,
        cursor: Option<i64>,
    ) -> Option<(impl Iterator<Item = Result<User>>, Option<i64>)> {
        let cursor = cursor?;

        let page = match resolve_owned(self.user_list_members(
            list_owner_screen_name,
            list_id,
            cursor,
        ))
        .await
        {
            Err(e) => return Some((Either::Left(std::iter::once(Err(e))), None)),
            Ok(page) => page,
        };

        let next = page.has_next().then(|| page.next_cursor());

        Some((Either::Right(page.into_vec().into_iter().map(Ok)), next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocked_client;
    use crate::error::Error;
    use mockito::{mock, Matcher};

    const PAGES: [&str; 2] = [
        include_str!("mocked/list_members_cursor-first.json"),
        include_str!("mocked/list_members_cursor-1305102810874389703.json"),
    ];

    #[test]
    fn members_require_authorization() {
        let client = mocked_client();

        assert!(matches!(
            client.user_list_members("twitter", 8044403, FIRST_CURSOR),
            Err(Error::NotAuthorized)
        ));
    }

    #[test]
    fn user_list_members() {
        let mut client = mocked_client();
        client.set_bearer_token("unit_test");

        let _m = mock(
            "GET",
            Matcher::Exact(String::from(
                "/1/twitter/8044403/members.json?cursor=-1&include_entities=true",
            )),
        )
        .with_body(PAGES[0])
        .create();

        let mut members = client
            .user_list_members("twitter", 8044403, FIRST_CURSOR)
            .unwrap();
        let members = members.get().unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].screen_name, "twitterapi");
        assert!(!members.has_previous());
        assert!(members.has_next());
        assert_eq!(members.next_cursor(), 1305102810874389703);
    }

    #[tokio::test]
    async fn members_stream_follows_cursors() {
        let mut client = mocked_client();
        client.set_bearer_token("unit_test");

        let _m = [
            mock(
                "GET",
                Matcher::Exact(String::from(
                    "/1/twitterapi/2031945/members.json?cursor=-1&include_entities=true",
                )),
            )
            .with_body(PAGES[0])
            .create(),
            mock(
                "GET",
                Matcher::Exact(String::from(
                    "/1/twitterapi/2031945/members.json?cursor=1305102810874389703&include_entities=true",
                )),
            )
            .with_body(PAGES[1])
            .create(),
        ];

        let names = client
            .user_list_members_stream("twitterapi", 2031945)
            .map(|user| user.map(|u| u.screen_name))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(names, vec!["twitterapi", "twitter", "jack"]);
    }
}
