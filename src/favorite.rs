use super::{
    client::{Client, Params},
    error::Result,
    future::FutureResult,
    response_list::ResponseList,
    status::Status,
};

impl Client {
    /// Returns the statuses the authenticated user marked as favorite, 20 per page. Pages start
    /// at 1.
    pub fn favorites(&self, page: Option<u32>) -> Result<FutureResult<ResponseList<Status>>> {
        self.ensure_authorization_enabled()?;

        let mut query: Params = vec![self.entities_param()];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }

        let response = self.get(self.rest_endpoint(&["favorites.json"])?, &query)?;

        Ok(FutureResult::with_response(
            response,
            ResponseList::from_response,
        ))
    }

    /// Marks a status as favorite. Returns the status.
    pub fn create_favorite(&self, id: u64) -> Result<FutureResult<Status>> {
        self.favorite_action("create", id)
    }

    /// Un-marks a status as favorite. Returns the status.
    pub fn destroy_favorite(&self, id: u64) -> Result<FutureResult<Status>> {
        self.favorite_action("destroy", id)
    }

    fn favorite_action(&self, action: &str, id: u64) -> Result<FutureResult<Status>> {
        self.ensure_authorization_enabled()?;

        let id = format!("{}.json", id);

        self.post_json(
            self.rest_endpoint(&["favorites", action, &id])?,
            &[self.entities_param()][..],
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::client::mocked_client;
    use crate::error::Error;
    use crate::status::StatusModel;
    use mockito::{mock, Matcher};

    #[test]
    fn favorites_require_authorization() {
        let client = mocked_client();

        assert!(matches!(client.favorites(None), Err(Error::NotAuthorized)));
        assert!(matches!(client.create_favorite(20), Err(Error::NotAuthorized)));
        assert!(matches!(client.destroy_favorite(20), Err(Error::NotAuthorized)));
    }

    #[test]
    fn favorites() {
        let mut client = mocked_client();
        client.set_bearer_token("unit_test");

        let _m = mock(
            "GET",
            Matcher::Exact(String::from("/1/favorites.json?include_entities=true")),
        )
        .with_body(include_str!("mocked/home_timeline.json"))
        .create();

        let mut favorites = client.favorites(None).unwrap();

        assert_eq!(favorites.get().unwrap().len(), 2);
    }

    #[test]
    fn create_and_destroy_favorite() {
        let mut client = mocked_client();
        client.set_bearer_token("unit_test");

        let _m = [
            mock(
                "POST",
                Matcher::Exact(String::from("/1/favorites/create/22.json?include_entities=true")),
            )
            .with_body(include_str!("mocked/status_20.json").replace(
                r#""favorited": false"#,
                r#""favorited": true"#,
            ))
            .create(),
            mock(
                "POST",
                Matcher::Exact(String::from("/1/favorites/destroy/22.json?include_entities=true")),
            )
            .with_status(403)
            .with_body(r#"{"errors":[{"message":"You have not favorited this status.","code":144}]}"#)
            .create(),
        ];

        let mut created = client.create_favorite(22).unwrap();
        assert!(created.get().unwrap().is_favorited().unwrap());

        let mut destroyed = client.destroy_favorite(22).unwrap();
        let err = destroyed.get().unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(err.to_string().contains("You have not favorited this status. (code 144)"));
    }
}
