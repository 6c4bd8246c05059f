use super::{
    client::parse_json,
    error::Result,
    response::DeferredResponse,
};

use std::convert::TryFrom;

use chrono::{DateTime, TimeZone, Utc};

use serde::de::DeserializeOwned;

use std::ops::Deref;

/// Rate limit counters the API reports with each response.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RateLimitStatus {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the window resets.
    pub reset_time: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Reads the `X-RateLimit-*` headers. Returns `None` unless all of them are present and
    /// well-formed.
    pub fn from_response(response: &DeferredResponse) -> Result<Option<Self>> {
        let limit = response.header("X-RateLimit-Limit")?;
        let remaining = response.header("X-RateLimit-Remaining")?;
        let reset = response.header("X-RateLimit-Reset")?;

        Ok(Self::from_headers(
            limit.as_deref(),
            remaining.as_deref(),
            reset.as_deref(),
        ))
    }

    fn from_headers(
        limit: Option<&str>,
        remaining: Option<&str>,
        reset: Option<&str>,
    ) -> Option<Self> {
        let reset_secs: i64 = reset?.trim().parse().ok()?;

        Some(RateLimitStatus {
            limit: limit?.trim().parse().ok()?,
            remaining: remaining?.trim().parse().ok()?,
            reset_time: Utc.timestamp_opt(reset_secs, 0).single()?,
        })
    }

    /// Seconds until the window resets, from `now`. Zero if it already has.
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.reset_time - now).num_seconds()).unwrap_or(0)
    }
}

/// A list of models, along with the rate limit status of the response it was read from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResponseList<T> {
    items: Vec<T>,
    rate_limit: Option<RateLimitStatus>,
}

impl<T> ResponseList<T> {
    pub fn new(items: Vec<T>, rate_limit: Option<RateLimitStatus>) -> Self {
        ResponseList { items, rate_limit }
    }

    pub fn rate_limit_status(&self) -> Option<&RateLimitStatus> {
        self.rate_limit.as_ref()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: DeserializeOwned> ResponseList<T> {
    /// Parses a JSON array of models.
    pub fn from_response(response: &DeferredResponse) -> Result<Self> {
        let items = parse_json(response)?;

        Ok(ResponseList {
            items,
            rate_limit: RateLimitStatus::from_response(response)?,
        })
    }
}

impl<T> Deref for ResponseList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for ResponseList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ResponseList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn rate_limit_needs_every_header() {
        assert_eq!(
            RateLimitStatus::from_headers(Some("150"), Some("12"), Some("1277485629")),
            Some(RateLimitStatus {
                limit: 150,
                remaining: 12,
                reset_time: Utc.with_ymd_and_hms(2010, 6, 25, 17, 7, 9).unwrap(),
            })
        );

        assert_eq!(
            RateLimitStatus::from_headers(Some("150"), None, Some("1277485629")),
            None
        );
        assert_eq!(
            RateLimitStatus::from_headers(Some("lots"), Some("12"), Some("1277485629")),
            None
        );
    }

    #[test]
    fn seconds_until_reset() {
        let status = RateLimitStatus {
            limit: 150,
            remaining: 0,
            reset_time: Utc.with_ymd_and_hms(2010, 6, 25, 17, 7, 9).unwrap(),
        };

        let now = Utc.with_ymd_and_hms(2010, 6, 25, 17, 6, 9).unwrap();
        assert_eq!(status.seconds_until_reset(now), 60);

        let later = Utc.with_ymd_and_hms(2010, 6, 25, 18, 0, 0).unwrap();
        assert_eq!(status.seconds_until_reset(later), 0);
    }

    #[test]
    fn list_from_response() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("150"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("149"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1277485629"));

        let response = DeferredResponse::ready(RawResponse {
            status: 200,
            headers,
            body: Bytes::from_static(b"[3, 1, 2]"),
        });

        let list = ResponseList::<u8>::from_response(&response).unwrap();

        assert_eq!(&list[..], &[3, 1, 2]);
        assert_eq!(list.rate_limit_status().map(|r| r.limit), Some(150));
        assert_eq!((&list).into_iter().max(), Some(&3));
        assert_eq!(list.into_vec(), vec![3, 1, 2]);
    }
}
