use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Format of the dates in the REST API, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

pub fn parse_twitter_date(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(s, TWITTER_DATE_FORMAT).map(|d| d.with_timezone(&Utc))
}

pub fn twitter_date<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    parse_twitter_date(&s).map_err(de::Error::custom)
}

/// Search results use RFC 2822 dates instead, e.g. `Thu, 29 Jul 2010 23:39:40 +0000`.
pub fn rfc2822_date<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    DateTime::parse_from_rfc2822(&s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(de::Error::custom)
}

/// `null` counts as `false`.
pub fn nullable_bool<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(de)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn twitter_dates() {
        assert_eq!(
            parse_twitter_date("Wed Aug 27 13:08:45 +0000 2008").unwrap(),
            Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap()
        );

        assert_eq!(
            parse_twitter_date("Wed Aug 27 15:08:45 +0200 2008").unwrap(),
            Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap()
        );

        assert!(parse_twitter_date("2008-08-27T13:08:45Z").is_err());
    }
}
