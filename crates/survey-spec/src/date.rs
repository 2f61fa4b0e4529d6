use std::borrow::Cow;
use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Calendar date carried as `YYYY-MM-DD` on the wire. Ordering is calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate(Date);

impl IsoDate {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn date(self) -> Date {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, time::error::Parse> {
        Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map(Self)
    }

    /// Accepts a plain calendar date or an RFC 3339 timestamp (its date part).
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        Self::parse(raw).ok().or_else(|| {
            OffsetDateTime::parse(raw.trim(), &Rfc3339)
                .ok()
                .map(|timestamp| Self(timestamp.date()))
        })
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl Serialize for IsoDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|_| {
            serde::de::Error::custom(format!("invalid date '{raw}', expected YYYY-MM-DD"))
        })
    }
}

impl JsonSchema for IsoDate {
    fn schema_name() -> Cow<'static, str> {
        "IsoDate".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "format": "date"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_in_calendar_order() {
        let early = IsoDate::parse("2024-02-09").expect("valid date");
        let late = IsoDate::parse("2024-10-01").expect("valid date");
        assert!(early < late);
    }

    #[test]
    fn lenient_parse_keeps_date_of_timestamp() {
        let date = IsoDate::parse_lenient("2023-05-17T22:10:00Z").expect("timestamp");
        assert_eq!(date.to_string(), "2023-05-17");
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(IsoDate::parse("2023-02-30").is_err());
        assert!(IsoDate::parse_lenient("next tuesday").is_none());
    }
}
