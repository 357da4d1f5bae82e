//! TOML datetimes.
//!
//! TOML has four datetime flavours, all represented by [`Datetime`]:
//!
//! | Flavour | Example |
//! |---|---|
//! | Offset datetime | `1979-05-27T07:32:00-07:00` |
//! | Local datetime | `1979-05-27T07:32:00` |
//! | Local date | `1979-05-27` |
//! | Local time | `07:32:00.999999` |
//!
//! The date/time separator may be `T`, `t` or a space, and the UTC marker
//! `Z` or `z`. With the extended dialect enabled, the seconds of a datetime
//! or time may be left out (`07:32`).

use crate::error::{Error, Result, USAGE_DATETIME};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Newtype name under which datetimes travel through serde.
pub(crate) const DATETIME_TOKEN: &str = "$__tomldec_private_Datetime";

/// Map key that tags a datetime inside an untyped [`crate::Value`] tree.
pub(crate) const DATETIME_FIELD: &str = "$__tomldec_private_datetime";

/// A TOML datetime value.
///
/// # Examples
///
/// ```rust
/// use tomldec::Datetime;
///
/// let dt: Datetime = "1979-05-27T07:32:00Z".parse().unwrap();
/// assert!(dt.is_offset());
/// assert_eq!(dt.to_string(), "1979-05-27T07:32:00Z");
///
/// let date: Datetime = "1979-05-27".parse().unwrap();
/// assert!(matches!(date, Datetime::LocalDate(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datetime {
    Offset(DateTime<FixedOffset>),
    Local(NaiveDateTime),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
}

#[derive(Clone, Copy)]
enum Flavour {
    Offset,
    Local,
    LocalDate,
    LocalTime,
}

struct Layout {
    format: &'static str,
    shape: &'static str,
    flavour: Flavour,
    extended: bool,
}

const LAYOUTS: &[Layout] = &[
    Layout {
        format: "%Y-%m-%dT%H:%M:%S%.f%:z",
        shape: "0000-00-00T00:00:00",
        flavour: Flavour::Offset,
        extended: false,
    },
    Layout {
        format: "%Y-%m-%dT%H:%M:%S%.f",
        shape: "0000-00-00T00:00:00",
        flavour: Flavour::Local,
        extended: false,
    },
    Layout {
        format: "%Y-%m-%d",
        shape: "0000-00-00",
        flavour: Flavour::LocalDate,
        extended: false,
    },
    Layout {
        format: "%H:%M:%S%.f",
        shape: "00:00:00",
        flavour: Flavour::LocalTime,
        extended: false,
    },
    Layout {
        format: "%Y-%m-%dT%H:%M%:z",
        shape: "0000-00-00T00:00",
        flavour: Flavour::Offset,
        extended: true,
    },
    Layout {
        format: "%Y-%m-%dT%H:%M",
        shape: "0000-00-00T00:00",
        flavour: Flavour::Local,
        extended: true,
    },
    Layout {
        format: "%H:%M",
        shape: "00:00",
        flavour: Flavour::LocalTime,
        extended: true,
    },
];

impl Datetime {
    /// Parses a datetime literal.
    ///
    /// `extended` additionally accepts datetimes and times without seconds.
    ///
    /// # Errors
    ///
    /// Returns a literal error when no layout matches or when a numeric
    /// field is missing its leading zero.
    pub fn parse(text: &str, extended: bool) -> Result<Datetime> {
        let normalized = normalize(text);
        for layout in LAYOUTS {
            if layout.extended && !extended {
                continue;
            }
            let Some(parsed) = layout.try_parse(&normalized) else {
                continue;
            };
            if missing_leading_zero(&normalized, layout.shape) {
                return Err(invalid(text));
            }
            return Ok(parsed);
        }
        Err(invalid(text))
    }

    #[must_use]
    pub fn is_offset(&self) -> bool {
        matches!(self, Datetime::Offset(_))
    }

    /// The date component, if this datetime has one.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Datetime::Offset(dt) => Some(dt.date_naive()),
            Datetime::Local(dt) => Some(dt.date()),
            Datetime::LocalDate(d) => Some(*d),
            Datetime::LocalTime(_) => None,
        }
    }

    /// The time component, if this datetime has one.
    #[must_use]
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            Datetime::Offset(dt) => Some(dt.time()),
            Datetime::Local(dt) => Some(dt.time()),
            Datetime::LocalDate(_) => None,
            Datetime::LocalTime(t) => Some(*t),
        }
    }
}

impl Layout {
    fn try_parse(&self, s: &str) -> Option<Datetime> {
        match self.flavour {
            Flavour::Offset => {
                // chrono's `%:z` does not accept the `Z` shorthand.
                let s = match s.strip_suffix('Z') {
                    Some(rest) => format!("{rest}+00:00"),
                    None => s.to_string(),
                };
                DateTime::parse_from_str(&s, self.format)
                    .ok()
                    .map(Datetime::Offset)
            }
            Flavour::Local => NaiveDateTime::parse_from_str(s, self.format)
                .ok()
                .map(Datetime::Local),
            Flavour::LocalDate => NaiveDate::parse_from_str(s, self.format)
                .ok()
                .map(Datetime::LocalDate),
            Flavour::LocalTime => NaiveTime::parse_from_str(s, self.format)
                .ok()
                .map(Datetime::LocalTime),
        }
    }
}

fn normalize(text: &str) -> String {
    text.replace(|c: char| c == 't' || c == ' ', "T")
        .replace('z', "Z")
}

/// `true` if a separator of `shape` is not at the same offset in `s`.
fn missing_leading_zero(s: &str, shape: &str) -> bool {
    let bytes = s.as_bytes();
    shape
        .bytes()
        .enumerate()
        .filter(|(_, c)| !c.is_ascii_digit())
        .any(|(i, c)| bytes.get(i) != Some(&c))
}

fn invalid(text: &str) -> Error {
    Error::literal(format!("invalid TOML datetime {text:?}")).with_usage_text(USAGE_DATETIME)
}

impl FromStr for Datetime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Datetime::parse(s, false)
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datetime::Offset(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Datetime::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Datetime::LocalDate(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Datetime::LocalTime(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
        }
    }
}

impl Serialize for Datetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DATETIME_TOKEN, &self.to_string())
    }
}

struct DatetimeVisitor;

impl<'de> Visitor<'de> for DatetimeVisitor {
    type Value = Datetime;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a TOML datetime")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Datetime, E> {
        Datetime::parse(value, true).map_err(|e| E::custom(e.message()))
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Datetime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        self.visit_str(&text)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Datetime, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        match map.next_key::<String>()? {
            Some(key) if key == DATETIME_FIELD => {
                let text: String = map.next_value()?;
                self.visit_str(&text)
            }
            _ => Err(de::Error::custom("expected a TOML datetime")),
        }
    }
}

impl<'de> Deserialize<'de> for Datetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DATETIME_TOKEN, DatetimeVisitor)
    }
}
