//! Domain model of the pixiv integration: logical queries going in, and
//! normalized illustration records coming out.

use crate::util;
use serde::Deserialize;
use std::fmt;
use url::Url;

util::def_url_base!(pixiv_www, "https://www.pixiv.net");

#[derive(
    derive_more::Display, derive_more::FromStr, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize,
)]
#[serde(transparent)]
pub(crate) struct IllustId(pub(crate) u64);

/// Content-sensitivity tier of an illustration, ordered by severity.
///
/// Upstream encodes this inconsistently across API generations: the older
/// payloads use string labels (`white`/`semi_black`/`black`), the newer ones
/// use numeric sanity levels (2/4/6). Both decode into this single scale.
/// Unrecognized values decode as [`SafetyRating::Restricted`] so that new
/// upstream tiers never leak past the default filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) enum SafetyRating {
    #[default]
    Safe,
    Questionable,
    Restricted,
}

impl<'de> Deserialize<'de> for SafetyRating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = SafetyRating;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sanity level number or a safety label string")
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(match value {
                    0..=2 => SafetyRating::Safe,
                    3..=5 => SafetyRating::Questionable,
                    _ => SafetyRating::Restricted,
                })
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Self::Value, E> {
                self.visit_u64(value.try_into().unwrap_or(u64::MAX))
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(match value {
                    "white" => SafetyRating::Safe,
                    "semi_black" => SafetyRating::Questionable,
                    _ => SafetyRating::Restricted,
                })
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Ranking categories of the "top illustrations for a time period" endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum RankingMode {
    #[default]
    Day,
    Week,
    Month,
    DayMale,
    DayFemale,
    WeekOriginal,
    WeekRookie,
    DayManga,
    DayR18,
    WeekR18,
}

impl RankingMode {
    pub(crate) fn is_nsfw(self) -> bool {
        matches!(self, Self::DayR18 | Self::WeekR18)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryMode {
    Ranking(RankingMode),
    Search(String),
}

/// One logical fetch request. Immutable, constructed per inbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    pub(crate) mode: QueryMode,
    pub(crate) nsfw: bool,
    /// Linear 0-based cursor into the result set, in units of single records.
    pub(crate) offset: u32,
}

impl Query {
    pub(crate) fn ranking(mode: RankingMode, offset: u32) -> Self {
        Self {
            nsfw: mode.is_nsfw(),
            mode: QueryMode::Ranking(mode),
            offset,
        }
    }

    pub(crate) fn search(term: impl Into<String>, nsfw: bool, offset: u32) -> Self {
        Self {
            mode: QueryMode::Search(term.into()),
            nsfw,
            offset,
        }
    }
}

/// Uniform illustration record produced by normalization, one per page of
/// the original entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IllustrationRecord {
    pub(crate) id: Option<IllustId>,
    pub(crate) display_url: Url,
    pub(crate) thumb_url: Url,
    pub(crate) title: String,
    pub(crate) author_name: String,
    pub(crate) author_id: Option<u64>,
}

impl IllustrationRecord {
    pub(crate) fn author_url(&self) -> Option<Url> {
        self.author_id
            .map(|id| pixiv_www(["en", "users", &id.to_string()]))
    }

    /// Human-facing artwork page on pixiv, if the entry carried an id.
    pub(crate) fn page_url(&self) -> Option<Url> {
        self.id
            .map(|id| pixiv_www(["en", "artworks", &id.to_string()]))
    }
}

/// One page of fetch results along with the cursor to request the next one.
/// `next_offset: None` means the result set is exhausted.
#[derive(Debug, Clone)]
pub(crate) struct PageResult {
    pub(crate) records: Vec<IllustrationRecord>,
    pub(crate) next_offset: Option<u32>,
}

/// Opaque upstream credential. The debug representation is redacted, since
/// these values end up in spans and log records.
#[derive(Clone)]
pub(crate) enum Credential {
    RefreshToken(String),
    Password { username: String, password: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshToken(_) => f.write_str("Credential::RefreshToken(<redacted>)"),
            Self::Password { .. } => f.write_str("Credential::Password(<redacted>)"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AccessToken(String);

impl AccessToken {
    pub(crate) fn new(secret: String) -> Self {
        Self(secret)
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_rating_is_ordered_by_severity() {
        assert!(SafetyRating::Safe < SafetyRating::Questionable);
        assert!(SafetyRating::Questionable < SafetyRating::Restricted);
    }

    #[test]
    fn safety_rating_decodes_both_upstream_encodings() {
        let decode = |json: &str| serde_json::from_str::<SafetyRating>(json).unwrap();

        assert_eq!(decode("2"), SafetyRating::Safe);
        assert_eq!(decode("4"), SafetyRating::Questionable);
        assert_eq!(decode("6"), SafetyRating::Restricted);

        assert_eq!(decode(r#""white""#), SafetyRating::Safe);
        assert_eq!(decode(r#""semi_black""#), SafetyRating::Questionable);
        assert_eq!(decode(r#""black""#), SafetyRating::Restricted);

        // Unknown tiers must never pass the default filter
        assert_eq!(decode(r#""grotesque""#), SafetyRating::Restricted);
        assert_eq!(decode("100"), SafetyRating::Restricted);
    }

    #[test]
    fn ranking_mode_round_trips_through_wire_names() {
        assert_eq!(RankingMode::DayR18.to_string(), "day_r18");
        assert_eq!(RankingMode::WeekOriginal.to_string(), "week_original");
        assert_eq!("day_manga".parse::<RankingMode>().unwrap(), RankingMode::DayManga);
    }

    #[test]
    fn r18_ranking_implies_nsfw() {
        assert!(Query::ranking(RankingMode::DayR18, 0).nsfw);
        assert!(!Query::ranking(RankingMode::Day, 0).nsfw);
    }
}
