use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::GLOBAL_SCOPE_KEY;

use super::Photo;

/// The grouping a curation request runs over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Scope {
    #[serde(rename_all = "camelCase")]
    Event { event_id: String },
    #[serde(rename_all = "camelCase")]
    Athlete { athlete_id: String },
    Global,
    /// A capture-time window, `from` inclusive, `to` exclusive.
    Season {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl Scope {
    pub fn event(event_id: impl Into<String>) -> Self {
        Self::Event {
            event_id: event_id.into(),
        }
    }

    pub fn athlete(athlete_id: impl Into<String>) -> Self {
        Self::Athlete {
            athlete_id: athlete_id.into(),
        }
    }

    /// Cache and staleness key, e.g. `event:E1`, `athlete:A1`, `global`.
    pub fn key(&self) -> String {
        match self {
            Self::Event { event_id } => format!("event:{event_id}"),
            Self::Athlete { athlete_id } => format!("athlete:{athlete_id}"),
            Self::Global => GLOBAL_SCOPE_KEY.to_string(),
            Self::Season { from, to } => format!(
                "season:{}..{}",
                from.to_rfc3339_opts(SecondsFormat::Secs, true),
                to.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }

    /// Whether a photo falls inside this scope.
    pub fn contains(&self, photo: &Photo) -> bool {
        match self {
            Self::Event { event_id } => photo.event_id == *event_id,
            Self::Athlete { athlete_id } => photo.athlete_id.as_deref() == Some(athlete_id),
            Self::Global => true,
            Self::Season { .. } => self.filter().map_or(true, |f| f.matches(photo)),
        }
    }

    /// Capture-time filter for global-style scopes.
    pub fn filter(&self) -> Option<PhotoFilter> {
        match self {
            Self::Season { from, to } => Some(PhotoFilter {
                captured_from: Some(*from),
                captured_to: Some(*to),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Scope {
    type Err = String;

    /// Parse a scope key produced by [`Scope::key`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == GLOBAL_SCOPE_KEY {
            return Ok(Self::Global);
        }
        match s.split_once(':') {
            Some(("event", id)) if !id.is_empty() => Ok(Self::event(id)),
            Some(("athlete", id)) if !id.is_empty() => Ok(Self::athlete(id)),
            Some(("season", window)) => {
                let (from, to) = window
                    .split_once("..")
                    .ok_or_else(|| format!("season scope '{s}' must be '<from>..<to>'"))?;
                let parse = |t: &str| {
                    DateTime::parse_from_rfc3339(t)
                        .map(|d| d.with_timezone(&Utc))
                        .map_err(|e| format!("season bound '{t}': {e}"))
                };
                Ok(Self::Season {
                    from: parse(from)?,
                    to: parse(to)?,
                })
            }
            _ => Err(format!("unrecognized scope key '{s}'")),
        }
    }
}

/// Optional filter for whole-collection queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoFilter {
    pub captured_from: Option<DateTime<Utc>>,
    pub captured_to: Option<DateTime<Utc>>,
}

impl PhotoFilter {
    pub fn matches(&self, photo: &Photo) -> bool {
        self.captured_from.map_or(true, |from| photo.captured_at >= from)
            && self.captured_to.map_or(true, |to| photo.captured_at < to)
    }
}
