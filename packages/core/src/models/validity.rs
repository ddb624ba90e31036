//! Bitemporal validity filtering for relationships.
//!
//! A relationship carries `validity_from` and `validity_to`. An absent or
//! empty `validity_to` is an open interval: the relationship is current.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidityError {
    #[error("as_of_date must be an ISO-8601 date or datetime, got '{0}'")]
    InvalidInstant(String),
}

/// Validity settings as a caller supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValiditySpec {
    #[serde(default = "default_current_only")]
    pub current_only: bool,
    #[serde(default, alias = "as_of")]
    pub as_of_date: Option<String>,
}

fn default_current_only() -> bool {
    true
}

impl Default for ValiditySpec {
    fn default() -> Self {
        Self {
            current_only: true,
            as_of_date: None,
        }
    }
}

impl ValiditySpec {
    pub fn current() -> Self {
        Self::default()
    }

    pub fn unfiltered() -> Self {
        Self {
            current_only: false,
            as_of_date: None,
        }
    }

    pub fn as_of(instant: impl Into<String>) -> Self {
        Self {
            current_only: false,
            as_of_date: Some(instant.into()),
        }
    }
}

/// The resolved validity rule.
///
/// `AsOf` wins over `CurrentOnly` when both are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityFilter {
    Unfiltered,
    CurrentOnly,
    AsOf(DateTime<Utc>),
}

impl ValidityFilter {
    pub fn from_spec(spec: &ValiditySpec) -> Result<Self, ValidityError> {
        let as_of = spec
            .as_of_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match as_of {
            Some(raw) => parse_instant(raw)
                .map(ValidityFilter::AsOf)
                .ok_or_else(|| ValidityError::InvalidInstant(raw.to_string())),
            None if spec.current_only => Ok(ValidityFilter::CurrentOnly),
            None => Ok(ValidityFilter::Unfiltered),
        }
    }

    /// Whether a relationship with these bounds is counted.
    pub fn admits(&self, validity_from: Option<&str>, validity_to: Option<&str>) -> bool {
        let to = validity_to.map(str::trim).filter(|s| !s.is_empty());
        match self {
            ValidityFilter::Unfiltered => true,
            ValidityFilter::CurrentOnly => to.is_none(),
            ValidityFilter::AsOf(instant) => {
                let started = validity_from
                    .and_then(parse_instant)
                    .is_some_and(|from| from <= *instant);
                let not_ended = match to {
                    None => true,
                    Some(raw) => parse_instant(raw).is_some_and(|to| to >= *instant),
                };
                started && not_ended
            }
        }
    }

    /// The instant as an RFC 3339 string, for query parameters.
    pub fn as_of_param(&self) -> Option<String> {
        match self {
            ValidityFilter::AsOf(instant) => Some(instant.to_rfc3339()),
            _ => None,
        }
    }
}

/// Parse an RFC 3339 datetime, a naive `YYYY-MM-DDTHH:MM:SS` or a bare date.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
