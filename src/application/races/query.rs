//! Caller parameters for race listings.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::races::{DistanceFilter, RaceRecord, select};

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 12;

/// Query string as received; every field stays textual until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRaceQuery {
    pub distance: Option<String>,
    pub limit: Option<String>,
}

impl RawRaceQuery {
    /// Build from decoded query pairs. A repeated key keeps its first value;
    /// unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "distance" => &mut raw.distance,
                "limit" => &mut raw.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        raw
    }
}

/// Validation failures grouped the way clients expect them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationIssues {
    #[serde(rename = "formErrors")]
    pub form_errors: Vec<String>,
    #[serde(rename = "fieldErrors")]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationIssues {
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            field_errors: BTreeMap::new(),
        }
    }

    fn field(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceQuery {
    pub distance: Option<DistanceFilter>,
    pub limit: usize,
}

impl Default for RaceQuery {
    fn default() -> Self {
        Self {
            distance: None,
            limit: MAX_LIMIT as usize,
        }
    }
}

impl RaceQuery {
    pub fn from_raw(raw: &RawRaceQuery) -> Result<Self, ValidationIssues> {
        let mut issues = ValidationIssues::default();

        let distance = match raw.distance.as_deref() {
            None => None,
            Some(value) => match DistanceFilter::parse(value) {
                Some(filter) => Some(filter),
                None => {
                    issues.field(
                        "distance",
                        format!("Invalid enum value. Expected 'HALF' | 'FULL', received '{value}'"),
                    );
                    None
                }
            },
        };

        let limit = match raw.limit.as_deref() {
            None => Some(MAX_LIMIT),
            Some(value) => match parse_limit(value) {
                Ok(limit) => Some(limit),
                Err(message) => {
                    issues.field("limit", message);
                    None
                }
            },
        };

        match (distance, limit) {
            (distance, Some(limit)) if issues.is_empty() => Ok(Self {
                distance,
                limit: usize::try_from(limit).unwrap_or(MAX_LIMIT as usize),
            }),
            _ => Err(issues),
        }
    }

    /// Filter by distance, then keep at most `limit` records.
    pub fn apply(&self, records: &[RaceRecord]) -> Vec<RaceRecord> {
        select(records, self.distance, self.limit)
    }
}

/// Integer in `[MIN_LIMIT, MAX_LIMIT]`. Blank text counts as zero.
fn parse_limit(value: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    let number = if trimmed.is_empty() {
        0
    } else {
        match trimmed.parse::<i64>() {
            Ok(number) => number,
            Err(_) => {
                return Err(match trimmed.parse::<f64>() {
                    Ok(float) if float.is_finite() => {
                        "Expected integer, received float".to_string()
                    }
                    _ => "Expected number, received nan".to_string(),
                });
            }
        }
    };

    if number < MIN_LIMIT {
        return Err(format!(
            "Number must be greater than or equal to {MIN_LIMIT}"
        ));
    }
    if number > MAX_LIMIT {
        return Err(format!("Number must be less than or equal to {MAX_LIMIT}"));
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(distance: Option<&str>, limit: Option<&str>) -> RawRaceQuery {
        RawRaceQuery {
            distance: distance.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_all_distances_and_twelve() {
        let query = RaceQuery::from_raw(&RawRaceQuery::default()).expect("valid");
        assert_eq!(query, RaceQuery::default());
        assert_eq!(query.limit, 12);
    }

    #[test]
    fn accepts_bounds() {
        let query = RaceQuery::from_raw(&raw(Some("HALF"), Some("1"))).expect("valid");
        assert_eq!(query.distance, Some(DistanceFilter::Half));
        assert_eq!(query.limit, 1);

        let query = RaceQuery::from_raw(&raw(Some("FULL"), Some(" 12 "))).expect("valid");
        assert_eq!(query.limit, 12);
    }

    #[test]
    fn rejects_unknown_distance() {
        let issues = RaceQuery::from_raw(&raw(Some("SPRINT"), None)).expect_err("invalid");
        assert!(issues.form_errors.is_empty());
        assert_eq!(issues.field_errors["distance"].len(), 1);
        assert!(issues.field_errors["distance"][0].contains("'SPRINT'"));
    }

    #[test]
    fn rejects_out_of_range_and_non_integer_limits() {
        for value in ["0", "13", "50", "-1", "", "abc", "2.5"] {
            let issues = RaceQuery::from_raw(&raw(None, Some(value))).expect_err(value);
            assert!(issues.field_errors.contains_key("limit"), "{value}");
        }
    }

    #[test]
    fn collects_every_field_error() {
        let issues = RaceQuery::from_raw(&raw(Some("half"), Some("99"))).expect_err("invalid");
        assert_eq!(
            issues.field_errors.keys().collect::<Vec<_>>(),
            ["distance", "limit"]
        );
    }

    #[test]
    fn issues_serialize_with_client_field_names() {
        let issues = RaceQuery::from_raw(&raw(None, Some("50"))).expect_err("invalid");
        let value = serde_json::to_value(&issues).expect("serialize");
        assert_eq!(value["formErrors"], serde_json::json!([]));
        assert_eq!(
            value["fieldErrors"]["limit"][0],
            "Number must be less than or equal to 12"
        );
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let parsed = RawRaceQuery::from_pairs([
            ("limit", "1"),
            ("utm_source", "newsletter"),
            ("limit", "50"),
            ("distance", "FULL"),
        ]);
        assert_eq!(parsed, raw(Some("FULL"), Some("1")));
        assert_eq!(RaceQuery::from_raw(&parsed).expect("valid").limit, 1);
    }
}
