//! Buyer-side listing search.
//!
//! Criteria arrive as untyped form strings. Every criterion is optional and the
//! ones present are ANDed together. A numeric criterion that does not parse is
//! dropped rather than failing the search.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::Property;

/// Raw search form. An empty value means "no constraint".
///
/// `place` is matched as typed, surrounding whitespace included. Numeric fields are
/// trimmed before parsing, so a whitespace-only number is also unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub area_min: Option<String>,
    #[serde(default)]
    pub area_max: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<String>,
    #[serde(default)]
    pub bathrooms: Option<String>,
}

/// A numeric criterion that was ignored because it is not a whole number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("ignored {field} filter: '{value}' is not a whole number")]
pub struct UnparsableFilterValue {
    pub field: &'static str,
    pub value: String,
}

/// Criteria parsed into predicates, plus whatever had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    place: Option<String>,
    area_min: Option<i64>,
    area_max: Option<i64>,
    bedrooms: Option<i64>,
    bathrooms: Option<i64>,
    skipped: Vec<UnparsableFilterValue>,
}

impl PropertyFilter {
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        let mut skipped = Vec::new();
        let mut number = |field: &'static str, raw: &Option<String>| {
            parse_number(field, raw).unwrap_or_else(|err| {
                debug!(%err, "skipping search criterion");
                skipped.push(err);
                None
            })
        };

        let area_min = number("area_min", &criteria.area_min);
        let area_max = number("area_max", &criteria.area_max);
        let bedrooms = number("bedrooms", &criteria.bedrooms);
        let bathrooms = number("bathrooms", &criteria.bathrooms);

        Self {
            place: criteria
                .place
                .as_deref()
                .filter(|place| !place.is_empty())
                .map(str::to_lowercase),
            area_min,
            area_max,
            bedrooms,
            bathrooms,
            skipped,
        }
    }

    pub fn skipped(&self) -> &[UnparsableFilterValue] {
        &self.skipped
    }

    pub fn matches(&self, property: &Property) -> bool {
        if let Some(place) = &self.place {
            if !property.place.to_lowercase().contains(place.as_str()) {
                return false;
            }
        }

        let area = i64::from(property.area);
        self.area_min.map_or(true, |min| area >= min)
            && self.area_max.map_or(true, |max| area <= max)
            && self
                .bedrooms
                .map_or(true, |wanted| i64::from(property.bedrooms) == wanted)
            && self
                .bathrooms
                .map_or(true, |wanted| i64::from(property.bathrooms) == wanted)
    }

    /// Keep the matching candidates in their original order.
    pub fn apply(&self, mut candidates: Vec<Property>) -> Vec<Property> {
        candidates.retain(|property| self.matches(property));
        candidates
    }
}

/// Filter `candidates` by `criteria`. The result is an order-preserving subsequence.
pub fn apply(candidates: Vec<Property>, criteria: &SearchCriteria) -> Vec<Property> {
    PropertyFilter::from_criteria(criteria).apply(candidates)
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_number(
    field: &'static str,
    raw: &Option<String>,
) -> Result<Option<i64>, UnparsableFilterValue> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| UnparsableFilterValue {
                field,
                value: value.to_string(),
            }),
    }
}
