use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identifier of a transit operator, or of a fare-relevant variant of one
/// (`GF:LSSF`, `AC:transbay`).
pub type AgencyId = CompactString;

/// The only fare medium priced by the calculator.
pub const CLIPPER_FARE_MEDIA_ID: &str = "clipper";

/// Legacy youth category code folded into [`RiderCategory::Youth`] at load time.
pub const LEGACY_YOUTH_CATEGORY_CODE: &str = "youth-2";

/// Combined senior/disabled/youth code split into two rows at load time.
pub const COMBINED_SMD_YOUTH_CATEGORY_CODE: &str = "smdy";

const LAST_GENERATED_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

#[derive(Debug, thiserror::Error)]
pub enum FareParseError {
    #[error("unknown rider category: {0}")]
    UnknownRiderCategory(String),
    #[error("invalid trip hash: {0}")]
    InvalidTripHash(String),
    #[error("invalid trip leg: {0}")]
    InvalidLeg(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum RiderCategory {
    #[default]
    #[serde(rename = "adult")]
    Adult,
    #[serde(rename = "youth")]
    Youth,
    /// Seniors and riders with disabilities (`smd`).
    #[serde(rename = "smd")]
    SeniorDisabled,
}

impl RiderCategory {
    pub const ALL: [RiderCategory; 3] = [
        RiderCategory::Adult,
        RiderCategory::Youth,
        RiderCategory::SeniorDisabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiderCategory::Adult => "adult",
            RiderCategory::Youth => "youth",
            RiderCategory::SeniorDisabled => "smd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiderCategory::Adult => "Adult",
            RiderCategory::Youth => "Youth",
            RiderCategory::SeniorDisabled => "Senior / Disabled",
        }
    }
}

impl fmt::Display for RiderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiderCategory {
    type Err = FareParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "adult" => Ok(RiderCategory::Adult),
            "youth" => Ok(RiderCategory::Youth),
            "smd" => Ok(RiderCategory::SeniorDisabled),
            other => Err(FareParseError::UnknownRiderCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DurationLimitType {
    #[serde(rename = "0")]
    DepartureToArrival,
    #[serde(rename = "1")]
    DepartureToDeparture,
    #[serde(rename = "2")]
    ArrivalToDeparture,
    #[serde(rename = "3")]
    ArrivalToArrival,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum FareTransferType {
    #[serde(rename = "0")]
    APlusAb,
    #[serde(rename = "1")]
    APlusAbPlusB,
    #[serde(rename = "2")]
    Ab,
    #[serde(other)]
    Other,
}

/// One row of `fare_products.txt`.
///
/// `amount` is signed: flat and matrix fares are positive, while transfer
/// products referenced from `fare_transfer_rules.txt` are either a negative
/// credit or a positive replacement fare.
#[derive(Debug, Clone, Deserialize)]
pub struct FareProduct {
    pub fare_product_id: String,
    pub fare_product_name: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub duration_start: Option<String>,
    pub duration_amount: Option<String>,
    pub duration_unit: Option<String>,
    pub duration_type: Option<String>,
    pub rider_category_id: Option<String>,
    pub fare_media_id: Option<String>,
}

impl FareProduct {
    pub fn is_sold_on(&self, fare_media_id: &str) -> bool {
        self.fare_media_id.as_deref() == Some(fare_media_id)
    }

    pub fn is_for_category(&self, category: RiderCategory) -> bool {
        self.rider_category_id.as_deref() == Some(category.as_str())
    }
}

impl Default for FareProduct {
    fn default() -> Self {
        Self {
            fare_product_id: String::new(),
            fare_product_name: None,
            amount: 0.0,
            currency: "USD".to_string(),
            duration_start: None,
            duration_amount: None,
            duration_unit: None,
            duration_type: None,
            rider_category_id: None,
            fare_media_id: None,
        }
    }
}

/// One row of `fare_transfer_rules.txt`. Leg group ids are agency ids or
/// agency-group ids.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FareTransferRule {
    pub from_leg_group_id: Option<String>,
    pub to_leg_group_id: Option<String>,
    pub transfer_count: Option<i32>,
    pub duration_limit: Option<i32>,
    pub duration_limit_type: Option<DurationLimitType>,
    pub fare_transfer_type: Option<FareTransferType>,
    pub fare_product_id: Option<String>,
    pub filter_fare_product_id: Option<String>,
}

impl FareTransferRule {
    pub fn matches(&self, from_group: &str, to_group: &str) -> bool {
        self.from_leg_group_id.as_deref() == Some(from_group)
            && self.to_leg_group_id.as_deref() == Some(to_group)
    }
}

/// An operator record from the regional operator registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    /// Raw `LastGenerated` attribute, `MM/DD/YYYY hh:mm:ss AM`.
    pub last_generated: String,
}

impl Agency {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: AgencyId::from(id),
            name: name.to_string(),
            last_generated: String::new(),
        }
    }

    pub fn last_generated_at(&self) -> Option<NaiveDateTime> {
        let trimmed = self.last_generated.trim();
        if trimmed.is_empty() {
            return None;
        }
        NaiveDateTime::parse_from_str(trimmed, LAST_GENERATED_FORMAT).ok()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Stop {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rider_categories() {
        assert_eq!("adult".parse::<RiderCategory>().unwrap(), RiderCategory::Adult);
        assert_eq!(" youth ".parse::<RiderCategory>().unwrap(), RiderCategory::Youth);
        assert_eq!(
            "smd".parse::<RiderCategory>().unwrap(),
            RiderCategory::SeniorDisabled
        );
    }

    #[test]
    fn rejects_legacy_category_codes() {
        assert!(LEGACY_YOUTH_CATEGORY_CODE.parse::<RiderCategory>().is_err());
        assert!(COMBINED_SMD_YOUTH_CATEGORY_CODE
            .parse::<RiderCategory>()
            .is_err());
    }

    #[test]
    fn matches_clipper_products_by_category() {
        let product = FareProduct {
            fare_product_id: "SF:local:single".to_string(),
            amount: 2.5,
            rider_category_id: Some("youth".to_string()),
            fare_media_id: Some(CLIPPER_FARE_MEDIA_ID.to_string()),
            ..Default::default()
        };
        assert!(product.is_sold_on(CLIPPER_FARE_MEDIA_ID));
        assert!(!product.is_sold_on("cash"));
        assert!(product.is_for_category(RiderCategory::Youth));
        assert!(!product.is_for_category(RiderCategory::Adult));
    }

    #[test]
    fn matches_transfer_rule_pairs_in_order() {
        let rule = FareTransferRule {
            from_leg_group_id: Some("AC".to_string()),
            to_leg_group_id: Some("BA".to_string()),
            ..Default::default()
        };
        assert!(rule.matches("AC", "BA"));
        assert!(!rule.matches("BA", "AC"));
    }

    #[test]
    fn parses_registry_timestamp() {
        let agency = Agency {
            id: AgencyId::from("SF"),
            name: "San Francisco Municipal Transportation Agency".to_string(),
            last_generated: "12/03/2024 09:01:05 AM".to_string(),
        };
        let generated = agency.last_generated_at().unwrap();
        assert_eq!(generated.to_string(), "2024-12-03 09:01:05");
        assert!(Agency::new("AC:transbay", "AC Transit - Transbay")
            .last_generated_at()
            .is_none());
    }
}
