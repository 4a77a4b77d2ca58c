use serde::{Deserialize, Serialize};

use clipper_fare_model::{RiderCategory, CLIPPER_FARE_MEDIA_ID};

/// Per-category transfer credit under the universal (Clipper 2.0) policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniversalRates {
    pub adult: f64,
    pub youth: f64,
    pub senior_disabled: f64,
    /// Senior/disabled riders transferring onto the heavy-rail operator.
    pub senior_disabled_heavy_rail: f64,
}

impl Default for UniversalRates {
    fn default() -> Self {
        Self {
            adult: 2.85,
            youth: 1.40,
            senior_disabled: 1.40,
            senior_disabled_heavy_rail: 1.10,
        }
    }
}

/// Every tunable constant of the fare engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarePolicy {
    pub fare_media_id: String,
    pub universal_rates: UniversalRates,
    pub heavy_rail_agency: String,
    /// Agencies whose intra-agency transfers earn the universal credit
    /// instead of their legacy rule.
    pub revised_intra_agency: Vec<String>,
    pub annual_trips: u32,
}

impl Default for FarePolicy {
    fn default() -> Self {
        Self {
            fare_media_id: CLIPPER_FARE_MEDIA_ID.to_string(),
            universal_rates: UniversalRates::default(),
            heavy_rail_agency: "BA".to_string(),
            revised_intra_agency: vec!["AC".to_string()],
            annual_trips: 500,
        }
    }
}

impl FarePolicy {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The category's universal transfer credit, without destination overrides.
    pub fn category_rate(&self, category: RiderCategory) -> f64 {
        let rates = &self.universal_rates;
        match category {
            RiderCategory::Adult => rates.adult,
            RiderCategory::Youth => rates.youth,
            RiderCategory::SeniorDisabled => rates.senior_disabled,
        }
    }

    /// The credit for a transfer onto `to_agency`.
    pub fn rate_for(&self, category: RiderCategory, to_agency: &str) -> f64 {
        if category == RiderCategory::SeniorDisabled && to_agency == self.heavy_rail_agency {
            return self.universal_rates.senior_disabled_heavy_rail;
        }
        self.category_rate(category)
    }

    pub fn has_revised_intra_agency(&self, agency_id: &str) -> bool {
        self.revised_intra_agency
            .iter()
            .any(|candidate| candidate == agency_id)
    }
}
