use serde::{Deserialize, Serialize};

use clipper_fare_model::{AgencyId, FareProduct, RiderCategory};

use crate::fare_shape::FareShape;
use crate::{FareData, FareError, FarePolicy};

/// Origin and destination of a matrix-priced leg: zone ids or station ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegQualifiers {
    pub from: String,
    pub to: String,
}

impl LegQualifiers {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

/// One leg as entered by the rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripLegInput {
    pub agency_id: AgencyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<LegQualifiers>,
}

impl TripLegInput {
    pub fn flat(agency_id: &str) -> Self {
        Self {
            agency_id: AgencyId::from(agency_id),
            qualifiers: None,
        }
    }

    pub fn matrix(agency_id: &str, from: &str, to: &str) -> Self {
        Self {
            agency_id: AgencyId::from(agency_id),
            qualifiers: Some(LegQualifiers::new(from, to)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFare {
    pub fare_product_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    NotFound { product_ids: Vec<String> },
    MissingQualifiers,
}

impl LookupError {
    pub fn into_fare_error(self, leg_index: usize, agency_id: &str) -> FareError {
        let agency_id = AgencyId::from(agency_id);
        match self {
            LookupError::NotFound { product_ids } => FareError::FareNotFound {
                leg_index,
                agency_id,
                product_ids,
            },
            LookupError::MissingQualifiers => FareError::MissingQualifiers {
                leg_index,
                agency_id,
            },
        }
    }
}

/// `<agency>:local:single`, or `<agency>:single` for route-variant ids that
/// already carry a separator.
pub fn flat_product_id(agency_id: &str) -> String {
    if agency_id.contains(':') {
        format!("{}:single", agency_id)
    } else {
        format!("{}:local:single", agency_id)
    }
}

pub fn zonal_product_id(agency_id: &str, from: &str, to: &str) -> String {
    format!(
        "{agency}:matrix:{agency}:{from}-{agency}:{to}",
        agency = agency_id
    )
}

pub fn station_product_id(agency_id: &str, from: &str, to: &str) -> String {
    format!("{}:matrix:{}-{}", agency_id, from, to)
}

/// Product ids to try for a leg, in priority order. Matrix agencies yield
/// the forward and the reversed orientation.
pub fn candidate_product_ids(
    shape: &FareShape,
    leg: &TripLegInput,
) -> Result<Vec<String>, LookupError> {
    let agency_id = leg.agency_id.as_str();
    let build: fn(&str, &str, &str) -> String = match shape {
        FareShape::Flat => return Ok(vec![flat_product_id(agency_id)]),
        FareShape::ZonalMatrix(_) => zonal_product_id,
        FareShape::StationMatrix(_) => station_product_id,
    };

    let qualifiers = leg
        .qualifiers
        .as_ref()
        .filter(|q| !q.from.is_empty() && !q.to.is_empty())
        .ok_or(LookupError::MissingQualifiers)?;
    let forward = build(agency_id, &qualifiers.from, &qualifiers.to);
    let reversed = build(agency_id, &qualifiers.to, &qualifiers.from);
    if forward == reversed {
        Ok(vec![forward])
    } else {
        Ok(vec![forward, reversed])
    }
}

/// Finds the base fare of a leg for the rider category. Among rows of any
/// candidate id sold on the policy's fare medium for that category, the
/// one earliest in the table wins.
pub fn resolve_base_fare(
    data: &FareData,
    policy: &FarePolicy,
    leg: &TripLegInput,
    category: RiderCategory,
) -> Result<ResolvedFare, LookupError> {
    let shape = data.fare_shapes.shape_for(&leg.agency_id);
    let product_ids = candidate_product_ids(shape, leg)?;

    let is_priced = |product: &FareProduct| {
        product.is_sold_on(&policy.fare_media_id) && product.is_for_category(category)
    };

    data.first_product(&product_ids, is_priced)
        .map(|product| ResolvedFare {
            fare_product_id: product.fare_product_id.clone(),
            amount: product.amount,
        })
        .ok_or_else(|| {
            // Sorted so both orientations of a matrix leg report the same ids.
            let mut product_ids = product_ids;
            product_ids.sort_unstable();
            LookupError::NotFound { product_ids }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvTable, NoticeContainer};
    use clipper_fare_model::Stop;

    fn product(id: &str, category: &str, media: &str, amount: f64) -> FareProduct {
        FareProduct {
            fare_product_id: id.to_string(),
            amount,
            rider_category_id: Some(category.to_string()),
            fare_media_id: Some(media.to_string()),
            ..Default::default()
        }
    }

    fn data(products: Vec<FareProduct>) -> FareData {
        let stops = vec![
            Stop {
                stop_id: "12TH".to_string(),
                stop_name: "12th St. Oakland City Center".to_string(),
            },
            Stop {
                stop_id: "MONT".to_string(),
                stop_name: "Montgomery St.".to_string(),
            },
        ];
        FareData::from_tables(
            CsvTable::from_rows(products),
            CsvTable::default(),
            Vec::new(),
            &stops,
            &FarePolicy::default(),
            &mut NoticeContainer::new(),
        )
    }

    #[test]
    fn builds_flat_product_ids() {
        assert_eq!(flat_product_id("SF"), "SF:local:single");
        assert_eq!(flat_product_id("AC:transbay"), "AC:transbay:single");
        assert_eq!(flat_product_id("GF:LSSF"), "GF:LSSF:single");
    }

    #[test]
    fn builds_matrix_product_ids() {
        assert_eq!(
            zonal_product_id("CT", "zone1", "zone3"),
            "CT:matrix:CT:zone1-CT:zone3"
        );
        assert_eq!(
            station_product_id("BA", "12TH", "MONT"),
            "BA:matrix:12TH-MONT"
        );
    }

    #[test]
    fn resolves_flat_fare_for_category_and_media() {
        let data = data(vec![
            product("SF:local:single", "adult", "cash", 3.0),
            product("SF:local:single", "youth", "clipper", 1.25),
            product("SF:local:single", "adult", "clipper", 2.5),
        ]);
        let policy = FarePolicy::default();

        let fare = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::flat("SF"),
            RiderCategory::Adult,
        )
        .unwrap();
        assert_eq!(fare.amount, 2.5);
        assert_eq!(fare.fare_product_id, "SF:local:single");

        let missing = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::flat("SF"),
            RiderCategory::SeniorDisabled,
        );
        assert_eq!(
            missing,
            Err(LookupError::NotFound {
                product_ids: vec!["SF:local:single".to_string()]
            })
        );
    }

    #[test]
    fn zero_fare_is_resolved_not_missing() {
        let data = data(vec![product("SF:local:single", "youth", "clipper", 0.0)]);
        let fare = resolve_base_fare(
            &data,
            &FarePolicy::default(),
            &TripLegInput::flat("SF"),
            RiderCategory::Youth,
        )
        .unwrap();
        assert_eq!(fare.amount, 0.0);
    }

    #[test]
    fn matrix_lookup_accepts_either_orientation() {
        let data = data(vec![
            product("CT:matrix:CT:zone1-CT:zone3", "adult", "clipper", 6.4),
            product("BA:matrix:MONT-12TH", "adult", "clipper", 3.9),
        ]);
        let policy = FarePolicy::default();
        let adult = RiderCategory::Adult;

        let forward = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::matrix("CT", "zone1", "zone3"),
            adult,
        )
        .unwrap();
        let reversed = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::matrix("CT", "zone3", "zone1"),
            adult,
        )
        .unwrap();
        assert_eq!(forward, reversed);

        let bart = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::matrix("BA", "12TH", "MONT"),
            adult,
        )
        .unwrap();
        assert_eq!(bart.amount, 3.9);
    }

    #[test]
    fn missing_matrix_fare_is_reported_the_same_both_ways() {
        let data = data(vec![product("CT:matrix:CT:zone1-CT:zone3", "adult", "clipper", 6.4)]);
        let policy = FarePolicy::default();
        let smd = RiderCategory::SeniorDisabled;

        let forward = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::matrix("CT", "zone1", "zone3"),
            smd,
        );
        let reversed = resolve_base_fare(
            &data,
            &policy,
            &TripLegInput::matrix("CT", "zone3", "zone1"),
            smd,
        );
        assert_eq!(forward, reversed);
        assert_eq!(
            forward,
            Err(LookupError::NotFound {
                product_ids: vec![
                    "CT:matrix:CT:zone1-CT:zone3".to_string(),
                    "CT:matrix:CT:zone3-CT:zone1".to_string(),
                ]
            })
        );
    }

    #[test]
    fn earliest_row_wins_across_orientations() {
        let data = data(vec![
            product("GG:matrix:GG:East Bay-GG:San Francisco", "adult", "clipper", 5.0),
            product("GG:matrix:GG:San Francisco-GG:East Bay", "adult", "clipper", 7.0),
        ]);
        let fare = resolve_base_fare(
            &data,
            &FarePolicy::default(),
            &TripLegInput::matrix("GG", "San Francisco", "East Bay"),
            RiderCategory::Adult,
        )
        .unwrap();
        assert_eq!(fare.amount, 5.0);
    }

    #[test]
    fn matrix_leg_without_qualifiers_is_rejected() {
        let data = data(Vec::new());
        let result = resolve_base_fare(
            &data,
            &FarePolicy::default(),
            &TripLegInput::flat("BA"),
            RiderCategory::Adult,
        );
        assert_eq!(result, Err(LookupError::MissingQualifiers));
        assert!(matches!(
            LookupError::MissingQualifiers.into_fare_error(2, "BA"),
            FareError::MissingQualifiers { leg_index: 2, .. }
        ));
    }
}
