use serde::Serialize;
use tracing::{debug, warn};

use clipper_fare_model::{AgencyId, RiderCategory};

use crate::lookup::{resolve_base_fare, TripLegInput};
use crate::transfer::legacy_discount;
use crate::universal::universal_discount;
use crate::{FareData, FareError, FarePolicy};

/// One priced leg of a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripLeg {
    pub agency_id: AgencyId,
    pub fare_product_id: String,
    pub fare_before_transfer: f64,
    pub clipper_1_discount: f64,
    pub clipper_2_discount: f64,
}

impl TripLeg {
    pub fn clipper_1_fare(&self) -> f64 {
        self.fare_before_transfer - self.clipper_1_discount
    }

    pub fn clipper_2_fare(&self) -> f64 {
        self.fare_before_transfer - self.clipper_2_discount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripResult {
    pub category: RiderCategory,
    pub legs: Vec<TripLeg>,
    pub total_clipper_1: f64,
    pub total_clipper_2: f64,
}

impl TripResult {
    /// What the rider saves per trip under the universal policy. Negative
    /// when the legacy policy is cheaper.
    pub fn savings(&self) -> f64 {
        self.total_clipper_1 - self.total_clipper_2
    }

    pub fn annual_savings(&self, trips_per_year: u32) -> f64 {
        self.savings() * f64::from(trips_per_year)
    }
}

/// Prices every leg in order under both policies. The first leg that cannot
/// be priced aborts the whole trip.
pub fn compute_trip(
    data: &FareData,
    policy: &FarePolicy,
    legs: &[TripLegInput],
    category: RiderCategory,
) -> Result<TripResult, FareError> {
    let mut priced: Vec<TripLeg> = Vec::with_capacity(legs.len());

    for (leg_index, input) in legs.iter().enumerate() {
        let agency_id = input.agency_id.as_str();
        let fare = resolve_base_fare(data, policy, input, category).map_err(|err| {
            let err = err.into_fare_error(leg_index, agency_id);
            warn!(leg = leg_index + 1, agency = agency_id, %category, "{}", err);
            err
        })?;
        let leg_fare = fare.amount;

        let previous_agency = priced.last().map(|leg| leg.agency_id.as_str());
        let clipper_1_discount = clamp_discount(
            legacy_discount(data, previous_agency, agency_id, leg_fare, category),
            leg_fare,
        );
        let clipper_2_discount = clamp_discount(
            universal_discount(data, policy, &priced, agency_id, leg_fare, category),
            leg_fare,
        );

        debug!(
            leg = leg_index + 1,
            agency = agency_id,
            fare_product_id = %fare.fare_product_id,
            fare = leg_fare,
            clipper_1_discount,
            clipper_2_discount,
            "priced leg"
        );
        priced.push(TripLeg {
            agency_id: input.agency_id.clone(),
            fare_product_id: fare.fare_product_id,
            fare_before_transfer: leg_fare,
            clipper_1_discount,
            clipper_2_discount,
        });
    }

    let total_clipper_1 = priced.iter().map(TripLeg::clipper_1_fare).sum();
    let total_clipper_2 = priced.iter().map(TripLeg::clipper_2_fare).sum();
    Ok(TripResult {
        category,
        legs: priced,
        total_clipper_1,
        total_clipper_2,
    })
}

fn clamp_discount(discount: f64, leg_fare: f64) -> f64 {
    discount.min(leg_fare).max(0.0)
}
