use clipper_fare_model::RiderCategory;

use crate::transfer::legacy_discount;
use crate::{FareData, FarePolicy, TripLeg};

/// Universal (Clipper 2.0) discount for boarding `agency_id` after the legs
/// in `history`, which are the already-priced legs of the trip in order.
///
/// Cross-agency transfers earn the category rate. Same-agency transfers keep
/// their legacy rule, except on agencies with a revised intra-agency policy:
/// those earn the category rate once, and nothing when the leg before the
/// previous one was on the same agency.
pub fn universal_discount(
    data: &FareData,
    policy: &FarePolicy,
    history: &[TripLeg],
    agency_id: &str,
    leg_fare: f64,
    category: RiderCategory,
) -> f64 {
    let Some(previous) = history.last() else {
        return 0.0;
    };

    if previous.agency_id != agency_id {
        return policy.rate_for(category, agency_id).min(leg_fare);
    }

    if !policy.has_revised_intra_agency(agency_id) {
        return legacy_discount(
            data,
            Some(previous.agency_id.as_str()),
            agency_id,
            leg_fare,
            category,
        );
    }

    let chained = history.len() >= 2 && history[history.len() - 2].agency_id == agency_id;
    if chained {
        0.0
    } else {
        policy.category_rate(category).min(leg_fare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvTable, NoticeContainer};
    use clipper_fare_model::{AgencyId, FareProduct, FareTransferRule};

    fn leg(agency_id: &str, fare: f64) -> TripLeg {
        TripLeg {
            agency_id: AgencyId::from(agency_id),
            fare_product_id: String::new(),
            fare_before_transfer: fare,
            clipper_1_discount: 0.0,
            clipper_2_discount: 0.0,
        }
    }

    fn data() -> FareData {
        FareData::from_tables(
            CsvTable::from_rows(vec![FareProduct {
                fare_product_id: "SF:transfer".to_string(),
                amount: -2.5,
                rider_category_id: Some("adult".to_string()),
                fare_media_id: Some("clipper".to_string()),
                ..Default::default()
            }]),
            CsvTable::from_rows(vec![FareTransferRule {
                from_leg_group_id: Some("SF".to_string()),
                to_leg_group_id: Some("SF".to_string()),
                fare_product_id: Some("SF:transfer".to_string()),
                ..Default::default()
            }]),
            Vec::new(),
            &[],
            &FarePolicy::default(),
            &mut NoticeContainer::new(),
        )
    }

    #[test]
    fn first_leg_has_no_discount() {
        let policy = FarePolicy::default();
        assert_eq!(
            universal_discount(&data(), &policy, &[], "BA", 5.0, RiderCategory::Adult),
            0.0
        );
    }

    #[test]
    fn cross_agency_uses_rate_capped_at_fare() {
        let data = data();
        let policy = FarePolicy::default();
        let history = [leg("AC", 2.5)];

        assert_eq!(
            universal_discount(&data, &policy, &history, "BA", 5.0, RiderCategory::Adult),
            2.85
        );
        assert_eq!(
            universal_discount(&data, &policy, &history, "SF", 2.5, RiderCategory::Adult),
            2.5
        );
        assert_eq!(
            universal_discount(
                &data,
                &policy,
                &history,
                "BA",
                5.0,
                RiderCategory::SeniorDisabled
            ),
            1.10
        );
        assert_eq!(
            universal_discount(&data, &policy, &history, "SF", 5.0, RiderCategory::Youth),
            1.40
        );
    }

    #[test]
    fn same_agency_keeps_legacy_rule() {
        let data = data();
        let policy = FarePolicy::default();
        let history = [leg("SF", 2.5)];
        assert_eq!(
            universal_discount(&data, &policy, &history, "SF", 2.5, RiderCategory::Adult),
            2.5
        );
        let history = [leg("BA", 3.0)];
        assert_eq!(
            universal_discount(&data, &policy, &history, "BA", 3.0, RiderCategory::Adult),
            0.0
        );
    }

    #[test]
    fn revised_agency_grants_one_intra_agency_credit() {
        let data = data();
        let policy = FarePolicy::default();
        let adult = RiderCategory::Adult;

        let second = universal_discount(&data, &policy, &[leg("AC", 2.5)], "AC", 2.5, adult);
        assert_eq!(second, 2.5);

        let history = [leg("AC", 2.5), leg("AC", 2.5)];
        assert_eq!(
            universal_discount(&data, &policy, &history, "AC", 2.5, adult),
            0.0
        );

        let history = [leg("SF", 2.5), leg("AC", 2.5)];
        assert_eq!(
            universal_discount(&data, &policy, &history, "AC", 2.5, RiderCategory::Youth),
            1.40
        );
    }
}
