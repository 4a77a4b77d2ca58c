use tracing::debug;

use clipper_fare_model::{FareProduct, FareTransferRule, RiderCategory};

use crate::FareData;

/// How a transfer product's amount applies to the leg it discounts.
///
/// The rule table mixes two conventions: a negative amount is a credit off
/// the leg fare, anything else is the total price of the leg after the
/// transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferCredit {
    Credit(f64),
    ReplacementFare(f64),
}

impl TransferCredit {
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            TransferCredit::Credit(-amount)
        } else {
            TransferCredit::ReplacementFare(amount)
        }
    }

    /// The discount this credit gives on a leg priced `leg_fare`. Never
    /// negative; the caller caps it at the leg fare.
    pub fn discount_for(&self, leg_fare: f64) -> f64 {
        match *self {
            TransferCredit::Credit(credit) => credit,
            TransferCredit::ReplacementFare(fare) => (leg_fare - fare).max(0.0),
        }
    }
}

/// First rule, in table order, for the ordered group pair.
pub fn find_transfer_rule<'a>(
    data: &'a FareData,
    from_group: &str,
    to_group: &str,
) -> Option<&'a FareTransferRule> {
    let mut matches = data
        .fare_transfer_rules
        .rows
        .iter()
        .filter(|rule| rule.matches(from_group, to_group));
    let first = matches.next()?;
    let shadowed = matches.count();
    if shadowed > 0 {
        debug!(
            from = from_group,
            to = to_group,
            shadowed,
            "several transfer rules match; using the first"
        );
    }
    Some(first)
}

/// The transfer product row for a rule: the rider category's row when there
/// is one, else the first row with that id.
pub fn transfer_product<'a>(
    data: &'a FareData,
    rule: &FareTransferRule,
    category: RiderCategory,
) -> Option<&'a FareProduct> {
    let product_id = rule.fare_product_id.as_deref()?;
    data.products_with_id(product_id)
        .find(|product| product.is_for_category(category))
        .or_else(|| data.products_with_id(product_id).next())
}

/// Legacy (Clipper 1) discount for boarding `to_agency` after `from_agency`.
/// Route variants are collapsed to their operator before the rule lookup.
pub fn legacy_discount(
    data: &FareData,
    from_agency: Option<&str>,
    to_agency: &str,
    leg_fare: f64,
    category: RiderCategory,
) -> f64 {
    let Some(from_agency) = from_agency else {
        return 0.0;
    };
    let from_group = data.agency_groups.group_of(from_agency);
    let to_group = data.agency_groups.group_of(to_agency);

    let Some(rule) = find_transfer_rule(data, from_group, to_group) else {
        return 0.0;
    };
    let Some(product) = transfer_product(data, rule, category) else {
        debug!(
            from = from_group,
            to = to_group,
            fare_product_id = rule.fare_product_id.as_deref().unwrap_or_default(),
            "transfer rule product not found"
        );
        return 0.0;
    };

    let credit = TransferCredit::from_amount(product.amount);
    debug!(
        from = from_group,
        to = to_group,
        fare_product_id = %product.fare_product_id,
        ?credit,
        "matched transfer rule"
    );
    credit.discount_for(leg_fare)
}
