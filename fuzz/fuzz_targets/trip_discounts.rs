#![no_main]
use libfuzzer_sys::fuzz_target;
use clipper_fare_core::{
    compute_trip, CsvTable, FareData, FarePolicy, NoticeContainer, TripLegInput,
};
use clipper_fare_model::{Agency, FareProduct, FareTransferRule, RiderCategory};
use arbitrary::Arbitrary;

const AGENCIES: [&str; 6] = ["AC", "SF", "BA", "GF:LSSF", "GF:SSSF", "SB:VJO"];

#[derive(Debug, Arbitrary)]
struct FuzzData {
    fares: [u16; 6],
    rules: Vec<RuleData>,
    legs: Vec<u8>,
    category: u8,
}

#[derive(Debug, Arbitrary)]
struct RuleData {
    from: u8,
    to: u8,
    amount: i16,
}

fn agency(index: u8) -> &'static str {
    AGENCIES[index as usize % AGENCIES.len()]
}

fn group(agency_id: &str) -> &str {
    agency_id.split(':').next().unwrap_or(agency_id)
}

fuzz_target!(|data: FuzzData| {
    let category = RiderCategory::ALL[data.category as usize % RiderCategory::ALL.len()];
    let mut products = Vec::new();
    for (agency_id, cents) in AGENCIES.iter().zip(data.fares) {
        let id = if agency_id.contains(':') {
            format!("{agency_id}:single")
        } else {
            format!("{agency_id}:local:single")
        };
        products.push(FareProduct {
            fare_product_id: id,
            amount: f64::from(cents) / 100.0,
            rider_category_id: Some(category.as_str().to_string()),
            fare_media_id: Some("clipper".to_string()),
            ..Default::default()
        });
    }

    let mut rules = Vec::new();
    for (index, rule) in data.rules.iter().take(32).enumerate() {
        let product_id = format!("transfer:{index}");
        products.push(FareProduct {
            fare_product_id: product_id.clone(),
            amount: f64::from(rule.amount) / 100.0,
            rider_category_id: Some(category.as_str().to_string()),
            fare_media_id: Some("clipper".to_string()),
            ..Default::default()
        });
        rules.push(FareTransferRule {
            from_leg_group_id: Some(group(agency(rule.from)).to_string()),
            to_leg_group_id: Some(group(agency(rule.to)).to_string()),
            fare_product_id: Some(product_id),
            ..Default::default()
        });
    }

    let fare_data = FareData::from_tables(
        CsvTable::from_rows(products),
        CsvTable::from_rows(rules),
        AGENCIES.iter().map(|id| Agency::new(id, id)).collect(),
        &[],
        &FarePolicy::default(),
        &mut NoticeContainer::new(),
    );
    let legs: Vec<TripLegInput> = data
        .legs
        .iter()
        .take(16)
        .map(|&index| TripLegInput::flat(agency(index)))
        .filter(|leg| leg.agency_id != "BA")
        .collect();

    let result = compute_trip(&fare_data, &FarePolicy::default(), &legs, category)
        .expect("every flat agency is priced");
    assert_eq!(result.legs.len(), legs.len());
    for leg in &result.legs {
        let fare = leg.fare_before_transfer;
        assert!(leg.clipper_1_discount >= 0.0 && leg.clipper_1_discount <= fare);
        assert!(leg.clipper_2_discount >= 0.0 && leg.clipper_2_discount <= fare);
    }
});
