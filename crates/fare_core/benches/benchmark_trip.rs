use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clipper_fare_core::model::{FareProduct, FareTransferRule, RiderCategory, Stop};
use clipper_fare_core::{
    compute_trip, CsvTable, FareData, FarePolicy, NoticeContainer, TripLegInput,
};

const AGENCY_COUNT: usize = 40;
const STATION_COUNT: usize = 50;

fn product(id: String, category: RiderCategory, amount: f64) -> FareProduct {
    FareProduct {
        fare_product_id: id,
        amount,
        rider_category_id: Some(category.as_str().to_string()),
        fare_media_id: Some("clipper".to_string()),
        ..Default::default()
    }
}

fn generate_fare_data() -> FareData {
    let mut products = Vec::new();
    let mut rules = Vec::new();

    for agency in 0..AGENCY_COUNT {
        for category in RiderCategory::ALL {
            products.push(product(
                format!("A{agency}:local:single"),
                category,
                2.0 + agency as f64 * 0.05,
            ));
            products.push(product(format!("A{agency}:transfer"), category, -0.5));
        }
        for other in 0..AGENCY_COUNT {
            rules.push(FareTransferRule {
                from_leg_group_id: Some(format!("A{agency}")),
                to_leg_group_id: Some(format!("A{other}")),
                fare_product_id: Some(format!("A{other}:transfer")),
                ..Default::default()
            });
        }
    }

    let stops: Vec<Stop> = (0..STATION_COUNT)
        .map(|station| Stop {
            stop_id: format!("S{station}"),
            stop_name: format!("Station {station}"),
        })
        .collect();
    for from in 0..STATION_COUNT {
        for to in from..STATION_COUNT {
            products.push(product(
                format!("BA:matrix:S{from}-S{to}"),
                RiderCategory::Adult,
                2.2 + (to - from) as f64 * 0.1,
            ));
        }
    }

    FareData::from_tables(
        CsvTable::from_rows(products),
        CsvTable::from_rows(rules),
        Vec::new(),
        &stops,
        &FarePolicy::default(),
        &mut NoticeContainer::new(),
    )
}

fn benchmark_trip(c: &mut Criterion) {
    let data = generate_fare_data();
    let policy = FarePolicy::default();
    let legs = vec![
        TripLegInput::flat("A3"),
        TripLegInput::matrix("BA", "S40", "S2"),
        TripLegInput::flat("A17"),
        TripLegInput::flat("A17"),
        TripLegInput::flat("A39"),
    ];

    c.bench_function("compute_trip_five_legs", |b| {
        b.iter(|| {
            compute_trip(
                black_box(&data),
                black_box(&policy),
                black_box(&legs),
                RiderCategory::Adult,
            )
        })
    });
}

criterion_group!(benches, benchmark_trip);
criterion_main!(benches);
