#![no_main]
use libfuzzer_sys::fuzz_target;
use clipper_fare_core::parse_trip_hash;

fuzz_target!(|data: &str| {
    let Ok(request) = parse_trip_hash(data) else {
        return;
    };
    let hash = request.to_hash();
    let reparsed = parse_trip_hash(&hash).expect("generated hash parses");
    assert_eq!(reparsed.category, request.category);
    assert_eq!(reparsed.legs.len(), request.legs.len());
});
