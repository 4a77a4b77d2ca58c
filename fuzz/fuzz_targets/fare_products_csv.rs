#![no_main]
use libfuzzer_sys::fuzz_target;
use clipper_fare_core::{read_csv_with_notices, CsvTable, NoticeContainer};
use clipper_fare_model::{FareProduct, FareTransferRule};

fuzz_target!(|data: &[u8]| {
    let mut notices = NoticeContainer::new();
    let _: Result<CsvTable<FareProduct>, _> =
        read_csv_with_notices(data, "fare_products.txt", &mut notices);
    let _: Result<CsvTable<FareTransferRule>, _> =
        read_csv_with_notices(data, "fare_transfer_rules.txt", &mut notices);
});
