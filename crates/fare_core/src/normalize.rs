use std::collections::HashSet;

use clipper_fare_model::{
    FareProduct, RiderCategory, COMBINED_SMD_YOUTH_CATEGORY_CODE, LEGACY_YOUTH_CATEGORY_CODE,
};

use crate::feed::FARE_PRODUCTS_FILE;
use crate::notice::{
    NOTICE_CODE_CATEGORY_NORMALIZED, NOTICE_CODE_CATEGORY_SPLIT, NOTICE_CODE_UNKNOWN_CATEGORY,
};
use crate::{CsvTable, FareNotice, NoticeContainer, NoticeSeverity};

/// Folds operator-specific rider category codes into the canonical set.
///
/// `youth-2` rows are relabelled `youth` in place. Each `smdy` row becomes
/// `smd` in place and a `youth` copy is appended to the end of the table, so
/// the relative order of the original rows is unchanged.
pub fn normalize_rider_categories(
    fare_products: &mut CsvTable<FareProduct>,
    notices: &mut NoticeContainer,
) {
    let mut appended = Vec::new();
    let mut unknown_codes = HashSet::new();

    for index in 0..fare_products.rows.len() {
        let row_number = fare_products.row_number(index);
        let product = &mut fare_products.rows[index];
        let Some(code) = product.rider_category_id.as_deref() else {
            continue;
        };

        if code == LEGACY_YOUTH_CATEGORY_CODE {
            product.rider_category_id = Some(RiderCategory::Youth.as_str().to_string());
            notices.push(category_notice(
                NOTICE_CODE_CATEGORY_NORMALIZED,
                "rider category folded into youth",
                row_number,
                &product.fare_product_id,
            ));
        } else if code == COMBINED_SMD_YOUTH_CATEGORY_CODE {
            product.rider_category_id = Some(RiderCategory::SeniorDisabled.as_str().to_string());
            let mut youth = product.clone();
            youth.rider_category_id = Some(RiderCategory::Youth.as_str().to_string());
            notices.push(category_notice(
                NOTICE_CODE_CATEGORY_SPLIT,
                "rider category split into smd and youth",
                row_number,
                &product.fare_product_id,
            ));
            appended.push((youth, row_number));
        } else if code.parse::<RiderCategory>().is_err() && unknown_codes.insert(code.to_string()) {
            notices.push(
                FareNotice::new(
                    NOTICE_CODE_UNKNOWN_CATEGORY,
                    NoticeSeverity::Warning,
                    "fare product uses an unknown rider category",
                )
                .with_location(FARE_PRODUCTS_FILE, row_number)
                .with_context_field("riderCategoryId", code),
            );
        }
    }

    for (product, row_number) in appended {
        fare_products.push(product, row_number);
    }
}

fn category_notice(code: &str, message: &str, row_number: u64, product_id: &str) -> FareNotice {
    FareNotice::new(code, NoticeSeverity::Info, message)
        .with_location(FARE_PRODUCTS_FILE, row_number)
        .with_context_field("fareProductId", product_id)
}
