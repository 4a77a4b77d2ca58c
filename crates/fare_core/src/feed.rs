use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use clipper_fare_model::{Agency, FareProduct, FareTransferRule, Stop};

use crate::agency::{AgencyGroups, AgencyRegistry};
use crate::csv_reader::read_csv_with_notices;
use crate::fare_shape::FareShapes;
use crate::normalize::normalize_rider_categories;
use crate::notice::{
    NOTICE_CODE_DUPLICATE_TRANSFER_RULE, NOTICE_CODE_UNKNOWN_TRANSFER_PRODUCT,
    NOTICE_CODE_UNSUPPORTED_MEDIA,
};
use crate::operators_xml::parse_operators_xml;
use crate::{
    CsvTable, FareDataInput, FareInputError, FareNotice, FarePolicy, NoticeContainer,
    NoticeSeverity,
};

pub const FARE_PRODUCTS_FILE: &str = "fare_products.txt";
pub const FARE_TRANSFER_RULES_FILE: &str = "fare_transfer_rules.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const OPERATORS_FILE: &str = "gtfsoperators.xml";

pub const REFERENCE_FILE_NAMES: &[&str] = &[
    FARE_PRODUCTS_FILE,
    FARE_TRANSFER_RULES_FILE,
    STOPS_FILE,
    OPERATORS_FILE,
];

/// The loaded, normalized reference tables. Built once and then only read.
#[derive(Debug, Clone, Default)]
pub struct FareData {
    pub fare_products: CsvTable<FareProduct>,
    pub fare_transfer_rules: CsvTable<FareTransferRule>,
    pub agencies: AgencyRegistry,
    pub fare_shapes: FareShapes,
    pub agency_groups: AgencyGroups,
    product_index: FxHashMap<String, Vec<usize>>,
}

impl FareData {
    pub fn from_input(input: &FareDataInput, policy: &FarePolicy) -> Result<Self, FareInputError> {
        let mut notices = NoticeContainer::new();
        Self::from_input_with_notices(input, policy, &mut notices)
    }

    pub fn from_input_with_notices(
        input: &FareDataInput,
        policy: &FarePolicy,
        notices: &mut NoticeContainer,
    ) -> Result<Self, FareInputError> {
        let fare_products = read_required_csv(input, FARE_PRODUCTS_FILE, notices)?;
        let fare_transfer_rules = read_required_csv(input, FARE_TRANSFER_RULES_FILE, notices)?;

        let stops: CsvTable<Stop> = match input.read_optional_file(STOPS_FILE)? {
            Some(data) => read_csv_with_notices(&data, STOPS_FILE, notices)?,
            None => {
                notices.push_missing_optional_file(STOPS_FILE);
                CsvTable::default()
            }
        };

        let agencies = match input.read_optional_file(OPERATORS_FILE)? {
            Some(data) => parse_operators_xml(&data).map_err(|err| FareInputError::Xml {
                file: OPERATORS_FILE.to_string(),
                message: err.to_string(),
            })?,
            None => {
                notices.push_missing_optional_file(OPERATORS_FILE);
                Vec::new()
            }
        };

        Ok(Self::from_tables(
            fare_products,
            fare_transfer_rules,
            agencies,
            &stops.rows,
            policy,
            notices,
        ))
    }

    /// Assembles the context from already-parsed tables. Rider category
    /// normalization runs here, so `fare_products` must be the raw table.
    /// The policy only decides which fare medium the table checks expect.
    pub fn from_tables(
        mut fare_products: CsvTable<FareProduct>,
        fare_transfer_rules: CsvTable<FareTransferRule>,
        agencies: Vec<Agency>,
        stops: &[Stop],
        policy: &FarePolicy,
        notices: &mut NoticeContainer,
    ) -> Self {
        normalize_rider_categories(&mut fare_products, notices);

        let agencies = AgencyRegistry::new(agencies);
        let agency_groups = AgencyGroups::from_registry(&agencies);
        let fare_shapes = FareShapes::bay_area(stops);

        let mut product_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (index, product) in fare_products.rows.iter().enumerate() {
            product_index
                .entry(product.fare_product_id.clone())
                .or_default()
                .push(index);
        }

        let data = Self {
            fare_products,
            fare_transfer_rules,
            agencies,
            fare_shapes,
            agency_groups,
            product_index,
        };
        data.check_unsupported_media(&policy.fare_media_id, notices);
        data.check_transfer_rules(notices);

        let registry_generated = data
            .agencies
            .last_generated()
            .map(|generated| generated.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            fare_products = data.fare_products.len(),
            fare_transfer_rules = data.fare_transfer_rules.len(),
            agencies = data.agencies.len(),
            stations = stops.len(),
            registry_generated = %registry_generated,
            "loaded fare reference data"
        );
        data
    }

    /// Fare product rows with the given id, in table order.
    pub fn products_with_id<'a>(
        &'a self,
        fare_product_id: &str,
    ) -> impl Iterator<Item = &'a FareProduct> + 'a {
        self.product_index
            .get(fare_product_id)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.fare_products.rows[index])
    }

    /// The earliest row, in table order, among rows with any of the given
    /// ids that pass `filter`.
    pub fn first_product<F>(&self, fare_product_ids: &[String], filter: F) -> Option<&FareProduct>
    where
        F: Fn(&FareProduct) -> bool,
    {
        fare_product_ids
            .iter()
            .filter_map(|id| self.product_index.get(id.as_str()))
            .filter_map(|indices| {
                indices
                    .iter()
                    .copied()
                    .find(|&index| filter(&self.fare_products.rows[index]))
            })
            .min()
            .map(|index| &self.fare_products.rows[index])
    }

    pub fn has_product(&self, fare_product_id: &str) -> bool {
        self.product_index.contains_key(fare_product_id)
    }

    fn check_unsupported_media(&self, fare_media_id: &str, notices: &mut NoticeContainer) {
        // media id -> (first row, row count)
        let mut unsupported: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
        for (index, product) in self.fare_products.rows.iter().enumerate() {
            if product.is_sold_on(fare_media_id) {
                continue;
            }
            let media = product.fare_media_id.as_deref().unwrap_or_default();
            let entry = unsupported
                .entry(media)
                .or_insert((self.fare_products.row_number(index), 0));
            entry.1 += 1;
        }

        for (media, (first_row, count)) in unsupported {
            notices.push(
                FareNotice::new(
                    NOTICE_CODE_UNSUPPORTED_MEDIA,
                    NoticeSeverity::Info,
                    format!("fare products not sold on {}", fare_media_id),
                )
                .with_location(FARE_PRODUCTS_FILE, first_row)
                .with_context_field("fareMediaId", media)
                .with_context_field("rowCount", count),
            );
        }
    }

    fn check_transfer_rules(&self, notices: &mut NoticeContainer) {
        let mut first_rule_rows: FxHashMap<(&str, &str), u64> = FxHashMap::default();
        let mut reported_products = FxHashSet::default();

        for (index, rule) in self.fare_transfer_rules.rows.iter().enumerate() {
            let row_number = self.fare_transfer_rules.row_number(index);

            if let Some(product_id) = rule.fare_product_id.as_deref() {
                if !self.has_product(product_id) && reported_products.insert(product_id) {
                    notices.push(
                        FareNotice::new(
                            NOTICE_CODE_UNKNOWN_TRANSFER_PRODUCT,
                            NoticeSeverity::Warning,
                            "transfer rule references a missing fare product",
                        )
                        .with_location(FARE_TRANSFER_RULES_FILE, row_number)
                        .with_context_field("fareProductId", product_id),
                    );
                }
            }

            let (Some(from), Some(to)) = (
                rule.from_leg_group_id.as_deref(),
                rule.to_leg_group_id.as_deref(),
            ) else {
                continue;
            };
            match first_rule_rows.get(&(from, to)) {
                Some(&shadowing_row) => notices.push(
                    FareNotice::new(
                        NOTICE_CODE_DUPLICATE_TRANSFER_RULE,
                        NoticeSeverity::Info,
                        "transfer rule is shadowed by an earlier rule for the same pair",
                    )
                    .with_location(FARE_TRANSFER_RULES_FILE, row_number)
                    .with_context_field("fromLegGroupId", from)
                    .with_context_field("toLegGroupId", to)
                    .with_context_field("shadowedByRow", shadowing_row),
                ),
                None => {
                    first_rule_rows.insert((from, to), row_number);
                }
            }
        }
    }
}

fn read_required_csv<T>(
    input: &FareDataInput,
    file: &str,
    notices: &mut NoticeContainer,
) -> Result<CsvTable<T>, FareInputError>
where
    T: serde::de::DeserializeOwned,
{
    let data = input.read_required_file(file).inspect_err(|err| {
        if let FareInputError::MissingFile(name) = err {
            notices.push_missing_file(name.as_str());
        }
    })?;
    Ok(read_csv_with_notices(&data, file, notices)?)
}
