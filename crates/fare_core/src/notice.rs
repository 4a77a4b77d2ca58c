use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::csv_reader::CsvParseError;

pub const NOTICE_CODE_CSV_PARSE_ERROR: &str = "csv_parsing_failed";
pub const NOTICE_CODE_MISSING_FILE: &str = "missing_required_file";
pub const NOTICE_CODE_MISSING_OPTIONAL_FILE: &str = "missing_optional_file";
pub const NOTICE_CODE_UNSUPPORTED_MEDIA: &str = "fare_product_unsupported_media";
pub const NOTICE_CODE_CATEGORY_NORMALIZED: &str = "rider_category_normalized";
pub const NOTICE_CODE_CATEGORY_SPLIT: &str = "rider_category_split";
pub const NOTICE_CODE_UNKNOWN_CATEGORY: &str = "unknown_rider_category";
pub const NOTICE_CODE_UNKNOWN_TRANSFER_PRODUCT: &str = "transfer_rule_unknown_product";
pub const NOTICE_CODE_DUPLICATE_TRANSFER_RULE: &str = "duplicate_transfer_rule";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Error,
    Warning,
    Info,
}

/// A data-quality finding raised while loading reference tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareNotice {
    pub code: String,
    pub severity: NoticeSeverity,
    pub message: String,
    pub file: Option<String>,
    pub row: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

impl FareNotice {
    pub fn new(
        code: impl Into<String>,
        severity: NoticeSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            file: None,
            row: None,
            context: BTreeMap::new(),
        }
    }

    pub fn from_csv_error(error: &CsvParseError) -> Self {
        let mut notice = FareNotice::new(
            NOTICE_CODE_CSV_PARSE_ERROR,
            NoticeSeverity::Error,
            error.message.clone(),
        );
        notice.file = Some(error.file.clone());
        notice.row = error.line_index;
        notice.insert_context_field("columnIndex", error.column_index.unwrap_or_default());
        notice.insert_context_field(
            "parsedContent",
            error.parsed_content.clone().unwrap_or_default(),
        );
        notice
    }

    pub fn missing_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = FareNotice::new(
            NOTICE_CODE_MISSING_FILE,
            NoticeSeverity::Error,
            "missing required reference file",
        );
        notice.insert_context_field("filename", &file);
        notice.file = Some(file);
        notice
    }

    pub fn missing_optional_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = FareNotice::new(
            NOTICE_CODE_MISSING_OPTIONAL_FILE,
            NoticeSeverity::Warning,
            "missing optional reference file",
        );
        notice.insert_context_field("filename", &file);
        notice.file = Some(file);
        notice
    }

    pub fn insert_context_field<V: Serialize>(&mut self, name: impl Into<String>, value: V) {
        let serialized = serde_json::to_value(value).unwrap_or(Value::Null);
        self.context.insert(name.into(), serialized);
    }

    pub fn with_context_field<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert_context_field(name, value);
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, row: u64) -> Self {
        self.file = Some(file.into());
        self.row = Some(row);
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct NoticeContainer {
    notices: Vec<FareNotice>,
}

impl NoticeContainer {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    pub fn push(&mut self, notice: FareNotice) {
        self.notices.push(notice);
    }

    pub fn push_csv_error(&mut self, error: &CsvParseError) {
        self.notices.push(FareNotice::from_csv_error(error));
    }

    pub fn push_missing_file(&mut self, file: impl Into<String>) {
        self.notices.push(FareNotice::missing_file(file));
    }

    pub fn push_missing_optional_file(&mut self, file: impl Into<String>) {
        self.notices.push(FareNotice::missing_optional_file(file));
    }

    pub fn iter(&self) -> impl Iterator<Item = &FareNotice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn count_with_severity(&self, severity: NoticeSeverity) -> usize {
        self.notices
            .iter()
            .filter(|notice| notice.severity == severity)
            .count()
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(&self.notices)
        } else {
            serde_json::to_string(&self.notices)
        }
    }
}
