use std::path::PathBuf;

use clipper_fare_model::AgencyId;

use crate::csv_reader::CsvParseError;

/// Failure to read the reference data files.
#[derive(Debug, thiserror::Error)]
pub enum FareInputError {
    #[error("input path does not exist: {0}")]
    MissingPath(PathBuf),
    #[error("input path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("missing required file: {0}")]
    MissingFile(String),
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] CsvParseError),
    #[error("malformed xml in {file}: {message}")]
    Xml { file: String, message: String },
}

/// Failure to price a trip. Any of these aborts the whole computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FareError {
    #[error("no fare found for leg {} on {agency_id} (tried {})", .leg_index + 1, .product_ids.join(", "))]
    FareNotFound {
        leg_index: usize,
        agency_id: AgencyId,
        product_ids: Vec<String>,
    },
    #[error("leg {} on {agency_id} needs an origin and a destination", .leg_index + 1)]
    MissingQualifiers { leg_index: usize, agency_id: AgencyId },
    #[error("could not resolve agency: {input:?}")]
    AgencyNotResolved { input: String },
}

impl FareError {
    pub fn leg_index(&self) -> Option<usize> {
        match self {
            FareError::FareNotFound { leg_index, .. }
            | FareError::MissingQualifiers { leg_index, .. } => Some(*leg_index),
            FareError::AgencyNotResolved { .. } => None,
        }
    }
}
