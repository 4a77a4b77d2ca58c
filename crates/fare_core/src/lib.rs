pub mod agency;
pub mod csv_reader;
pub mod error;
pub mod fare_shape;
pub mod feed;
pub mod input;
pub mod lookup;
pub mod normalize;
pub mod notice;
pub mod operators_xml;
pub mod policy;
pub mod report;
pub mod transfer;
pub mod trip;
pub mod trip_hash;
pub mod universal;

pub use agency::{AgencyGroups, AgencyRegistry};
pub use csv_reader::{read_csv_from_reader, read_csv_with_notices, CsvParseError, CsvTable};
pub use error::{FareError, FareInputError};
pub use fare_shape::{FareShape, FareShapes, QualifierTable};
pub use feed::{
    FareData, FARE_PRODUCTS_FILE, FARE_TRANSFER_RULES_FILE, OPERATORS_FILE,
    REFERENCE_FILE_NAMES, STOPS_FILE,
};
pub use input::FareDataInput;
pub use lookup::{resolve_base_fare, LegQualifiers, LookupError, ResolvedFare, TripLegInput};
pub use notice::{FareNotice, NoticeContainer, NoticeSeverity};
pub use policy::{FarePolicy, UniversalRates};
pub use report::{LegReport, TripReport};
pub use transfer::{legacy_discount, TransferCredit};
pub use trip::{compute_trip, TripLeg, TripResult};
pub use trip_hash::{parse_leg_spec, parse_trip_hash, TripRequest};
pub use universal::universal_discount;

pub use clipper_fare_model as model;
