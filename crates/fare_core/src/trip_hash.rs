use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::warn;

use clipper_fare_model::{AgencyId, FareParseError, RiderCategory};

use crate::agency::AgencyRegistry;
use crate::lookup::{LegQualifiers, TripLegInput};
use crate::FareError;

const SEGMENT_SEPARATOR: char = '#';
const FIELD_SEPARATOR: char = ';';

/// Characters escaped inside a leg's origin and destination.
const QUALIFIER_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'#').add(b';').add(b'%');

/// A rider category and its legs, as carried by a share link:
/// `#<category>#<agency>#<agency>;<from>;<to>...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub category: RiderCategory,
    pub legs: Vec<TripLegInput>,
}

impl TripRequest {
    pub fn new(category: RiderCategory, legs: Vec<TripLegInput>) -> Self {
        Self { category, legs }
    }

    pub fn to_hash(&self) -> String {
        let mut hash = String::new();
        hash.push(SEGMENT_SEPARATOR);
        hash.push_str(self.category.as_str());
        for leg in &self.legs {
            hash.push(SEGMENT_SEPARATOR);
            hash.push_str(&leg.agency_id);
            if let Some(qualifiers) = &leg.qualifiers {
                hash.push(FIELD_SEPARATOR);
                hash.extend(utf8_percent_encode(&qualifiers.from, QUALIFIER_ENCODE_SET));
                hash.push(FIELD_SEPARATOR);
                hash.extend(utf8_percent_encode(&qualifiers.to, QUALIFIER_ENCODE_SET));
            }
        }
        hash
    }

    /// Replaces each leg's agency text with the registry id it names.
    pub fn resolve_agencies(mut self, registry: &AgencyRegistry) -> Result<Self, FareError> {
        for leg in &mut self.legs {
            leg.agency_id = registry.resolve(&leg.agency_id).map_err(|err| {
                warn!("{}", err);
                err
            })?;
        }
        Ok(self)
    }
}

/// Parses a share hash. The leading `#` is optional, and a hash whose
/// separators are themselves percent-encoded is decoded first.
pub fn parse_trip_hash(hash: &str) -> Result<TripRequest, FareParseError> {
    let hash = decode_whole_hash(hash.trim())?;
    let hash = hash.strip_prefix(SEGMENT_SEPARATOR).unwrap_or(&hash);

    let mut segments = hash.split(SEGMENT_SEPARATOR);
    let category = match segments.next() {
        Some(code) if !code.trim().is_empty() => code.parse::<RiderCategory>()?,
        _ => {
            return Err(FareParseError::InvalidTripHash(
                "missing rider category".to_string(),
            ))
        }
    };

    let mut legs = Vec::new();
    for segment in segments {
        if let Some(leg) = parse_leg_spec(segment)? {
            legs.push(leg);
        }
    }
    Ok(TripRequest { category, legs })
}

/// Parses one leg, `AGENCY` or `AGENCY;FROM;TO`. Returns `None` for a leg
/// with no agency.
pub fn parse_leg_spec(spec: &str) -> Result<Option<TripLegInput>, FareParseError> {
    let fields: Vec<&str> = spec.split(FIELD_SEPARATOR).map(str::trim).collect();
    let agency = fields[0];
    if agency.is_empty() {
        return Ok(None);
    }

    let qualifiers = match fields.len() {
        1 => None,
        3 => Some(LegQualifiers::new(
            decode_field(fields[1])?,
            decode_field(fields[2])?,
        )),
        _ => {
            return Err(FareParseError::InvalidLeg(format!(
                "expected AGENCY or AGENCY;FROM;TO, got {:?}",
                spec
            )))
        }
    };
    Ok(Some(TripLegInput {
        agency_id: AgencyId::from(agency),
        qualifiers,
    }))
}

fn decode_whole_hash(hash: &str) -> Result<Cow<'_, str>, FareParseError> {
    if hash.contains(SEGMENT_SEPARATOR) || hash.contains(FIELD_SEPARATOR) {
        return Ok(Cow::Borrowed(hash));
    }
    percent_decode_str(hash)
        .decode_utf8()
        .map_err(|err| FareParseError::InvalidTripHash(err.to_string()))
}

fn decode_field(field: &str) -> Result<String, FareParseError> {
    percent_decode_str(field)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|err| FareParseError::InvalidLeg(err.to_string()))
}
