use rustc_hash::FxHashMap;

use clipper_fare_model::{AgencyId, Stop};

pub const HEAVY_RAIL_STATION_AGENCY: &str = "BA";

const GOLDEN_GATE_TRANSIT_ZONES: &[(&str, &str)] = &[
    ("San Francisco", "Zone 1: San Francisco"),
    (
        "Sausalito-Marin City-Mill Valley",
        "Zone 2: Sausalito, Marin City, Mill Valley, Tiburon",
    ),
    (
        "CorteMadera-SanRafael-Marinwood",
        "Zone 3: Corte Madera, Larkspur, San Anselmo, San Rafael, Terra Linda, Lucas Valley, Marinwood",
    ),
    ("Ignacio-Novato-San Marin", "Zone 4: Ignacio, Hamilton, Novato"),
    (
        "Petaluma-Cotati-Rohnert Park",
        "Zone 5: Petaluma, Cotati, Rohnert Park",
    ),
    ("Santa Rosa", "Zone 6: Santa Rosa"),
    ("East Bay", "Zone 7: Richmond, El Cerrito"),
];

const CALTRAIN_ZONES: &[(&str, &str)] = &[
    ("zone1", "Zone 1: San Francisco / South SF / San Bruno"),
    ("zone2", "Zone 2: Millbrae to Redwood City"),
    ("zone3", "Zone 3: Menlo Park to Sunnyvale"),
    ("zone4", "Zone 4: Lawrence to Tamien"),
    ("zone5", "Zone 5: Capitol / Blossom"),
    ("zone6", "Zone 6: Morgan Hill / San Martin / Gilroy"),
];

const SMART_ZONES: &[(&str, &str)] = &[
    ("A", "Larkspur / San Rafael / Marin Civic Center"),
    ("B", "Novato Hamilton / Novato Downtown / Novato San Marin"),
    ("C", "Petaluma Downtown / Petaluma North / Cotati / Rohnert Park"),
    ("D", "Santa Rosa Downtown / Santa Rosa North"),
    ("E", "Sonoma County Airport / Windsor"),
];

const SONOMA_COUNTY_TRANSIT_ZONES: &[(&str, &str)] = &[
    ("zone:1", "Santa Rosa"),
    ("zone:2", "Zone 2: Windsor and Healdsburg"),
    ("zone:3", "Sebastopol and Forestville"),
    ("zone:4", "Rohnert Park, Cotati, and Petaluma"),
    ("zone:5", "Kenwood and Glen Ellen"),
    ("zone:6", "Russian River and Coast"),
    ("zone:7", "Sonoma Valley"),
    ("zone:8", "Geyserville and Cloverdale"),
];

/// Ordered origin/destination choices for a matrix-priced agency, keyed by
/// the id used inside matrix fare product ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualifierTable {
    entries: Vec<(String, String)>,
    index: FxHashMap<String, usize>,
}

impl QualifierTable {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut table = Self::default();
        for (id, label) in pairs {
            table.insert(id, label);
        }
        table
    }

    pub fn from_stops(stops: &[Stop]) -> Self {
        let mut table = Self::default();
        for stop in stops {
            table.insert(&stop.stop_id, &stop.stop_name);
        }
        table
    }

    /// Inserts or relabels an entry; a repeated id keeps its first position.
    pub fn insert(&mut self, id: &str, label: &str) {
        match self.index.get(id) {
            Some(&position) => self.entries[position].1 = label.to_string(),
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push((id.to_string(), label.to_string()));
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, label)| (id.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How an agency's base fare is keyed in the fare product table.
#[derive(Debug, Clone, PartialEq)]
pub enum FareShape {
    /// One price per ride: `<agency>:local:single` or `<agency>:single`.
    Flat,
    /// Zone-to-zone: `<agency>:matrix:<agency>:<from>-<agency>:<to>`.
    ZonalMatrix(QualifierTable),
    /// Station-to-station: `<agency>:matrix:<from>-<to>`.
    StationMatrix(QualifierTable),
}

impl FareShape {
    pub fn is_matrix(&self) -> bool {
        !matches!(self, FareShape::Flat)
    }

    pub fn qualifiers(&self) -> Option<&QualifierTable> {
        match self {
            FareShape::Flat => None,
            FareShape::ZonalMatrix(table) | FareShape::StationMatrix(table) => Some(table),
        }
    }

    pub fn origin_label(&self, agency_id: &str) -> &'static str {
        match self {
            FareShape::ZonalMatrix(_) if agency_id != "SA" => "Starting zone",
            _ => "From",
        }
    }

    pub fn destination_label(&self, agency_id: &str) -> &'static str {
        match self {
            FareShape::ZonalMatrix(_) if agency_id != "SA" => "Ending zone",
            _ => "To",
        }
    }
}

static FLAT: FareShape = FareShape::Flat;

/// Fare shape per agency. Agencies without an entry are flat-fare.
#[derive(Debug, Clone, Default)]
pub struct FareShapes {
    shapes: FxHashMap<AgencyId, FareShape>,
}

impl FareShapes {
    /// The Bay Area matrix agencies; BART stations come from `stops.txt`.
    pub fn bay_area(stops: &[Stop]) -> Self {
        let mut shapes = Self::default();
        shapes.insert(
            "GG",
            FareShape::ZonalMatrix(QualifierTable::from_pairs(GOLDEN_GATE_TRANSIT_ZONES)),
        );
        shapes.insert(
            "CT",
            FareShape::ZonalMatrix(QualifierTable::from_pairs(CALTRAIN_ZONES)),
        );
        shapes.insert(
            "SA",
            FareShape::ZonalMatrix(QualifierTable::from_pairs(SMART_ZONES)),
        );
        shapes.insert(
            "SO",
            FareShape::ZonalMatrix(QualifierTable::from_pairs(SONOMA_COUNTY_TRANSIT_ZONES)),
        );
        shapes.insert(
            HEAVY_RAIL_STATION_AGENCY,
            FareShape::StationMatrix(QualifierTable::from_stops(stops)),
        );
        shapes
    }

    pub fn insert(&mut self, agency_id: &str, shape: FareShape) {
        self.shapes.insert(AgencyId::from(agency_id), shape);
    }

    pub fn shape_for(&self, agency_id: &str) -> &FareShape {
        self.shapes.get(agency_id).unwrap_or(&FLAT)
    }
}
