use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use clipper_fare_model::{Agency, AgencyId};

use crate::FareError;

/// Fare-relevant operator variants that are not in the regional registry.
const SYNTHETIC_AGENCIES: &[(&str, &str)] = &[
    ("AC:transbay", "AC Transit - Transbay"),
    ("SC:express", "VTA - Express"),
    ("3D:regional", "Tri-Delta Transit - 200X/201X"),
    ("DE:transbay", "Dumbarton - Transbay"),
    ("VN:express", "VINE Transit - Express"),
    ("GF:LSSF", "Golden Gate Ferry - Larkspur"),
    ("GF:TBSF", "Golden Gate Ferry - Tiburon"),
    ("GF:SSSF", "Golden Gate Ferry - Sausalito"),
    ("GF:AISF", "Golden Gate Ferry - Angel Island"),
    ("SB:HB", "SF Bay Ferry: Harbor Bay"),
    ("SB:SEA", "SF Bay Ferry: Alameda Seaplane"),
    ("SB:OA", "SF Bay Ferry: Oakland & Alameda"),
    ("SB:RCH", "SF Bay Ferry: Richmond"),
    ("SB:SSF", "SF Bay Ferry: South San Francisco"),
    ("SB:VJO", "SF Bay Ferry: Vallejo"),
];

/// Operators without a priceable Clipper fare of their own: free services,
/// services that do not accept Clipper, and multi-route operators that are
/// only priced through their route variants.
const EXCLUDED_AGENCIES: &[&str] = &[
    "AM", "AF", "CE", "CM", "EE", "EM", "GP", "MB", "MC", "PE", "RG", "MV", "PG", "SI", "SS",
    "TF", "RV", "GF", "SB",
];

const NICKNAMES: &[(&str, &str)] = &[("SF", "Muni"), ("BA", "BART"), ("SA", "SMART")];

/// Operators whose transfer rules are published once for the operator
/// rather than per route.
const GROUPED_OPERATORS: &[&str] = &["GF", "SB"];

/// The operator registry with the synthetic route variants appended.
#[derive(Debug, Clone, Default)]
pub struct AgencyRegistry {
    agencies: Vec<Agency>,
    index: FxHashMap<AgencyId, usize>,
}

impl AgencyRegistry {
    pub fn new(base: Vec<Agency>) -> Self {
        let mut agencies = base;
        agencies.extend(
            SYNTHETIC_AGENCIES
                .iter()
                .map(|(id, name)| Agency::new(id, name)),
        );

        let mut index = FxHashMap::default();
        for (position, agency) in agencies.iter().enumerate() {
            index.entry(agency.id.clone()).or_insert(position);
        }
        Self { agencies, index }
    }

    pub fn get(&self, agency_id: &str) -> Option<&Agency> {
        self.index
            .get(agency_id)
            .map(|&position| &self.agencies[position])
    }

    pub fn contains(&self, agency_id: &str) -> bool {
        self.index.contains_key(agency_id)
    }

    pub fn all(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn len(&self) -> usize {
        self.agencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agencies.is_empty()
    }

    /// Newest export timestamp across the registry rows.
    pub fn last_generated(&self) -> Option<NaiveDateTime> {
        self.agencies
            .iter()
            .filter_map(Agency::last_generated_at)
            .max()
    }

    /// Agencies a rider can pick, in registry order.
    pub fn listed(&self) -> impl Iterator<Item = &Agency> {
        self.agencies
            .iter()
            .filter(|agency| !is_excluded(&agency.id))
    }

    pub fn display_label(&self, agency: &Agency) -> String {
        match nickname(&agency.id) {
            Some(nickname) => format!("{} - {}", nickname, agency.name),
            None => agency.name.clone(),
        }
    }

    /// Short name used in per-leg output: the nickname when there is one.
    pub fn display_name(&self, agency_id: &str) -> String {
        if let Some(nickname) = nickname(agency_id) {
            return nickname.to_string();
        }
        self.get(agency_id)
            .map(|agency| agency.name.clone())
            .unwrap_or_else(|| agency_id.to_string())
    }

    /// Maps free-form rider input to an agency id. Tried in order: an exact
    /// agency id, an exact display label, a nickname (case-insensitive), then
    /// the first listed agency whose name contains the input.
    pub fn resolve(&self, input: &str) -> Result<AgencyId, FareError> {
        let trimmed = input.trim();
        let not_resolved = || FareError::AgencyNotResolved {
            input: input.to_string(),
        };
        if trimmed.is_empty() {
            return Err(not_resolved());
        }

        if let Some(agency) = self.get(trimmed) {
            return Ok(agency.id.clone());
        }

        if let Some(agency) = self
            .listed()
            .find(|agency| self.display_label(agency) == trimmed)
        {
            return Ok(agency.id.clone());
        }

        let lowered = trimmed.to_lowercase();
        if let Some((id, _)) = NICKNAMES
            .iter()
            .find(|(_, nickname)| nickname.to_lowercase() == lowered)
        {
            return Ok(AgencyId::from(*id));
        }

        self.listed()
            .find(|agency| agency.name.to_lowercase().contains(&lowered))
            .map(|agency| agency.id.clone())
            .ok_or_else(not_resolved)
    }
}

pub fn is_excluded(agency_id: &str) -> bool {
    EXCLUDED_AGENCIES.contains(&agency_id)
}

pub fn nickname(agency_id: &str) -> Option<&'static str> {
    NICKNAMES
        .iter()
        .find(|(id, _)| *id == agency_id)
        .map(|(_, nickname)| *nickname)
}

/// Maps route-variant agency ids to the operator id used by transfer rules.
/// Ids without an entry are their own group.
#[derive(Debug, Clone, Default)]
pub struct AgencyGroups {
    parents: FxHashMap<AgencyId, AgencyId>,
}

impl AgencyGroups {
    pub fn from_registry(registry: &AgencyRegistry) -> Self {
        let mut parents = FxHashMap::default();
        for agency in registry.all() {
            let Some((parent, _)) = agency.id.split_once(':') else {
                continue;
            };
            if GROUPED_OPERATORS.contains(&parent) {
                parents.insert(agency.id.clone(), AgencyId::from(parent));
            }
        }
        Self { parents }
    }

    pub fn group_of<'a>(&'a self, agency_id: &'a str) -> &'a str {
        self.parents
            .get(agency_id)
            .map(|parent| parent.as_str())
            .unwrap_or(agency_id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
