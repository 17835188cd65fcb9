//! Immutable destination store, loaded once at startup.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;

use super::builtin;
use super::normalize::normalize_text;
use super::types::{
    Coordinates, Destination, DestinationKind, DestinationSummary, RegionMapping, ResolveError,
    Result,
};

/// Source of gazetteer data.
pub trait GazetteerLoader {
    fn load(&self) -> Result<(Vec<Destination>, Vec<RegionMapping>)>;
}

/// The dataset compiled into the binary.
pub struct BuiltinGazetteer;

impl GazetteerLoader for BuiltinGazetteer {
    fn load(&self) -> Result<(Vec<Destination>, Vec<RegionMapping>)> {
        Ok((builtin::destinations(), builtin::regions()))
    }
}

#[derive(Deserialize)]
struct GazetteerFile {
    destinations: Vec<Destination>,
    #[serde(default)]
    regions: Vec<RegionMapping>,
}

/// Loads `{"destinations": [...], "regions": [...]}` from a JSON file.
pub struct JsonGazetteerLoader {
    path: PathBuf,
}

impl JsonGazetteerLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GazetteerLoader for JsonGazetteerLoader {
    fn load(&self) -> Result<(Vec<Destination>, Vec<RegionMapping>)> {
        let data = fs::read_to_string(&self.path)?;
        let file: GazetteerFile = serde_json::from_str(&data)?;
        Ok((file.destinations, file.regions))
    }
}

/// A region with its normalized match names (region name first).
#[derive(Debug, Clone)]
pub struct IndexedRegion {
    pub mapping: RegionMapping,
    pub names: Vec<String>,
}

/// Validated, indexed, read-only destination table.
#[derive(Debug)]
pub struct Gazetteer {
    destinations: Vec<Destination>,
    by_code: HashMap<(String, DestinationKind), usize>,
    /// Normalized display name + aliases per destination, same index.
    names: Vec<Vec<String>>,
    regions: Vec<IndexedRegion>,
}

impl Gazetteer {
    pub fn from_loader(loader: &dyn GazetteerLoader) -> Result<Self> {
        let (destinations, regions) = loader.load()?;
        Self::new(destinations, regions)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_loader(&BuiltinGazetteer)
    }

    /// Validate and index. Codes are upper-cased; aliases are normalized.
    pub fn new(destinations: Vec<Destination>, regions: Vec<RegionMapping>) -> Result<Self> {
        let mut by_code = HashMap::with_capacity(destinations.len());
        let mut names = Vec::with_capacity(destinations.len());
        let mut stored = Vec::with_capacity(destinations.len());

        for mut dest in destinations {
            dest.code = dest.code.trim().to_uppercase();
            if dest.code.len() != 3 || !dest.code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ResolveError::Gazetteer(format!(
                    "invalid code '{}' for {}",
                    dest.code, dest.display_name
                )));
            }
            if !dest.coordinates.is_valid() {
                return Err(ResolveError::Gazetteer(format!(
                    "coordinates out of range for {}",
                    dest.code
                )));
            }
            if let Some(tz) = &dest.timezone {
                if tz.parse::<chrono_tz::Tz>().is_err() {
                    return Err(ResolveError::Gazetteer(format!(
                        "unknown timezone '{}' for {}",
                        tz, dest.code
                    )));
                }
            }
            let idx = stored.len();
            if by_code.insert((dest.code.clone(), dest.kind), idx).is_some() {
                return Err(ResolveError::Gazetteer(format!(
                    "duplicate {} code {}",
                    dest.kind, dest.code
                )));
            }

            let mut seen = BTreeSet::new();
            let dest_names: Vec<String> = std::iter::once(&dest.display_name)
                .chain(dest.aliases.iter())
                .map(|n| normalize_text(n))
                .filter(|n| !n.is_empty() && seen.insert(n.clone()))
                .collect();
            names.push(dest_names);
            stored.push(dest);
        }

        let mut indexed_regions = Vec::with_capacity(regions.len());
        for mut region in regions {
            for code in region.member_codes.iter_mut() {
                *code = code.trim().to_uppercase();
                let known = by_code.contains_key(&(code.clone(), DestinationKind::Airport))
                    || by_code.contains_key(&(code.clone(), DestinationKind::City));
                if !known {
                    return Err(ResolveError::Gazetteer(format!(
                        "region '{}' references unknown code {}",
                        region.region_name, code
                    )));
                }
            }
            if region.member_codes.is_empty() {
                return Err(ResolveError::Gazetteer(format!(
                    "region '{}' has no members",
                    region.region_name
                )));
            }
            let mut seen = BTreeSet::new();
            let region_names = std::iter::once(&region.region_name)
                .chain(region.aliases.iter())
                .map(|n| normalize_text(n))
                .filter(|n| !n.is_empty() && seen.insert(n.clone()))
                .collect();
            indexed_regions.push(IndexedRegion {
                mapping: region,
                names: region_names,
            });
        }

        tracing::debug!(
            destinations = stored.len(),
            regions = indexed_regions.len(),
            "gazetteer loaded"
        );

        Ok(Self {
            destinations: stored,
            by_code,
            names,
            regions: indexed_regions,
        })
    }

    /// Case-insensitive lookup by code and kind.
    pub fn lookup(&self, code: &str, kind: DestinationKind) -> Option<&Destination> {
        self.by_code
            .get(&(code.to_uppercase(), kind))
            .map(|&i| &self.destinations[i])
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.lookup(code, DestinationKind::Airport).is_some()
            || self.lookup(code, DestinationKind::City).is_some()
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Normalized match names of the destination at `idx`.
    pub fn names_of(&self, idx: usize) -> &[String] {
        &self.names[idx]
    }

    pub fn regions(&self) -> &[IndexedRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Nearest airport within `radius_km` of `point`.
    pub fn nearest_airport(&self, point: &Coordinates, radius_km: f64) -> Option<(&Destination, f64)> {
        self.destinations
            .iter()
            .filter(|d| d.kind == DestinationKind::Airport)
            .map(|d| (d, d.coordinates.distance_km(point)))
            .filter(|(_, dist)| *dist <= radius_km)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Every destination, for listings.
    pub fn summaries(&self) -> Vec<DestinationSummary> {
        self.destinations.iter().map(Destination::summary).collect()
    }
}
