//! Port reference table loading and lookup.
//!
//! Ports are read wholesale from a JSON array at startup. The loader is
//! deliberately tolerant: a missing or corrupt file yields an empty table
//! plus a warning, and individual rows failing validation are skipped, so
//! the calling surface stays usable instead of crashing.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::distance::Coordinates;

/// Ports where cargo is transferred between vessels without ending the
/// voyage. A call at one of these must not split an extra-EEA voyage into
/// two legs for coverage classification.
pub static TRANSSHIPMENT_PORTS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["Tanger Med", "East Port Said"]);

/// A single port record. Immutable once loaded; identity is name plus
/// country and duplicates in the source are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub country: String,
    pub region: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
    #[serde(default)]
    pub is_eea: bool,
}

impl Port {
    /// The port's position as oracle-ready coordinates.
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lon: self.lon,
            lat: self.lat,
        }
    }

    /// Whether this port belongs to the designated transshipment set.
    pub fn is_transshipment(&self) -> bool {
        TRANSSHIPMENT_PORTS
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&self.name))
    }
}

/// In-memory port reference table.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    ports: Vec<Port>,
}

impl PortTable {
    /// Load ports from a JSON file.
    ///
    /// Never fails: file-level problems degrade to an empty table with a
    /// warning, and rows that do not deserialize or carry out-of-range
    /// coordinates are skipped individually.
    pub fn from_path(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), %err, "port file unreadable; starting with an empty table");
                return Self::default();
            }
        };
        Self::from_slice(&bytes, &path.display().to_string())
    }

    /// Load ports from raw JSON bytes. `source` is used for diagnostics only.
    pub fn from_slice(bytes: &[u8], source: &str) -> Self {
        let rows: Vec<serde_json::Value> = match serde_json::from_slice(bytes) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(source, %err, "port file is not a JSON array; starting with an empty table");
                return Self::default();
            }
        };

        let total = rows.len();
        let mut ports = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for (index, row) in rows.into_iter().enumerate() {
            match serde_json::from_value::<Port>(row) {
                Ok(port) if port.coordinates().in_range() => ports.push(port),
                Ok(port) => {
                    skipped += 1;
                    debug!(index, name = %port.name, lon = port.lon, lat = port.lat, "skipping port with out-of-range coordinates");
                }
                Err(err) => {
                    skipped += 1;
                    debug!(index, %err, "skipping malformed port row");
                }
            }
        }

        if skipped > 0 {
            warn!(source, skipped, loaded = ports.len(), "ignored invalid port rows");
        }
        if ports.is_empty() {
            warn!(source, "zero valid port records loaded");
        } else {
            debug!(source, count = ports.len(), "loaded port table");
        }

        Self { ports }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Iterate all ports in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Exact lookup by name or alternate name, case-insensitive. The first
    /// matching record wins when the source carries duplicates.
    pub fn find(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|port| {
            port.name.eq_ignore_ascii_case(name)
                || port
                    .alternate
                    .as_deref()
                    .is_some_and(|alt| alt.eq_ignore_ascii_case(name))
        })
    }

    /// Resolve a port name, attaching fuzzy suggestions on a miss.
    pub fn resolve(&self, name: &str) -> crate::error::Result<&Port> {
        self.find(name).ok_or_else(|| {
            let suggestions = self.fuzzy_matches(name, 3);
            crate::error::Error::UnknownPort {
                name: name.to_string(),
                suggestions,
            }
        })
    }

    /// Ranked substring search over name, country, region, and alternate
    /// name. Exact country-code matches sort first, then name matches, then
    /// everything else, truncated to `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Port> {
        let query = query.trim();
        if query.len() < 2 {
            return Vec::new();
        }
        let lowered = query.to_lowercase();

        let mut matches: Vec<&Port> = self
            .ports
            .iter()
            .filter(|port| {
                port.country.eq_ignore_ascii_case(query)
                    || port.name.to_lowercase().contains(&lowered)
                    || port.country.to_lowercase().contains(&lowered)
                    || port.region.to_lowercase().contains(&lowered)
                    || port
                        .alternate
                        .as_deref()
                        .is_some_and(|alt| alt.to_lowercase().contains(&lowered))
            })
            .collect();

        matches.sort_by_key(|port| {
            let rank = if port.country.eq_ignore_ascii_case(query) {
                0
            } else if port.name.to_lowercase().contains(&lowered) {
                1
            } else {
                2
            };
            (rank, port.name.clone())
        });
        matches.truncate(limit);
        matches
    }

    /// Return up to `limit` port names similar to `query`, most similar
    /// first. Used to build "did you mean" suggestions on lookup misses.
    pub fn fuzzy_matches(&self, query: &str, limit: usize) -> Vec<String> {
        const MIN_SIMILARITY: f64 = 0.8;

        let lowered = query.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .ports
            .iter()
            .map(|port| {
                (
                    strsim::jaro_winkler(&lowered, &port.name.to_lowercase()),
                    port.name.as_str(),
                )
            })
            .filter(|(score, _)| *score >= MIN_SIMILARITY)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let mut names: Vec<String> = Vec::new();
        for (_, name) in scored {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
            if names.len() == limit {
                break;
            }
        }
        names
    }
}
