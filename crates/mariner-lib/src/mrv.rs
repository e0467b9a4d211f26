//! MRV per-ship emission intensity table.
//!
//! Records come from the EU MRV export as CSV, keyed by IMO number. The
//! export's headers are long and carry unicode subscripts, so header
//! matching is normalized. The literal cell `Division by zero!` appears in
//! real exports and is coerced to zero.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::{debug, warn};

/// Per-ship verified emission intensity in kg per nautical mile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipIntensity {
    pub imo: String,
    pub co2_per_nm: f64,
    pub co2eq_per_nm: f64,
}

/// In-memory MRV intensity table keyed by IMO number.
#[derive(Debug, Clone, Default)]
pub struct IntensityTable {
    ships: Vec<ShipIntensity>,
    by_imo: HashMap<String, usize>,
}

impl IntensityTable {
    /// Load the table from a CSV file path.
    ///
    /// Never fails: an unreadable file degrades to an empty table with a
    /// warning, and rows with unparsable cells are skipped individually.
    pub fn from_path(path: &Path) -> Self {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), %err, "MRV file unreadable; starting with an empty table");
                return Self::default();
            }
        };
        Self::from_reader(file, &path.display().to_string())
    }

    /// Load the table from a reader. `source` is used for diagnostics only.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Self {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let headers = match csv_reader.headers() {
            Ok(headers) => headers.clone(),
            Err(err) => {
                warn!(source, %err, "failed to read MRV headers; starting with an empty table");
                return Self::default();
            }
        };

        let imo_idx = find_column(&headers, &["imo number", "imo"]);
        let co2_idx = find_column(&headers, &["co2 emissions per distance", "co2 per nm"]);
        let co2eq_idx = find_column(&headers, &["co2eq emissions per distance", "co2eq per nm"]);

        let (Some(imo_idx), Some(co2_idx), Some(co2eq_idx)) = (imo_idx, co2_idx, co2eq_idx) else {
            warn!(source, "MRV file is missing required columns; starting with an empty table");
            return Self::default();
        };

        let mut ships = Vec::new();
        let mut by_imo = HashMap::new();
        let mut skipped = 0usize;
        for (row, record) in csv_reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    skipped += 1;
                    debug!(source, row, %err, "skipping unreadable MRV row");
                    continue;
                }
            };

            let imo = record.get(imo_idx).unwrap_or_default().trim();
            let co2 = record.get(co2_idx).and_then(parse_intensity_cell);
            let co2eq = record.get(co2eq_idx).and_then(parse_intensity_cell);

            match (imo.is_empty(), co2, co2eq) {
                (false, Some(co2_per_nm), Some(co2eq_per_nm)) => {
                    let ship = ShipIntensity {
                        imo: imo.to_string(),
                        co2_per_nm,
                        co2eq_per_nm,
                    };
                    by_imo.entry(ship.imo.clone()).or_insert(ships.len());
                    ships.push(ship);
                }
                _ => {
                    skipped += 1;
                    debug!(source, row, imo, "skipping MRV row with invalid cells");
                }
            }
        }

        if skipped > 0 {
            warn!(source, skipped, loaded = ships.len(), "ignored invalid MRV rows");
        }
        if ships.is_empty() {
            warn!(source, "zero valid MRV records loaded");
        } else {
            debug!(source, count = ships.len(), "loaded MRV intensity table");
        }

        Self { ships, by_imo }
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Lookup a ship by IMO number. A miss is `None`, never a panic.
    pub fn lookup(&self, imo: &str) -> Option<&ShipIntensity> {
        self.by_imo.get(imo.trim()).map(|&index| &self.ships[index])
    }

    /// Resolve an IMO number to its intensity record or a typed error.
    pub fn resolve(&self, imo: &str) -> crate::error::Result<&ShipIntensity> {
        self.lookup(imo).ok_or_else(|| crate::error::Error::UnknownShip {
            imo: imo.trim().to_string(),
        })
    }

    /// Fleet-median intensity, the fallback callers may opt into when an
    /// IMO number is absent from the table. `None` on an empty table.
    pub fn fleet_median(&self) -> Option<ShipIntensity> {
        if self.ships.is_empty() {
            return None;
        }
        Some(ShipIntensity {
            imo: "fleet-median".to_string(),
            co2_per_nm: median_of(self.ships.iter().map(|s| s.co2_per_nm)),
            co2eq_per_nm: median_of(self.ships.iter().map(|s| s.co2eq_per_nm)),
        })
    }
}

/// Parse an intensity cell, coercing the MRV export's `Division by zero!`
/// sentinel to zero.
fn parse_intensity_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("Division by zero!") {
        return Some(0.0);
    }
    cell.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Find a header whose normalized form starts with one of the candidates.
/// The MRV export's headers carry unit suffixes and unicode subscripts
/// (`CO₂ emissions per distance [kg CO₂ / n mile]`), so matching is done on
/// a lowercased, ascii-folded prefix.
fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let normalized = normalize_header(header);
        candidates
            .iter()
            .any(|candidate| normalized.starts_with(candidate))
    })
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .map(|c| match c {
            '₂' => '2',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
        .trim_start_matches('\u{feff}')
        .to_string()
}

fn median_of(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
