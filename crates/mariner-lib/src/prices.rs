//! EUA price-by-year reference table.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::{debug, warn};

/// A single year's average EUA price in EUR per tonne.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EuaPrice {
    pub year: i32,
    pub price_eur: f64,
}

/// Price table keyed by calendar year. Seeded range is 2024 through 2030;
/// lookups outside the seeded years fail closed with a typed error.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: BTreeMap<i32, f64>,
}

impl PriceTable {
    /// Load the table from a CSV file with `year,average_eua_price_eur`
    /// columns. Never fails: unreadable files degrade to an empty table and
    /// blank or malformed rows are skipped.
    pub fn from_path(path: &Path) -> Self {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), %err, "price file unreadable; starting with an empty table");
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
                warn!(source, %err, "failed to read price headers; starting with an empty table");
                return Self::default();
            }
        };
        let year_idx = headers.iter().position(|h| h.trim().eq_ignore_ascii_case("year"));
        let price_idx = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("average_eua_price_eur"));
        let (Some(year_idx), Some(price_idx)) = (year_idx, price_idx) else {
            warn!(source, "price file is missing required columns; starting with an empty table");
            return Self::default();
        };

        let mut prices = BTreeMap::new();
        let mut skipped = 0usize;
        for (row, record) in csv_reader.records().enumerate() {
            let Ok(record) = record else {
                skipped += 1;
                continue;
            };
            let year = record.get(year_idx).unwrap_or_default().trim();
            let price = record.get(price_idx).unwrap_or_default().trim();
            if year.is_empty() && price.is_empty() {
                continue; // trailing blank rows are common in the source export
            }
            match (year.parse::<i32>(), price.parse::<f64>()) {
                (Ok(year), Ok(price)) if price.is_finite() && price >= 0.0 => {
                    prices.insert(year, price);
                }
                _ => {
                    skipped += 1;
                    debug!(source, row, year, price, "skipping malformed price row");
                }
            }
        }

        if skipped > 0 {
            warn!(source, skipped, loaded = prices.len(), "ignored invalid price rows");
        }
        if prices.is_empty() {
            warn!(source, "zero valid price records loaded");
        } else {
            debug!(source, count = prices.len(), "loaded EUA price table");
        }

        Self { prices }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Price for a year, if seeded.
    pub fn price_for(&self, year: i32) -> Option<f64> {
        self.prices.get(&year).copied()
    }

    /// Price for a year or a typed error.
    pub fn resolve(&self, year: i32) -> crate::error::Result<f64> {
        self.price_for(year)
            .ok_or(crate::error::Error::UnknownPriceYear { year })
    }

    /// Seeded years and prices in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = EuaPrice> + '_ {
        self.prices.iter().map(|(&year, &price_eur)| EuaPrice { year, price_eur })
    }
}
