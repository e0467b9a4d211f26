//! Startup loading of the reference data tables.
//!
//! All tables are loaded wholesale into one context object that callers
//! pass to every calculation; there is no ambient global state and nothing
//! is mutated after load.

use std::path::Path;

use tracing::info;

use crate::mrv::IntensityTable;
use crate::ports::PortTable;
use crate::prices::PriceTable;

/// Conventional file names inside a data directory.
pub const PORTS_FILE: &str = "ports.json";
pub const MRV_FILE: &str = "mrv_data.csv";
pub const PRICES_FILE: &str = "ets_price.csv";

/// Read-only reference tables for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub ports: PortTable,
    pub intensities: IntensityTable,
    pub prices: PriceTable,
}

impl ReferenceData {
    /// Load all tables from a data directory.
    ///
    /// Individual load failures degrade to empty tables with warnings so
    /// the calling surface can keep serving (reporting "0 records loaded")
    /// instead of crashing at startup.
    pub fn load(dir: &Path) -> Self {
        let data = Self {
            ports: PortTable::from_path(&dir.join(PORTS_FILE)),
            intensities: IntensityTable::from_path(&dir.join(MRV_FILE)),
            prices: PriceTable::from_path(&dir.join(PRICES_FILE)),
        };
        info!(
            dir = %dir.display(),
            ports = data.ports.len(),
            ships = data.intensities.len(),
            prices = data.prices.len(),
            "reference data loaded"
        );
        data
    }
}
