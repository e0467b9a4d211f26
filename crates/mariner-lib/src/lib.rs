//! Mariner library entry points.
//!
//! This crate exposes helpers to load the maritime reference tables (ports,
//! MRV intensities, EUA prices), resolve maritime distances through the
//! external routing engine with graceful fallbacks, and evaluate the EU ETS
//! coverage and phase-in cost arithmetic. Higher-level consumers (the CLI)
//! should only depend on the functions exported here instead of
//! reimplementing behavior.

#![deny(warnings)]

pub mod distance;
pub mod error;
pub mod ets;
pub mod mrv;
pub mod ports;
pub mod prices;
pub mod reference;

pub use distance::{
    haversine_km, Coordinates, Distance, DistanceMethod, DistanceOracle, DistanceStrategy,
    GreatCircle, RoutingEngine, WrapperCommand, KM_PER_NAUTICAL_MILE,
};
pub use error::{Error, Result};
pub use ets::{
    collapse_transshipment_stops, cost_breakdown, cost_for_year, cost_trajectory,
    coverage_for_itinerary, coverage_fraction, gas_basis, phase_in_fraction, CostBreakdown,
    GasBasis, YearCost,
};
pub use mrv::{IntensityTable, ShipIntensity};
pub use ports::{Port, PortTable, TRANSSHIPMENT_PORTS};
pub use prices::{EuaPrice, PriceTable};
pub use reference::ReferenceData;
