// Module exports for CLI subcommands.
//
// Each module handles one subcommand; main.rs stays focused on parsing and
// wiring the reference data and distance chain.

pub mod cost;
pub mod distance;
pub mod search;

use anyhow::{bail, Result};
use mariner_lib::Coordinates;

/// Split a `--coords OLON OLAT DLON DLAT` argument into two endpoints.
pub(crate) fn split_coords(coords: &[f64]) -> Result<(Coordinates, Coordinates)> {
    match coords {
        [olon, olat, dlon, dlat] => Ok((
            Coordinates::new(*olon, *olat),
            Coordinates::new(*dlon, *dlat),
        )),
        _ => bail!("--coords expects exactly four values: OLON OLAT DLON DLAT"),
    }
}
