//! Cost command handler: distance lookup plus the ETS cost trajectory.

use anyhow::{bail, Context, Result};
use tracing::warn;

use mariner_lib::{
    cost_trajectory, coverage_fraction, DistanceOracle, Error, ReferenceData, ShipIntensity,
};

use crate::output::{render_cost, OutputFormat};

/// Arguments for the cost subcommand.
pub struct CostArgs<'a> {
    pub imo: &'a str,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub coords: Option<&'a [f64]>,
    pub origin_eea: bool,
    pub dest_eea: bool,
    pub fleet_median: bool,
}

/// Handle the cost subcommand.
///
/// Resolves the ship's MRV intensity (optionally falling back to the fleet
/// median), obtains the leg distance through the oracle chain, classifies
/// coverage from the voyage's true endpoints, and prints the per-year cost
/// trajectory over the seeded price years.
pub fn run(
    data: &ReferenceData,
    oracle: &DistanceOracle,
    format: OutputFormat,
    args: &CostArgs<'_>,
) -> Result<()> {
    let intensity = resolve_intensity(data, args.imo, args.fleet_median)?;

    let (origin, destination, origin_label, dest_label) =
        super::distance::resolve_endpoints(data, args.from, args.to, args.coords)?;

    let coverage = if args.coords.is_some() {
        coverage_fraction(args.origin_eea, args.dest_eea)
    } else {
        // resolve_endpoints already validated both names.
        let origin_port = data.ports.resolve(args.from.unwrap_or_default())?;
        let dest_port = data.ports.resolve(args.to.unwrap_or_default())?;
        coverage_fraction(origin_port.is_eea, dest_port.is_eea)
    };

    let distance = oracle.distance(origin, destination)?;
    let breakdown = cost_trajectory(distance.nm(), &intensity, coverage, &data.prices)
        .context("failed to compute the ETS cost trajectory")?;

    if breakdown.by_year.is_empty() {
        bail!("no EUA price years loaded; cannot produce a cost trajectory");
    }

    render_cost(
        &origin_label,
        &dest_label,
        &intensity,
        &distance,
        &breakdown,
        format,
    )
}

/// Look up the ship's intensity record, honouring the fleet-median opt-in.
fn resolve_intensity(
    data: &ReferenceData,
    imo: &str,
    fleet_median: bool,
) -> Result<ShipIntensity> {
    match data.intensities.lookup(imo) {
        Some(ship) => Ok(ship.clone()),
        None if fleet_median => {
            let median = data
                .intensities
                .fleet_median()
                .context("MRV table is empty; no fleet median available")?;
            warn!(imo, "IMO not found in MRV table; using the fleet median");
            Ok(median)
        }
        None => Err(Error::UnknownShip {
            imo: imo.trim().to_string(),
        }
        .into()),
    }
}
