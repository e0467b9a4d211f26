//! Distance command handler.

use anyhow::{bail, Result};

use mariner_lib::{Coordinates, DistanceOracle, ReferenceData};

use crate::output::{render_distance, OutputFormat};

/// Handle the distance subcommand for either two port names or four raw
/// coordinates. Port names resolve through the reference table with fuzzy
/// suggestions on a miss.
pub fn run(
    data: &ReferenceData,
    oracle: &DistanceOracle,
    format: OutputFormat,
    from: Option<&str>,
    to: Option<&str>,
    coords: Option<&[f64]>,
) -> Result<()> {
    let (origin, destination, origin_label, dest_label) =
        resolve_endpoints(data, from, to, coords)?;
    let distance = oracle.distance(origin, destination)?;
    render_distance(&origin_label, &dest_label, &distance, format)
}

/// Turn the user's endpoint specification into coordinates plus display
/// labels.
pub(crate) fn resolve_endpoints(
    data: &ReferenceData,
    from: Option<&str>,
    to: Option<&str>,
    coords: Option<&[f64]>,
) -> Result<(Coordinates, Coordinates, String, String)> {
    if let Some(coords) = coords {
        let (origin, destination) = super::split_coords(coords)?;
        return Ok((
            origin,
            destination,
            format!("({}, {})", origin.lon, origin.lat),
            format!("({}, {})", destination.lon, destination.lat),
        ));
    }

    let (Some(from), Some(to)) = (from, to) else {
        bail!("provide either --from and --to port names, or --coords");
    };
    let origin = data.ports.resolve(from)?;
    let destination = data.ports.resolve(to)?;
    Ok((
        origin.coordinates(),
        destination.coordinates(),
        format!("{} ({})", origin.name, origin.country),
        format!("{} ({})", destination.name, destination.country),
    ))
}
