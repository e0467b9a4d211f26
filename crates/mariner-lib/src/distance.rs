//! Maritime distance lookup via an ordered chain of strategies.
//!
//! The primary strategy shells out to the external routing engine (a Java
//! JAR exchanging CSV in / GeoJSON out through temporary files). When that
//! is unavailable or misbehaves, an optional general-purpose wrapper
//! command is tried, and finally a great-circle haversine estimate. The
//! chain is an explicit ordered list rather than nested error handling, so
//! each hop is individually observable in the logs.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::{Error, Result};

/// Kilometres per nautical mile.
pub const KM_PER_NAUTICAL_MILE: f64 = 1.852;

/// Mean Earth radius in kilometres, used by the haversine fallback.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default resolution of the engine's maritime network graph, in km.
pub const DEFAULT_RESOLUTION_KM: u32 = 20;

/// Default bound on a single engine invocation.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(15);

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Whether the pair lies inside valid longitude/latitude ranges.
    pub fn in_range(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }

    /// Validate the pair, rejecting out-of-range values before they reach
    /// any strategy.
    pub fn validate(&self) -> Result<()> {
        if self.in_range() {
            Ok(())
        } else {
            Err(Error::InvalidCoordinates {
                lon: self.lon,
                lat: self.lat,
            })
        }
    }

    /// Round to two decimal places. The engine's path lookup is brittle
    /// with high-precision coordinates, so legs are coarsened before
    /// dispatch.
    pub fn rounded(self) -> Self {
        Self {
            lon: (self.lon * 100.0).round() / 100.0,
            lat: (self.lat * 100.0).round() / 100.0,
        }
    }
}

/// Which strategy produced a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMethod {
    Engine,
    Wrapper,
    GreatCircle,
}

impl fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DistanceMethod::Engine => "engine",
            DistanceMethod::Wrapper => "wrapper",
            DistanceMethod::GreatCircle => "great-circle",
        };
        f.write_str(label)
    }
}

/// A resolved maritime distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distance {
    pub km: f64,
    pub method: DistanceMethod,
    /// Number of path waypoints, when the engine reported a geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<usize>,
}

impl Distance {
    /// The distance in nautical miles.
    pub fn nm(&self) -> f64 {
        self.km / KM_PER_NAUTICAL_MILE
    }

    /// Great-circle results are estimates, not routed distances.
    pub fn is_approximate(&self) -> bool {
        self.method == DistanceMethod::GreatCircle
    }
}

/// A single way of measuring a maritime distance between two points.
pub trait DistanceStrategy {
    /// The method label reported on success.
    fn method(&self) -> DistanceMethod;

    /// Measure the leg. Coordinates are already validated and rounded.
    fn measure(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance>;
}

/// External routing engine invoked as a subprocess with file-based I/O.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    java: PathBuf,
    jar: PathBuf,
    resolution_km: u32,
    timeout: Duration,
}

impl RoutingEngine {
    /// Probe the engine configuration once at startup. A missing JAR or an
    /// unrunnable `java` is reported here, loudly, instead of per-request.
    pub fn probe(java: &Path, jar: &Path, resolution_km: u32, timeout: Duration) -> Result<Self> {
        if !jar.is_file() {
            return Err(Error::StrategyBinaryMissing {
                path: jar.to_path_buf(),
            });
        }

        let status = Command::new(java)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| Error::EngineUnavailable {
                message: format!("java not runnable at {}: {err}", java.display()),
            })?;
        if !status.success() {
            return Err(Error::EngineUnavailable {
                message: format!("java -version exited with {status}"),
            });
        }

        Ok(Self {
            java: java.to_path_buf(),
            jar: jar.to_path_buf(),
            resolution_km,
            timeout,
        })
    }

    fn run(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance> {
        let workdir = tempfile::tempdir()?;
        let input_path = workdir.path().join("legs.csv");
        let output_path = workdir.path().join("route.geojson");

        fs::write(
            &input_path,
            format!(
                "route name,olon,olat,dlon,dlat\nleg,{},{},{},{}\n",
                origin.lon, origin.lat, destination.lon, destination.lat
            ),
        )?;

        let mut child = Command::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg("-i")
            .arg(&input_path)
            .arg("-o")
            .arg(&output_path)
            .arg("-res")
            .arg(self.resolution_km.to_string())
            .current_dir(workdir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Err(Error::EngineTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(Error::EngineOutput {
                message: format!("exit {status}: {}", stderr.trim()),
            });
        }

        let raw = fs::read(&output_path).map_err(|err| Error::EngineOutput {
            message: format!("engine wrote no output file: {err}"),
        })?;
        parse_engine_geojson(&raw)
    }
}

impl DistanceStrategy for RoutingEngine {
    fn method(&self) -> DistanceMethod {
        DistanceMethod::Engine
    }

    fn measure(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance> {
        self.run(origin, destination)
    }
}

/// Extract the routed distance from the engine's GeoJSON output.
///
/// The engine reports `distKM` as either a number or a string depending on
/// version, and the geometry as a LineString or MultiLineString.
fn parse_engine_geojson(raw: &[u8]) -> Result<Distance> {
    let document: serde_json::Value = serde_json::from_slice(raw)?;
    let feature = document
        .get("features")
        .and_then(|features| features.get(0))
        .ok_or_else(|| Error::EngineOutput {
            message: "no route features in engine output".to_string(),
        })?;

    let dist_km = feature.get("properties").and_then(|properties| {
        let value = properties.get("distKM")?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    });
    let km = dist_km.filter(|km| km.is_finite() && *km >= 0.0).ok_or_else(|| {
        Error::EngineOutput {
            message: "missing or unusable distKM in engine output".to_string(),
        }
    })?;

    let waypoints = feature
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"))
        .map(count_positions)
        .filter(|&count| count > 0);

    Ok(Distance {
        km,
        method: DistanceMethod::Engine,
        waypoints,
    })
}

/// Count coordinate positions in a (Multi)LineString coordinates array.
fn count_positions(coordinates: &serde_json::Value) -> usize {
    match coordinates.as_array() {
        Some(items) => {
            if items.first().map(|item| item.is_number()).unwrap_or(false) {
                1
            } else {
                items.iter().map(count_positions).sum()
            }
        }
        None => 0,
    }
}

/// Optional general-purpose wrapper command: given the four raw coordinates
/// as arguments it prints the route length in meters on stdout.
#[derive(Debug, Clone)]
pub struct WrapperCommand {
    program: PathBuf,
    timeout: Duration,
}

impl WrapperCommand {
    pub fn probe(program: &Path, timeout: Duration) -> Result<Self> {
        if !program.is_file() {
            return Err(Error::StrategyBinaryMissing {
                path: program.to_path_buf(),
            });
        }
        Ok(Self {
            program: program.to_path_buf(),
            timeout,
        })
    }
}

impl DistanceStrategy for WrapperCommand {
    fn method(&self) -> DistanceMethod {
        DistanceMethod::Wrapper
    }

    fn measure(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance> {
        let mut child = Command::new(&self.program)
            .args([
                origin.lon.to_string(),
                origin.lat.to_string(),
                destination.lon.to_string(),
                destination.lat.to_string(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Err(Error::EngineTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };
        if !status.success() {
            return Err(Error::EngineOutput {
                message: format!("wrapper exit {status}"),
            });
        }

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout)?;
        }
        let meters: f64 = stdout.trim().parse().map_err(|_| Error::EngineOutput {
            message: format!("wrapper printed non-numeric length: {:?}", stdout.trim()),
        })?;
        if !meters.is_finite() || meters < 0.0 {
            return Err(Error::EngineOutput {
                message: format!("wrapper printed unusable length: {meters}"),
            });
        }

        Ok(Distance {
            km: meters / 1000.0,
            method: DistanceMethod::Wrapper,
            waypoints: None,
        })
    }
}

/// Pure-math great-circle estimate. Last resort; cannot fail for
/// validated coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl DistanceStrategy for GreatCircle {
    fn method(&self) -> DistanceMethod {
        DistanceMethod::GreatCircle
    }

    fn measure(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance> {
        Ok(Distance {
            km: haversine_km(origin, destination),
            method: DistanceMethod::GreatCircle,
            waypoints: None,
        })
    }
}

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Ordered fallback chain over the available strategies.
pub struct DistanceOracle {
    strategies: Vec<Box<dyn DistanceStrategy>>,
}

impl DistanceOracle {
    /// Build the chain from whichever external strategies probed
    /// successfully. The great-circle estimate is always appended last so
    /// the chain can never be exhausted for valid input.
    pub fn new(engine: Option<RoutingEngine>, wrapper: Option<WrapperCommand>) -> Self {
        let mut strategies: Vec<Box<dyn DistanceStrategy>> = Vec::new();
        if let Some(engine) = engine {
            strategies.push(Box::new(engine));
        }
        if let Some(wrapper) = wrapper {
            strategies.push(Box::new(wrapper));
        }
        strategies.push(Box::new(GreatCircle));
        Self { strategies }
    }

    /// An oracle with only the great-circle estimate available.
    pub fn great_circle_only() -> Self {
        Self::new(None, None)
    }

    /// Resolve a maritime distance for one leg, walking the chain until a
    /// strategy succeeds.
    pub fn distance(&self, origin: Coordinates, destination: Coordinates) -> Result<Distance> {
        origin.validate()?;
        destination.validate()?;
        let origin = origin.rounded();
        let destination = destination.rounded();

        for strategy in &self.strategies {
            match strategy.measure(origin, destination) {
                Ok(distance) => {
                    debug!(method = %distance.method, km = distance.km, "distance resolved");
                    return Ok(distance);
                }
                Err(err) => {
                    warn!(method = %strategy.method(), %err, "distance strategy failed; trying next");
                }
            }
        }
        Err(Error::DistanceExhausted)
    }
}
