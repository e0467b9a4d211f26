//! Output formatting for CLI results in text or JSON.

use anyhow::Result;
use clap::ValueEnum;
use serde_json::json;

use mariner_lib::{CostBreakdown, Distance, Port, ShipIntensity};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text.
    Text,
    /// Machine-readable JSON on stdout.
    Json,
}

/// Render port search results.
pub fn render_ports(query: &str, ports: &[&Port], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({ "query": query, "matches": ports });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            if ports.is_empty() {
                println!("No ports matching '{query}'.");
                return Ok(());
            }
            println!("{} ports matching '{query}':", ports.len());
            for port in ports {
                let alternate = port
                    .alternate
                    .as_deref()
                    .map(|alt| format!(" ({alt})"))
                    .unwrap_or_default();
                let eea = if port.is_eea { " [EEA]" } else { "" };
                println!(
                    "  {}{} - {} / {} ({:.2}, {:.2}){}",
                    port.name, alternate, port.country, port.region, port.lon, port.lat, eea
                );
            }
        }
    }
    Ok(())
}

/// Render a resolved distance.
pub fn render_distance(
    origin_label: &str,
    dest_label: &str,
    distance: &Distance,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "origin": origin_label,
                "destination": dest_label,
                "km": distance.km,
                "nm": distance.nm(),
                "method": distance.method,
                "approximate": distance.is_approximate(),
                "waypoints": distance.waypoints,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            println!("Distance from {origin_label} to {dest_label}:");
            println!(
                "  {:.1} nm ({:.1} km) via {}{}",
                distance.nm(),
                distance.km,
                distance.method,
                if distance.is_approximate() {
                    ", approximate"
                } else {
                    ""
                }
            );
            if let Some(waypoints) = distance.waypoints {
                println!("  {waypoints} route waypoints");
            }
        }
    }
    Ok(())
}

/// Render the per-year ETS cost trajectory.
pub fn render_cost(
    origin_label: &str,
    dest_label: &str,
    intensity: &ShipIntensity,
    distance: &Distance,
    breakdown: &CostBreakdown,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "origin": origin_label,
                "destination": dest_label,
                "ship": intensity,
                "distance": distance,
                "approximate": distance.is_approximate(),
                "breakdown": breakdown,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            println!("Voyage {origin_label} -> {dest_label}:");
            println!(
                "  {:.1} nm ({:.1} km via {}{})",
                breakdown.distance_nm,
                distance.km,
                distance.method,
                if distance.is_approximate() {
                    ", approximate"
                } else {
                    ""
                }
            );
            println!(
                "  Ship {}: {:.1} kg CO2/nm, {:.1} kg CO2eq/nm",
                intensity.imo, intensity.co2_per_nm, intensity.co2eq_per_nm
            );
            println!(
                "  Emissions: {:.2} t CO2, {:.2} t CO2eq",
                breakdown.co2_tonnes, breakdown.co2eq_tonnes
            );
            println!("  Coverage: {}", coverage_text(breakdown.coverage));
            println!("  ETS cost by year:");
            for year in &breakdown.by_year {
                println!(
                    "    {}  phase-in {:>3.0}%  {:<5}  {:>9.2} t  @ EUR {:>6.2}  -> EUR {:.2}",
                    year.year,
                    year.phase_in * 100.0,
                    year.basis.to_string(),
                    year.covered_tonnes,
                    year.price_eur,
                    year.cost_eur
                );
            }
        }
    }
    Ok(())
}

/// Human description of a coverage fraction, mirroring the policy table.
fn coverage_text(coverage: f64) -> String {
    if coverage >= 1.0 {
        "100% (EEA to EEA)".to_string()
    } else if coverage > 0.0 {
        format!("{:.0}% (mixed route)", coverage * 100.0)
    } else {
        "0% (non-EEA route)".to_string()
    }
}
