//! EU ETS coverage and cost arithmetic.
//!
//! Everything here is a pure function over already-loaded reference data:
//! no I/O. The policy constants follow the published
//! maritime ETS rollout: coverage by EEA membership of the voyage
//! endpoints, phase-in by compliance year, and a gas-basis switch from CO2
//! to CO2-equivalent in 2026.

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::mrv::ShipIntensity;
use crate::ports::Port;
use crate::prices::PriceTable;

/// Which verified mass a compliance year is priced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GasBasis {
    Co2,
    Co2Equivalent,
}

impl std::fmt::Display for GasBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GasBasis::Co2 => "CO2",
            GasBasis::Co2Equivalent => "CO2eq",
        };
        f.write_str(label)
    }
}

/// Coverage fraction for a voyage between two ports.
///
/// Intra-EEA voyages are fully covered, voyages touching the EEA on one
/// end are half covered, and voyages entirely outside the EEA are out of
/// scope.
pub fn coverage_fraction(origin_eea: bool, dest_eea: bool) -> f64 {
    match (origin_eea, dest_eea) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}

/// Drop designated transshipment stops from the interior of an itinerary.
///
/// A call at a transshipment hub transfers cargo without ending the voyage,
/// so it must not act as a leg boundary. The first and last calls always
/// survive; interior stops at other ports are kept as genuine boundaries.
pub fn collapse_transshipment_stops<'a>(calls: &[&'a Port]) -> Vec<&'a Port> {
    calls
        .iter()
        .enumerate()
        .filter(|(index, call)| {
            *index == 0 || *index == calls.len() - 1 || !call.is_transshipment()
        })
        .map(|(_, call)| *call)
        .collect()
}

/// Coverage fraction for a full itinerary of port calls.
///
/// Transshipment stops in the interior do not split or reset the voyage:
/// classification is computed on the true origin and destination after
/// collapsing them out. An itinerary with fewer than two calls has no
/// voyage and no coverage.
pub fn coverage_for_itinerary(calls: &[&Port]) -> f64 {
    let collapsed = collapse_transshipment_stops(calls);
    match (collapsed.first(), collapsed.last()) {
        (Some(origin), Some(dest)) if collapsed.len() >= 2 => {
            coverage_fraction(origin.is_eea, dest.is_eea)
        }
        _ => 0.0,
    }
}

/// Phase-in fraction of the computed liability for a compliance year.
///
/// Years before the scheme's 2024 start are undefined and fail closed.
pub fn phase_in_fraction(year: i32) -> Result<f64> {
    match year {
        year if year < 2024 => Err(Error::YearBeforeScheme { year }),
        2024 => Ok(0.40),
        2025 => Ok(0.70),
        _ => Ok(1.00),
    }
}

/// Gas-accounting basis for a compliance year: CO2 only through 2025,
/// CO2-equivalent (adds CH4 and N2O) from 2026.
pub fn gas_basis(year: i32) -> GasBasis {
    if year <= 2025 {
        GasBasis::Co2
    } else {
        GasBasis::Co2Equivalent
    }
}

/// One year's slice of the cost trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCost {
    pub year: i32,
    pub phase_in: f64,
    pub basis: GasBasis,
    /// Emissions actually surrendered after coverage and phase-in, tonnes.
    pub covered_tonnes: f64,
    pub price_eur: f64,
    pub cost_eur: f64,
}

/// The full per-voyage cost computation result. Transient; owned by the
/// caller, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub distance_nm: f64,
    pub coverage: f64,
    pub co2_tonnes: f64,
    pub co2eq_tonnes: f64,
    pub by_year: Vec<YearCost>,
}

/// Cost for a single compliance year.
pub fn cost_for_year(
    distance_nm: f64,
    intensity: &ShipIntensity,
    coverage: f64,
    year: i32,
    price_eur: f64,
) -> Result<YearCost> {
    let phase_in = phase_in_fraction(year)?;
    let basis = gas_basis(year);
    let per_nm = match basis {
        GasBasis::Co2 => intensity.co2_per_nm,
        GasBasis::Co2Equivalent => intensity.co2eq_per_nm,
    };
    // kg over the leg, divided by 1000 for tonnes.
    let tonnes = per_nm * distance_nm / 1000.0;
    let covered_tonnes = tonnes * coverage * phase_in;

    Ok(YearCost {
        year,
        phase_in,
        basis,
        covered_tonnes,
        price_eur,
        cost_eur: covered_tonnes * price_eur,
    })
}

/// Compute the cost trajectory over every year seeded in the price table
/// for an already-classified voyage, so callers can render a trajectory
/// rather than a single value.
///
/// Price rows for years before the scheme's start are skipped with a
/// warning rather than failing the trajectory; a stray historical row in
/// the price file must not break pricing for the valid years. Asking for a
/// pre-scheme year directly through [`cost_for_year`] still fails closed.
pub fn cost_trajectory(
    distance_nm: f64,
    intensity: &ShipIntensity,
    coverage: f64,
    prices: &PriceTable,
) -> Result<CostBreakdown> {
    let co2_tonnes = intensity.co2_per_nm * distance_nm / 1000.0;
    let co2eq_tonnes = intensity.co2eq_per_nm * distance_nm / 1000.0;

    let mut by_year = Vec::new();
    for price in prices.iter() {
        if phase_in_fraction(price.year).is_err() {
            warn!(year = price.year, "skipping pre-scheme price year in trajectory");
            continue;
        }
        by_year.push(cost_for_year(
            distance_nm,
            intensity,
            coverage,
            price.year,
            price.price_eur,
        )?);
    }

    Ok(CostBreakdown {
        distance_nm,
        coverage,
        co2_tonnes,
        co2eq_tonnes,
        by_year,
    })
}

/// As [`cost_trajectory`], classifying coverage from the voyage's true
/// origin and destination ports.
pub fn cost_breakdown(
    distance_nm: f64,
    intensity: &ShipIntensity,
    origin: &Port,
    dest: &Port,
    prices: &PriceTable,
) -> Result<CostBreakdown> {
    let coverage = coverage_fraction(origin.is_eea, dest.is_eea);
    cost_trajectory(distance_nm, intensity, coverage, prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn port(name: &str, is_eea: bool) -> Port {
        Port {
            name: name.to_string(),
            country: "XX".to_string(),
            region: "Test".to_string(),
            lon: 0.0,
            lat: 0.0,
            alternate: None,
            is_eea,
        }
    }

    fn intensity(co2: f64, co2eq: f64) -> ShipIntensity {
        ShipIntensity {
            imo: "1013676".to_string(),
            co2_per_nm: co2,
            co2eq_per_nm: co2eq,
        }
    }

    #[test]
    fn coverage_table_is_exact() {
        assert_eq!(coverage_fraction(true, true), 1.0);
        assert_eq!(coverage_fraction(true, false), 0.5);
        assert_eq!(coverage_fraction(false, true), 0.5);
        assert_eq!(coverage_fraction(false, false), 0.0);
    }

    #[test]
    fn phase_in_schedule_matches_rollout() {
        assert_eq!(phase_in_fraction(2024).unwrap(), 0.40);
        assert_eq!(phase_in_fraction(2025).unwrap(), 0.70);
        assert_eq!(phase_in_fraction(2026).unwrap(), 1.00);
        assert_eq!(phase_in_fraction(2030).unwrap(), 1.00);
    }

    #[test]
    fn pre_2024_years_fail_closed() {
        assert!(matches!(
            phase_in_fraction(2023),
            Err(Error::YearBeforeScheme { year: 2023 })
        ));
    }

    #[test]
    fn gas_basis_switches_in_2026() {
        assert_eq!(gas_basis(2024), GasBasis::Co2);
        assert_eq!(gas_basis(2025), GasBasis::Co2);
        assert_eq!(gas_basis(2026), GasBasis::Co2Equivalent);
        assert_eq!(gas_basis(2030), GasBasis::Co2Equivalent);
    }

    #[test]
    fn gas_basis_switch_changes_the_result() {
        let ship = intensity(50.0, 55.0);
        let for_2025 = cost_for_year(1000.0, &ship, 1.0, 2025, 80.0).unwrap();
        let for_2026 = cost_for_year(1000.0, &ship, 1.0, 2026, 80.0).unwrap();
        // 2025 prices CO2 only, 2026 prices CO2eq; they must differ when the
        // two intensities differ.
        assert!((for_2025.covered_tonnes / for_2025.phase_in - 50.0).abs() < 1e-9);
        assert!((for_2026.covered_tonnes - 55.0).abs() < 1e-9);
        assert_ne!(for_2025.cost_eur, for_2026.cost_eur);
    }

    #[test]
    fn published_scenario_costs_800_eur() {
        // 1000 nm at 50 kg/nm = 50 t; mixed route = 0.5; 2024 phase-in =
        // 0.4; at EUR 80/t the liability is EUR 800.
        let ship = intensity(50.0, 50.0);
        let cost = cost_for_year(1000.0, &ship, 0.5, 2024, 80.0).unwrap();
        assert!((cost.cost_eur - 800.0).abs() < 1e-9);
        assert!((cost.covered_tonnes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn transshipment_stop_does_not_reclassify_the_voyage() {
        let origin = port("Rotterdam", true);
        let hub = port("Tanger Med", false);
        let dest = port("Singapore", false);
        assert!(hub.is_transshipment());

        let direct = coverage_for_itinerary(&[&origin, &dest]);
        let via_hub = coverage_for_itinerary(&[&origin, &hub, &dest]);
        assert_eq!(direct, 0.5);
        assert_eq!(via_hub, direct);
    }

    #[test]
    fn collapse_keeps_ordinary_interior_stops() {
        let origin = port("Rotterdam", true);
        let hub = port("Tanger Med", false);
        let stop = port("Istanbul", false);
        let dest = port("Singapore", false);

        let collapsed = collapse_transshipment_stops(&[&origin, &hub, &stop, &dest]);
        let names: Vec<&str> = collapsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Rotterdam", "Istanbul", "Singapore"]);
    }

    #[test]
    fn transshipment_port_as_true_endpoint_still_counts() {
        let origin = port("Tanger Med", false);
        let dest = port("Rotterdam", true);
        // The hub is the genuine origin here, not an intermediate hop.
        assert_eq!(coverage_for_itinerary(&[&origin, &dest]), 0.5);
    }

    #[test]
    fn itinerary_with_fewer_than_two_calls_has_no_coverage() {
        let origin = port("Rotterdam", true);
        assert_eq!(coverage_for_itinerary(&[]), 0.0);
        assert_eq!(coverage_for_itinerary(&[&origin]), 0.0);
    }

    #[test]
    fn breakdown_covers_every_seeded_year() {
        let prices = PriceTable::from_reader(
            Cursor::new("year,average_eua_price_eur\n2024,80.0\n2025,75.0\n2026,70.0\n"),
            "test",
        );
        let ship = intensity(50.0, 55.0);
        let origin = port("Rotterdam", true);
        let dest = port("Hamburg", true);

        let breakdown = cost_breakdown(1000.0, &ship, &origin, &dest, &prices).unwrap();
        assert_eq!(breakdown.coverage, 1.0);
        assert_eq!(breakdown.co2_tonnes, 50.0);
        assert_eq!(breakdown.co2eq_tonnes, 55.0);
        let years: Vec<i32> = breakdown.by_year.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2024, 2025, 2026]);

        // 2024: 50 t * 1.0 * 0.4 * 80 = 1600
        assert!((breakdown.by_year[0].cost_eur - 1600.0).abs() < 1e-9);
        // 2026: 55 t * 1.0 * 1.0 * 70 = 3850
        assert!((breakdown.by_year[2].cost_eur - 3850.0).abs() < 1e-9);
    }

    #[test]
    fn pre_scheme_price_rows_are_skipped_not_fatal() {
        let prices = PriceTable::from_reader(
            Cursor::new("year,average_eua_price_eur\n2023,70.0\n2024,80.0\n"),
            "test",
        );
        let ship = intensity(50.0, 55.0);

        let breakdown = cost_trajectory(1000.0, &ship, 1.0, &prices).unwrap();
        let years: Vec<i32> = breakdown.by_year.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2024]);
        // 50 t * 1.0 * 0.4 * 80 = 1600
        assert!((breakdown.by_year[0].cost_eur - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_scope_voyage_costs_nothing_every_year() {
        let prices = PriceTable::from_reader(
            Cursor::new("year,average_eua_price_eur\n2024,80.0\n2030,90.0\n"),
            "test",
        );
        let ship = intensity(50.0, 55.0);
        let origin = port("Singapore", false);
        let dest = port("Santos", false);

        let breakdown = cost_breakdown(1000.0, &ship, &origin, &dest, &prices).unwrap();
        assert_eq!(breakdown.coverage, 0.0);
        assert!(breakdown.by_year.iter().all(|y| y.cost_eur == 0.0));
    }
}
