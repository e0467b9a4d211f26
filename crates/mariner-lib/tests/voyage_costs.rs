use std::io::Cursor;

use mariner_lib::{
    cost_breakdown, cost_trajectory, DistanceOracle, IntensityTable, PortTable, PriceTable,
};

const PORTS_JSON: &str = r#"[
    {"name": "Hamburg", "country": "DE", "region": "Europe", "lon": 9.97, "lat": 53.54, "is_eea": true},
    {"name": "Rotterdam", "country": "NL", "region": "Europe", "lon": 4.47, "lat": 51.92, "is_eea": true},
    {"name": "Singapore", "country": "SG", "region": "Asia", "lon": 103.85, "lat": 1.29}
]"#;

const MRV_CSV: &str = "IMO Number,CO₂ emissions per distance [kg CO₂ / n mile],CO₂eq emissions per distance [kg CO₂eq / n mile]\n1013676,50.0,52.5\n";

const PRICES_CSV: &str =
    "year,average_eua_price_eur\n2024,80.0\n2025,75.0\n2026,72.0\n2027,74.0\n2028,76.0\n2029,78.0\n2030,80.0\n";

#[test]
fn full_pipeline_produces_a_cost_trajectory() {
    let ports = PortTable::from_slice(PORTS_JSON.as_bytes(), "test");
    let ships = IntensityTable::from_reader(Cursor::new(MRV_CSV), "test");
    let prices = PriceTable::from_reader(Cursor::new(PRICES_CSV), "test");
    let oracle = DistanceOracle::great_circle_only();

    let origin = ports.resolve("Rotterdam").expect("port seeded");
    let dest = ports.resolve("Singapore").expect("port seeded");
    let ship = ships.resolve("1013676").expect("ship seeded");

    let distance = oracle
        .distance(origin.coordinates(), dest.coordinates())
        .expect("great-circle cannot fail for valid ports");
    assert!(distance.is_approximate());

    let breakdown =
        cost_breakdown(distance.nm(), ship, origin, dest, &prices).expect("trajectory computes");
    assert_eq!(breakdown.coverage, 0.5);
    assert_eq!(breakdown.by_year.len(), 7);

    // 2024 prices CO2 at 40% phase-in; 2026 prices CO2eq at 100%.
    let for_2024 = &breakdown.by_year[0];
    let expected_2024 = breakdown.co2_tonnes * 0.5 * 0.4 * 80.0;
    assert!((for_2024.cost_eur - expected_2024).abs() < 1e-6);

    let for_2026 = &breakdown.by_year[2];
    let expected_2026 = breakdown.co2eq_tonnes * 0.5 * 1.0 * 72.0;
    assert!((for_2026.cost_eur - expected_2026).abs() < 1e-6);

    // Full phase-in from 2026 onwards: later years differ only by price.
    let for_2030 = &breakdown.by_year[6];
    assert_eq!(for_2030.phase_in, 1.0);
}

#[test]
fn oracle_distance_is_symmetric_for_the_fallback() {
    let ports = PortTable::from_slice(PORTS_JSON.as_bytes(), "test");
    let oracle = DistanceOracle::great_circle_only();
    let hamburg = ports.resolve("Hamburg").unwrap().coordinates();
    let singapore = ports.resolve("Singapore").unwrap().coordinates();

    let forward = oracle.distance(hamburg, singapore).unwrap();
    let backward = oracle.distance(singapore, hamburg).unwrap();
    assert!((forward.km - backward.km).abs() < 1e-9);
}

#[test]
fn trajectory_with_explicit_coverage_matches_port_classification() {
    let ports = PortTable::from_slice(PORTS_JSON.as_bytes(), "test");
    let ships = IntensityTable::from_reader(Cursor::new(MRV_CSV), "test");
    let prices = PriceTable::from_reader(Cursor::new(PRICES_CSV), "test");

    let origin = ports.resolve("Rotterdam").unwrap();
    let dest = ports.resolve("Hamburg").unwrap();
    let ship = ships.resolve("1013676").unwrap();

    let by_ports = cost_breakdown(1000.0, ship, origin, dest, &prices).unwrap();
    let by_coverage = cost_trajectory(1000.0, ship, 1.0, &prices).unwrap();
    assert_eq!(by_ports, by_coverage);
}

#[cfg(unix)]
mod wrapper_chain {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use mariner_lib::{Coordinates, DistanceMethod, DistanceOracle, WrapperCommand};

    #[test]
    fn wrapper_strategy_takes_precedence_over_great_circle() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("wrapper.sh");
        fs::write(&script, "#!/bin/sh\necho 1852000\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let wrapper = WrapperCommand::probe(&script, Duration::from_secs(5)).unwrap();
        let oracle = DistanceOracle::new(None, Some(wrapper));

        let distance = oracle
            .distance(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
            .unwrap();
        assert_eq!(distance.method, DistanceMethod::Wrapper);
        assert!((distance.km - 1852.0).abs() < 1e-9);
        assert!((distance.nm() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn hung_wrapper_is_killed_and_falls_through_to_great_circle() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("wrapper.sh");
        fs::write(&script, "#!/bin/sh\nsleep 30\necho 1852000\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let wrapper = WrapperCommand::probe(&script, Duration::from_millis(200)).unwrap();
        let oracle = DistanceOracle::new(None, Some(wrapper));

        let start = std::time::Instant::now();
        let distance = oracle
            .distance(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
            .unwrap();
        // The chain must not wait out the full sleep before falling back.
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(distance.method, DistanceMethod::GreatCircle);
    }

    #[test]
    fn misbehaving_wrapper_falls_through_to_great_circle() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("wrapper.sh");
        fs::write(&script, "#!/bin/sh\necho not-a-number\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let wrapper = WrapperCommand::probe(&script, Duration::from_secs(5)).unwrap();
        let oracle = DistanceOracle::new(None, Some(wrapper));

        let distance = oracle
            .distance(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
            .unwrap();
        assert_eq!(distance.method, DistanceMethod::GreatCircle);
    }
}
