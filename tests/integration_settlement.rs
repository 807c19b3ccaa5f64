//! End-to-end settlement properties over the full pipeline:
//! telemetry -> positions -> matching -> grid clearing -> ledger.

mod common;

use lem_sim::config::MarketConfig;
use lem_sim::fleet::FleetGenerator;
use lem_sim::io::export::{write_ledger_csv, write_trades_csv};
use lem_sim::market::eligibility::is_eligible;
use lem_sim::market::ledger::build_ledger;
use lem_sim::market::position::build_positions;
use lem_sim::market::settle;
use lem_sim::market::types::{GRID_ID, Trade};

use common::{overloaded, position, quoted_config, telemetry};

#[test]
fn bilateral_match_with_grid_residual() {
    // A +5 kWh @ 0.14 against B -3 kWh @ 0.15: one bilateral trade of
    // 3 kWh at the 0.145 midpoint, A's leftover 2 kWh to the grid.
    let positions = vec![position("A", 5.0, 0.14), position("B", -3.0, 0.15)];
    let outcome = settle(positions, &quoted_config()).unwrap();

    assert_eq!(outcome.trades.len(), 2);
    assert_eq!(outcome.trades[0], Trade::new("A", "B", 3.0, 0.145));
    assert_eq!(outcome.trades[1], Trade::new("A", GRID_ID, 2.0, 0.13));

    let ledger = build_ledger(&outcome.positions);
    assert_eq!(ledger[0].household_id, "A");
    assert_eq!(ledger[0].traded_kwh, 5.0);
    assert_eq!(ledger[0].remaining_kwh, 0.0);
    assert_eq!(ledger[1].household_id, "B");
    assert_eq!(ledger[1].traded_kwh, 3.0);
    assert_eq!(ledger[1].remaining_kwh, 0.0);
}

#[test]
fn lone_seller_goes_to_grid() {
    let positions = vec![position("A", 7.5, 0.14)];
    let outcome = settle(positions, &quoted_config()).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0], Trade::new("A", GRID_ID, 7.5, 0.13));
    assert!(outcome.trades.iter().all(Trade::involves_grid));
}

#[test]
fn overloaded_household_is_reported_not_settled() {
    let records = vec![
        telemetry("H001", 10.0, 0.14).with_faults(true, false),
        telemetry("H002", 4.0, 0.14),
        telemetry("H003", -4.0, 0.15),
    ];
    let config = quoted_config();
    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();
    let ledger = build_ledger(&outcome.positions);

    let flagged = ledger.iter().find(|e| e.household_id == "H001").unwrap();
    assert!(!flagged.eligible);
    assert!(flagged.overload);
    assert_eq!(flagged.traded_kwh, 0.0);
    assert_eq!(flagged.remaining_kwh, 10.0);
    assert!(outcome.trades.iter().all(|t| !t.involves("H001")));
}

#[test]
fn full_clearing_over_a_generated_fleet() {
    let mut config = MarketConfig::baseline();
    config.fleet.households = 40;
    let records = FleetGenerator::new(&config).generate();
    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();

    for p in outcome.positions.iter().filter(|p| is_eligible(p)) {
        assert_eq!(
            p.remaining_kwh, 0.0,
            "{} left unmatched with {} kWh",
            p.household_id, p.remaining_kwh
        );
    }
}

#[test]
fn conservation_over_a_generated_fleet() {
    let mut config = MarketConfig::baseline();
    config.fleet.households = 40;
    let records = FleetGenerator::new(&config).generate();
    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();

    let bilateral_kwh: f64 = outcome
        .trades
        .iter()
        .filter(|t| !t.involves_grid())
        .map(|t| t.kwh)
        .sum();
    let grid_kwh: f64 = outcome
        .trades
        .iter()
        .filter(|t| t.involves_grid())
        .map(|t| t.kwh)
        .sum();
    let traded_total: f64 = outcome.positions.iter().map(|p| p.traded_kwh).sum();

    assert!((traded_total - (2.0 * bilateral_kwh + grid_kwh)).abs() < 1e-6);
}

#[test]
fn bilateral_prices_respect_both_quotes_over_a_generated_fleet() {
    let mut config = MarketConfig::baseline();
    config.fleet.households = 40;
    let records = FleetGenerator::new(&config).generate();
    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();

    for t in outcome.trades.iter().filter(|t| !t.involves_grid()) {
        let seller = outcome
            .positions
            .iter()
            .find(|p| p.household_id == t.seller_id)
            .unwrap();
        let buyer = outcome
            .positions
            .iter()
            .find(|p| p.household_id == t.buyer_id)
            .unwrap();
        assert!(t.price >= seller.quoted_price - 1e-9);
        assert!(t.price <= buyer.quoted_price + 1e-9);
    }
}

#[test]
fn no_compatible_pair_survives_over_a_generated_fleet() {
    let mut config = MarketConfig::baseline();
    config.fleet.households = 40;
    let records = FleetGenerator::new(&config).generate();
    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();

    for s in outcome.positions.iter().filter(|p| is_eligible(p)) {
        for b in outcome.positions.iter().filter(|p| is_eligible(p)) {
            let compatible = s.remaining_kwh > 0.0
                && b.remaining_kwh < 0.0
                && b.quoted_price >= s.quoted_price;
            assert!(
                !compatible,
                "{} and {} still compatible after settlement",
                s.household_id, b.household_id
            );
        }
    }
}

#[test]
fn pipeline_is_deterministic_end_to_end() {
    // Same seed, same config: the whole run down to the exported CSV
    // bytes must be identical.
    let config = MarketConfig::baseline();

    let run = || {
        let records = FleetGenerator::new(&config).generate();
        let positions = build_positions(&records, &config).unwrap();
        let outcome = settle(positions, &config).unwrap();
        let ledger = build_ledger(&outcome.positions);

        let mut ledger_csv = Vec::new();
        write_ledger_csv(&ledger, &mut ledger_csv).unwrap();
        let mut trades_csv = Vec::new();
        write_trades_csv(&outcome.trades, &mut trades_csv).unwrap();
        (outcome.trades, ledger, ledger_csv, trades_csv)
    };

    let (trades_a, ledger_a, ledger_csv_a, trades_csv_a) = run();
    let (trades_b, ledger_b, ledger_csv_b, trades_csv_b) = run();

    assert_eq!(trades_a, trades_b);
    assert_eq!(ledger_a, ledger_b);
    assert_eq!(ledger_csv_a, ledger_csv_b);
    assert_eq!(trades_csv_a, trades_csv_b);
}

#[test]
fn ledger_upsert_by_household_id_is_idempotent() {
    // Re-settling the same snapshot and upserting rows by household_id
    // must leave the store unchanged after the first write.
    use std::collections::BTreeMap;

    let positions = vec![
        position("H001", 5.0, 0.14),
        position("H002", -3.0, 0.15),
        overloaded("H003", 2.0, 0.14),
    ];
    let config = quoted_config();

    let mut store = BTreeMap::new();
    for _ in 0..3 {
        let outcome = settle(positions.clone(), &config).unwrap();
        for entry in build_ledger(&outcome.positions) {
            store.insert(entry.household_id.clone(), entry);
        }
    }

    assert_eq!(store.len(), 3);
    let outcome = settle(positions, &config).unwrap();
    for entry in build_ledger(&outcome.positions) {
        assert_eq!(store.get(&entry.household_id), Some(&entry));
    }
}

#[test]
fn strict_telemetry_surfaces_malformed_records() {
    let mut config = quoted_config();
    config.market.telemetry = "strict".to_string();

    let mut bad = telemetry("H001", 5.0, 0.14);
    bad.consumption_kwh = None;

    let err = build_positions(&[bad], &config).unwrap_err();
    assert!(err.to_string().contains("consumption_kwh"));
}

#[test]
fn zero_fill_telemetry_recovers_and_settles() {
    let config = quoted_config();

    let mut gappy = telemetry("H001", 5.0, 0.14);
    gappy.wind_kwh = None;
    let records = vec![gappy, telemetry("H002", -3.0, 0.15)];

    let positions = build_positions(&records, &config).unwrap();
    let outcome = settle(positions, &config).unwrap();
    assert_eq!(outcome.trades[0], Trade::new("H001", "H002", 3.0, 0.145));
}
