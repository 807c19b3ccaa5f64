//! Local energy market entry point: CLI wiring and the settlement pipeline.

use std::path::Path;
use std::process;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use lem_sim::config::MarketConfig;
use lem_sim::fleet::FleetGenerator;
use lem_sim::io::export::{export_ledger_csv, export_trades_csv};
use lem_sim::io::import::import_telemetry_csv;
use lem_sim::market::engine::SettlementOutcome;
use lem_sim::market::ledger::build_ledger;
use lem_sim::market::position::build_positions;
use lem_sim::market::report::MarketReport;
use lem_sim::market::settle;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    telemetry_path: Option<String>,
    seed_override: Option<u64>,
    ledger_out: Option<String>,
    trades_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("lem-sim — Local energy market settlement simulator");
    eprintln!();
    eprintln!("Usage: lem-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load market configuration from a TOML file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, solar_glut, evening_peak)");
    eprintln!("  --telemetry <path>    Read household telemetry from CSV instead of generating it");
    eprintln!("  --seed <u64>          Override the master random seed");
    eprintln!("  --ledger-out <path>   Export the settlement ledger to CSV");
    eprintln!("  --trades-out <path>   Export the executed trades to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve               Start REST API server after settlement");
        eprintln!("  --port <u16>          API server port (default: 3000)");
    }
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        telemetry_path: None,
        seed_override: None,
        ledger_out: None,
        trades_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--telemetry" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_path = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--ledger-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --ledger-out requires a path argument");
                    process::exit(1);
                }
                cli.ledger_out = Some(args[i].clone());
            }
            "--trades-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --trades-out requires a path argument");
                    process::exit(1);
                }
                cli.trades_out = Some(args[i].clone());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline default
    let mut config = if let Some(ref path) = cli.config_path {
        match MarketConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match MarketConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        MarketConfig::baseline()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        config.market.seed = seed;
    }

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Telemetry: read the given CSV, or draw a synthetic fleet
    let records = if let Some(ref path) = cli.telemetry_path {
        match import_telemetry_csv(Path::new(path)) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("error: failed to read telemetry: {e}");
                process::exit(1);
            }
        }
    } else {
        FleetGenerator::new(&config).generate()
    };

    let positions = match build_positions(&records, &config) {
        Ok(positions) => positions,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // A snapshot with zero eligible traders is reported, not fatal.
    let outcome = match settle(positions.clone(), &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{e}; reporting the unsettled ledger");
            SettlementOutcome {
                positions,
                trades: Vec::new(),
            }
        }
    };

    let ledger = build_ledger(&outcome.positions);
    let report = MarketReport::from_settlement(&outcome.positions, &outcome.trades);

    // Print the ledger and the run summary
    for entry in &ledger {
        println!("{entry}");
    }
    println!("\n{report}");

    // Export CSVs if requested
    if let Some(ref path) = cli.ledger_out {
        if let Err(e) = export_ledger_csv(&ledger, Path::new(path)) {
            eprintln!("error: failed to write ledger CSV: {e}");
            process::exit(1);
        }
        eprintln!("Ledger written to {path}");
    }
    if let Some(ref path) = cli.trades_out {
        if let Err(e) = export_trades_csv(&outcome.trades, Path::new(path)) {
            eprintln!("error: failed to write trades CSV: {e}");
            process::exit(1);
        }
        eprintln!("Trades written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(lem_sim::api::AppState {
            config,
            ledger,
            trades: outcome.trades,
            report,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(lem_sim::api::serve(state, addr));
    }
}
