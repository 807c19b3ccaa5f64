//! TOML-based market configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::market::position::PricingPolicy;
use crate::telemetry::TelemetryPolicy;

/// Top-level market configuration parsed from TOML.
///
/// All fields have defaults matching the baseline market. Load from TOML
/// with [`MarketConfig::from_toml_file`] or use [`MarketConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    /// Run-level parameters: seed and policy selection.
    #[serde(default)]
    pub market: MarketSection,
    /// Grid tariff and pricing bands.
    #[serde(default)]
    pub grid: GridSection,
    /// Synthetic fleet generator parameters.
    #[serde(default)]
    pub fleet: FleetSection,
}

/// Run-level parameters: seed and policy selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketSection {
    /// Master random seed (fleet generation and randomized pricing).
    pub seed: u64,
    /// Pricing policy: `"randomized"` or `"quoted"`.
    pub pricing: String,
    /// Telemetry gap policy: `"zero_fill"` or `"strict"`.
    pub telemetry: String,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            seed: 42,
            pricing: "randomized".to_string(),
            telemetry: "zero_fill".to_string(),
        }
    }
}

/// Grid tariff and pricing bands.
///
/// The grid buys residual surplus below its own sell price, so
/// `buy_price_per_kwh < sell_price_per_kwh` always holds for a valid
/// configuration (the spread stays with the operator).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    /// Price the grid pays households for residual surplus (currency/kWh).
    pub buy_price_per_kwh: f64,
    /// Price the grid charges households for residual deficit (currency/kWh).
    pub sell_price_per_kwh: f64,
    /// Margin keeping randomized seller quotes inside the grid band.
    pub seller_margin: f64,
    /// Width of the randomized buyer quote band above the grid sell price.
    pub buyer_margin: f64,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            buy_price_per_kwh: 0.13,
            sell_price_per_kwh: 0.15,
            seller_margin: 0.01,
            buyer_margin: 0.05,
        }
    }
}

/// Synthetic fleet generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetSection {
    /// Number of households to generate.
    pub households: usize,
    /// Maximum solar generation per interval (kWh).
    pub solar_kwh_peak: f64,
    /// Maximum wind generation per interval (kWh).
    pub wind_kwh_peak: f64,
    /// Minimum consumption per interval (kWh).
    pub consumption_kwh_min: f64,
    /// Maximum consumption per interval (kWh).
    pub consumption_kwh_max: f64,
    /// Probability of an overload fault per household (0.0 to 1.0).
    pub overload_rate: f64,
    /// Probability of a transformer fault per household (0.0 to 1.0).
    pub transformer_fault_rate: f64,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            households: 12,
            solar_kwh_peak: 8.0,
            wind_kwh_peak: 3.0,
            consumption_kwh_min: 2.0,
            consumption_kwh_max: 9.0,
            overload_rate: 0.05,
            transformer_fault_rate: 0.02,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"grid.buy_price_per_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl MarketConfig {
    /// Returns the baseline market (mixed fleet, default tariff).
    pub fn baseline() -> Self {
        Self {
            market: MarketSection::default(),
            grid: GridSection::default(),
            fleet: FleetSection::default(),
        }
    }

    /// Returns the solar-glut preset: generation-heavy fleet, most
    /// households end up selling and surplus spills to the grid.
    pub fn solar_glut() -> Self {
        Self {
            market: MarketSection::default(),
            grid: GridSection::default(),
            fleet: FleetSection {
                households: 16,
                solar_kwh_peak: 12.0,
                wind_kwh_peak: 4.0,
                consumption_kwh_min: 2.0,
                consumption_kwh_max: 6.0,
                ..FleetSection::default()
            },
        }
    }

    /// Returns the evening-peak preset: consumption-heavy fleet with a
    /// raised grid sell price, most households buy and the grid covers
    /// the shortfall.
    pub fn evening_peak() -> Self {
        Self {
            market: MarketSection::default(),
            grid: GridSection {
                sell_price_per_kwh: 0.17,
                ..GridSection::default()
            },
            fleet: FleetSection {
                households: 14,
                solar_kwh_peak: 1.5,
                wind_kwh_peak: 1.0,
                consumption_kwh_min: 6.0,
                consumption_kwh_max: 14.0,
                ..FleetSection::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "solar_glut", "evening_peak"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "solar_glut" => Ok(Self::solar_glut()),
            "evening_peak" => Ok(Self::evening_peak()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Resolves the configured pricing mode.
    ///
    /// Unknown strings fall back to the randomized default; `validate`
    /// reports them explicitly.
    pub fn pricing_policy(&self) -> PricingPolicy {
        match self.market.pricing.as_str() {
            "quoted" => PricingPolicy::Quoted,
            _ => PricingPolicy::Randomized {
                seed: self.market.seed,
            },
        }
    }

    /// Resolves the configured telemetry gap policy.
    ///
    /// Unknown strings fall back to zero-fill; `validate` reports them
    /// explicitly.
    pub fn telemetry_policy(&self) -> TelemetryPolicy {
        match self.market.telemetry.as_str() {
            "strict" => TelemetryPolicy::Strict,
            _ => TelemetryPolicy::ZeroFill,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let m = &self.market;

        if m.pricing != "randomized" && m.pricing != "quoted" {
            errors.push(ConfigError {
                field: "market.pricing".into(),
                message: format!(
                    "must be \"randomized\" or \"quoted\", got \"{}\"",
                    m.pricing
                ),
            });
        }
        if m.telemetry != "zero_fill" && m.telemetry != "strict" {
            errors.push(ConfigError {
                field: "market.telemetry".into(),
                message: format!(
                    "must be \"zero_fill\" or \"strict\", got \"{}\"",
                    m.telemetry
                ),
            });
        }

        let g = &self.grid;
        if g.buy_price_per_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "grid.buy_price_per_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if g.sell_price_per_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "grid.sell_price_per_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if g.buy_price_per_kwh >= g.sell_price_per_kwh {
            errors.push(ConfigError {
                field: "grid.buy_price_per_kwh".into(),
                message: "must be < grid.sell_price_per_kwh (spread stays with the grid)".into(),
            });
        }
        if g.seller_margin <= 0.0 {
            errors.push(ConfigError {
                field: "grid.seller_margin".into(),
                message: "must be > 0".into(),
            });
        }
        if g.buyer_margin <= 0.0 {
            errors.push(ConfigError {
                field: "grid.buyer_margin".into(),
                message: "must be > 0".into(),
            });
        }
        if g.sell_price_per_kwh - g.buy_price_per_kwh < 2.0 * g.seller_margin {
            errors.push(ConfigError {
                field: "grid.seller_margin".into(),
                message: "2 * seller_margin must fit inside the buy/sell spread".into(),
            });
        }

        let fl = &self.fleet;
        if fl.households == 0 {
            errors.push(ConfigError {
                field: "fleet.households".into(),
                message: "must be > 0".into(),
            });
        }
        if fl.solar_kwh_peak < 0.0 {
            errors.push(ConfigError {
                field: "fleet.solar_kwh_peak".into(),
                message: "must be >= 0".into(),
            });
        }
        if fl.wind_kwh_peak < 0.0 {
            errors.push(ConfigError {
                field: "fleet.wind_kwh_peak".into(),
                message: "must be >= 0".into(),
            });
        }
        if fl.consumption_kwh_min < 0.0 {
            errors.push(ConfigError {
                field: "fleet.consumption_kwh_min".into(),
                message: "must be >= 0".into(),
            });
        }
        if fl.consumption_kwh_min > fl.consumption_kwh_max {
            errors.push(ConfigError {
                field: "fleet.consumption_kwh_min".into(),
                message: "must be <= fleet.consumption_kwh_max".into(),
            });
        }
        if !(0.0..=1.0).contains(&fl.overload_rate) {
            errors.push(ConfigError {
                field: "fleet.overload_rate".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&fl.transformer_fault_rate) {
            errors.push(ConfigError {
                field: "fleet.transformer_fault_rate".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }

        errors
    }
}
