//! Navrisk CLI - Command line interface for portfolio risk metrics.
//!
//! Every command prints a JSON `ApiResponse` on stdout. Logs go to stderr,
//! filtered by `RUST_LOG` (default `warn`).

use clap::{Args, Parser, Subcommand};
use navrisk_core::{
    ApiResponse, HoldingsSource, HoldingsStore, MarketDataStore, RiskConfig, RiskSnapshot,
    VarMethod,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "navrisk")]
#[command(about = "Portfolio risk metrics - volatility, Sharpe ratio and historical VaR")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.navrisk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full risk snapshot
    Snapshot {
        #[command(flatten)]
        inputs: RiskInputs,
    },
    /// Compute the portfolio VaR only
    Var {
        #[command(flatten)]
        inputs: RiskInputs,
    },
    /// Holdings management commands
    Holdings {
        /// Holdings file (defaults to the configured or default path)
        #[arg(long)]
        holdings: Option<PathBuf>,

        #[command(subcommand)]
        action: HoldingsAction,
    },
}

/// Overrides applied on top of the config file.
#[derive(Args)]
struct RiskInputs {
    /// Annual risk-free rate (0.02 = 2%)
    #[arg(long)]
    risk_free_rate: Option<f64>,
    /// Number of daily observations per asset
    #[arg(long)]
    lookback: Option<usize>,
    /// Holdings JSON file
    #[arg(long)]
    holdings: Option<PathBuf>,
    /// Price histories JSON file
    #[arg(long)]
    market_data: Option<PathBuf>,
    /// VaR method (historical, normal)
    #[arg(long)]
    method: Option<String>,
    /// VaR percentile (5 = 5%)
    #[arg(long)]
    percentile: Option<f64>,
}

#[derive(Subcommand)]
enum HoldingsAction {
    /// List holdings and NAV history length
    List,
    /// Add or replace a holding
    Add {
        /// Asset ISIN
        #[arg(short, long)]
        isin: String,
        /// Portfolio weight (0.25 = 25%)
        #[arg(short, long)]
        weight: f64,
        /// Number of shares held
        #[arg(short = 'n', long)]
        quantity: f64,
    },
    /// Remove a holding
    Remove {
        /// Asset ISIN
        #[arg(short, long)]
        isin: String,
    },
    /// Replace the NAV return history
    Nav {
        /// Comma-separated returns, oldest first
        #[arg(short, long)]
        returns: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match RiskConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Snapshot { inputs } => handle_snapshot(config, inputs),
            Commands::Var { inputs } => handle_var(config, inputs),
            Commands::Holdings { holdings, action } => {
                handle_holdings(holdings.or(config.holdings_file), action)
            }
        },
        Err(e) => error_json(e),
    };

    println!("{}", output);
}

fn to_json<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|e| {
        format!(
            "{{\"ok\": false, \"error\": \"failed to serialize response: {}\"}}",
            e
        )
    })
}

fn error_json(error: impl ToString) -> String {
    to_json(&ApiResponse::<()>::err(error.to_string()))
}

/// Merge command-line overrides into the loaded configuration.
fn apply_inputs(mut config: RiskConfig, inputs: RiskInputs) -> navrisk_core::Result<RiskConfig> {
    if let Some(rate) = inputs.risk_free_rate {
        config.risk_free_rate = rate;
    }
    if let Some(lookback) = inputs.lookback {
        config.lookback_days = lookback;
    }
    if let Some(path) = inputs.holdings {
        config.holdings_file = Some(path);
    }
    if let Some(path) = inputs.market_data {
        config.market_data_file = Some(path);
    }
    if let Some(method) = inputs.method {
        config.var_method = method.parse::<VarMethod>()?;
    }
    if let Some(percentile) = inputs.percentile {
        config.var_percentile = percentile;
    }
    config.validate()?;
    Ok(config)
}

fn load_inputs(
    config: RiskConfig,
    inputs: RiskInputs,
) -> navrisk_core::Result<(RiskConfig, HoldingsStore, MarketDataStore)> {
    let config = apply_inputs(config, inputs)?;
    let holdings = HoldingsStore::load(config.holdings_file.as_deref())?;
    let market_path = config.market_data_file.clone().ok_or_else(|| {
        navrisk_core::Error::InvalidOperation(
            "No market data file: pass --market-data or set market_data_file".to_string(),
        )
    })?;
    let market = MarketDataStore::load(market_path)?;
    Ok((config, holdings, market))
}

fn handle_snapshot(config: RiskConfig, inputs: RiskInputs) -> String {
    let result = load_inputs(config, inputs).and_then(|(config, holdings, market)| {
        RiskSnapshot::with_params(&config.snapshot_params(), &holdings, &market, &market)
    });

    match result {
        Ok(snapshot) => to_json(&ApiResponse::ok(snapshot)),
        Err(e) => error_json(e),
    }
}

fn handle_var(config: RiskConfig, inputs: RiskInputs) -> String {
    let result = load_inputs(config, inputs).and_then(|(config, holdings, market)| {
        let var = navrisk_core::historical_value_at_risk(
            holdings.holdings(),
            &market,
            config.lookback_days,
            config.var_method,
            config.var_percentile,
        )?;
        Ok(json!({
            "method": config.var_method,
            "percentile": config.var_percentile,
            "lookback_days": config.lookback_days,
            "value_at_risk": var,
        }))
    });

    match result {
        Ok(data) => to_json(&ApiResponse::ok(data)),
        Err(e) => error_json(e),
    }
}

fn handle_holdings(path: Option<PathBuf>, action: HoldingsAction) -> String {
    let mut store = match HoldingsStore::load(path.as_deref()) {
        Ok(store) => store,
        Err(e) => return error_json(e),
    };

    match action {
        HoldingsAction::List => to_json(&ApiResponse::ok(json!({
            "holdings": store.holdings(),
            "holding_count": store.holdings().len(),
            "total_weight": store.total_weight(),
            "nav_returns": store.nav_returns().len(),
            "updated_at": store.get().updated_at,
        }))),
        HoldingsAction::Add {
            isin,
            weight,
            quantity,
        } => {
            let (holding, was_update) = store.add_holding(&isin, weight, quantity);
            if let Err(e) = store.save() {
                return error_json(e);
            }
            to_json(&ApiResponse::ok(json!({
                "holding": holding,
                "action": if was_update { "updated" } else { "added" },
            })))
        }
        HoldingsAction::Remove { isin } => match store.remove_holding(&isin) {
            Ok(removed) => {
                if let Err(e) = store.save() {
                    return error_json(e);
                }
                to_json(&ApiResponse::ok(json!({ "removed": removed })))
            }
            Err(e) => error_json(e),
        },
        HoldingsAction::Nav { returns } => {
            let parsed: Result<Vec<f64>, _> = returns
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<f64>())
                .collect();
            let nav_returns = match parsed {
                Ok(values) => values,
                Err(e) => return error_json(format!("Invalid NAV return: {}", e)),
            };

            let count = nav_returns.len();
            store.set_nav_returns(nav_returns);
            if let Err(e) = store.save() {
                return error_json(e);
            }
            to_json(&ApiResponse::ok(json!({ "nav_returns": count })))
        }
    }
}
