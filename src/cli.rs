//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::cached_data_port::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{Analysis, AnalysisConfig, Analyzer};
use crate::domain::bar_store::BarStore;
use crate::domain::config_validation::{validate_analysis_config, validate_data_config};
use crate::domain::error::TrendcastError;
use crate::domain::forecast::{Aggressiveness, FitProfile, ForecastConfig, ModelChoice};
use crate::domain::indicator::IndicatorConfig;
use crate::domain::replay::{self, ReplayReport};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, Interval, SourceKind};

/// Bars the replay command analyzes before its first scored forecast.
pub const DEFAULT_WARMUP: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "trendcast", about = "Stock trend analysis and short-horizon forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one analysis cycle and print signal, action and forecast
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long)]
        aggressive: bool,
    },
    /// Walk forward through history, scoring each next-day forecast
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, default_value_t = DEFAULT_WARMUP)]
        warmup: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Where bars come from and how they are cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceConfig {
    pub kind: SourceKind,
    /// CSV directory or SQLite database file, depending on `kind`.
    pub path: PathBuf,
    pub pool_size: u32,
    pub lookback_days: u32,
    pub interval: Interval,
    pub cache_ttl: Duration,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            symbol,
            horizon,
            aggressive,
        } => run_analyze(&config, symbol.as_deref(), horizon, aggressive),
        Command::Replay {
            config,
            symbol,
            warmup,
        } => run_replay(&config, symbol.as_deref(), warmup),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: TrendcastError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_data_source(config: &dyn ConfigPort) -> Result<DataSourceConfig, TrendcastError> {
    let path = config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| TrendcastError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let lookback = config.get_int("data", "lookback_days", 730);
    let lookback_days = u32::try_from(lookback).map_err(|_| TrendcastError::ConfigInvalid {
        section: "data".into(),
        key: "lookback_days".into(),
        reason: format!("{} is out of range", lookback),
    })?;
    let interval = match config.get_string("data", "interval") {
        Some(s) => s.parse()?,
        None => Interval::Daily,
    };

    let kind = match config.get_string("data", "source") {
        Some(s) => s.parse()?,
        None => SourceKind::Csv,
    };

    Ok(DataSourceConfig {
        kind,
        path: PathBuf::from(path.trim()),
        pool_size: u32::try_from(config.get_int("sqlite", "pool_size", 4)).unwrap_or(4),
        lookback_days,
        interval,
        cache_ttl: Duration::from_secs(config.get_usize("data", "cache_ttl_secs", 3600) as u64),
    })
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, TrendcastError> {
    let sma_period = config.get_usize("indicators", "sma_period", 20);
    let indicators = IndicatorConfig {
        sma_period,
        rsi_period: config.get_usize("indicators", "rsi_period", 14),
        bollinger_period: config.get_usize("indicators", "bollinger_period", sma_period),
        bollinger_k: config.get_double("indicators", "bollinger_k", 2.0),
    };

    let defaults = ForecastConfig::default();
    let model = match config.get_string("forecast", "model") {
        Some(s) => s.parse::<ModelChoice>()?,
        None => defaults.model,
    };
    let forecast = ForecastConfig {
        horizon: config.get_usize("forecast", "horizon", defaults.horizon),
        model,
        low: FitProfile {
            degree: config.get_usize("forecast", "degree", defaults.low.degree),
            weight_floor: config.get_double("forecast", "weight_floor", defaults.low.weight_floor),
        },
        high: FitProfile {
            degree: config.get_usize("forecast", "degree_high", defaults.high.degree),
            weight_floor: config.get_double(
                "forecast",
                "weight_floor_high",
                defaults.high.weight_floor,
            ),
        },
        band_window: config.get_usize("forecast", "band_window", defaults.band_window),
        season_length: config.get_usize("forecast", "season_length", defaults.season_length),
    };

    Ok(AnalysisConfig {
        indicators,
        forecast,
        threshold_pct: config.get_double("calibration", "threshold_pct", 5.0),
    })
}

pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Option<String> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

fn resolve_aggressiveness(flag: bool, config: &dyn ConfigPort) -> Aggressiveness {
    if flag || config.get_bool("forecast", "aggressive", false) {
        Aggressiveness::High
    } else {
        Aggressiveness::Low
    }
}

/// Load and validate everything a command needs from the config file.
fn prepare(
    config_path: &Path,
    symbol_override: Option<&str>,
) -> Result<(FileConfigAdapter, DataSourceConfig, AnalysisConfig, String), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    validate_data_config(&adapter).map_err(fail)?;
    validate_analysis_config(&adapter).map_err(fail)?;
    let source = build_data_source(&adapter).map_err(fail)?;
    let analysis = build_analysis_config(&adapter).map_err(fail)?;

    let symbol = resolve_symbol(symbol_override, &adapter).ok_or_else(|| {
        fail(TrendcastError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
    })?;
    Ok((adapter, source, analysis, symbol))
}

/// Open the configured bar source behind a TTL cache.
pub fn open_data_port(source: &DataSourceConfig) -> Result<Box<dyn DataPort>, TrendcastError> {
    match source.kind {
        SourceKind::Csv => Ok(Box::new(CachedDataPort::new(
            CsvAdapter::new(source.path.clone()),
            source.cache_ttl,
        ))),
        SourceKind::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;

                let adapter = SqliteAdapter::open(&source.path, source.pool_size)?;
                Ok(Box::new(CachedDataPort::new(adapter, source.cache_ttl)))
            }

            #[cfg(not(feature = "sqlite"))]
            {
                Err(TrendcastError::invalid(
                    "data",
                    "source",
                    "sqlite feature is required for source = sqlite",
                ))
            }
        }
    }
}

fn run_analyze(
    config_path: &Path,
    symbol_override: Option<&str>,
    horizon: Option<usize>,
    aggressive: bool,
) -> ExitCode {
    let (adapter, source, mut config, symbol) = match prepare(config_path, symbol_override) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if let Some(h) = horizon {
        config.forecast.horizon = h;
    }
    let aggressiveness = resolve_aggressiveness(aggressive, &adapter);

    eprintln!(
        "Fetching {} ({} days, {})",
        symbol, source.lookback_days, source.interval
    );
    let port = match open_data_port(&source) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let mut store = BarStore::new();
    let series = match store.load(port.as_ref(), &symbol, source.lookback_days, source.interval) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let analyzer = Analyzer::new(config);
    match analyzer.run_cycle(series, aggressiveness) {
        Ok(analysis) => {
            print!("{}", format_analysis(&symbol, &analysis));
            match analysis.forecast {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => fail(e),
            }
        }
        Err(e) => fail(e),
    }
}

fn run_replay(config_path: &Path, symbol_override: Option<&str>, warmup: usize) -> ExitCode {
    let (_adapter, source, config, symbol) = match prepare(config_path, symbol_override) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let port = match open_data_port(&source) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let mut store = BarStore::new();
    let series = match store.load(port.as_ref(), &symbol, source.lookback_days, source.interval) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Replaying {}: {} bars, warmup {}",
        symbol,
        series.len(),
        warmup
    );
    match replay::replay(series, config, warmup) {
        Ok(report) => {
            print!("{}", format_replay(&symbol, &report));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_analysis_config(&adapter) {
        return fail(e);
    }
    let config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nIndicators:");
    for indicator in config.indicators.indicator_types() {
        eprintln!("  {}", indicator);
    }
    eprintln!("\nForecast:");
    eprintln!("  model:     {:?}", config.forecast.model);
    eprintln!("  horizon:   {}", config.forecast.horizon);
    eprintln!(
        "  low:       degree {}, weight floor {}",
        config.forecast.low.degree, config.forecast.low.weight_floor
    );
    eprintln!(
        "  high:      degree {}, weight floor {}",
        config.forecast.high.degree, config.forecast.high.weight_floor
    );
    eprintln!("  threshold: {}%", config.threshold_pct);
    match resolve_symbol(None, &adapter) {
        Some(s) => eprintln!("\nSymbol: {}", s),
        None => eprintln!("\nSymbol: (none, pass --symbol)"),
    }

    eprintln!("\nConfig is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let source = match build_data_source(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let port = match open_data_port(&source) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    match port.list_symbols() {
        Ok(symbols) => {
            for s in &symbols {
                println!("{}", s);
            }
            eprintln!("{} symbols", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Human-readable summary of one analysis cycle.
pub fn format_analysis(symbol: &str, analysis: &Analysis) -> String {
    let mut out = String::new();
    let fmt_opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{:.2}", x));

    let _ = writeln!(out, "=== {} ===", symbol);
    let _ = writeln!(out, "Last Close:   {:.2}", analysis.last_close);
    if let Some(row) = analysis.latest_indicators() {
        let _ = writeln!(out, "SMA:          {}", fmt_opt(row.sma));
        let _ = writeln!(out, "RSI:          {}", fmt_opt(row.rsi));
        match row.bollinger {
            Some(b) => {
                let _ = writeln!(
                    out,
                    "Bollinger:    {:.2} / {:.2} / {:.2}",
                    b.lower, b.middle, b.upper
                );
            }
            None => {
                let _ = writeln!(out, "Bollinger:    n/a");
            }
        }
    }
    let _ = writeln!(out, "Signal:       {}", analysis.signal);
    let _ = writeln!(out, "Action:       {}", analysis.action);

    match &analysis.forecast {
        Ok(forecast) => {
            let _ = writeln!(
                out,
                "\n=== Forecast ({}, degree {}, {} aggressiveness) ===",
                forecast.model_kind, forecast.fit_degree, analysis.aggressiveness
            );
            let upper = forecast.upper();
            let lower = forecast.lower();
            for (i, date) in forecast.target_dates().iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {}  {:>10.2}  [{:.2}, {:.2}]",
                    date, forecast.values[i], lower[i], upper[i]
                );
            }
        }
        Err(e) => {
            let _ = writeln!(out, "\n=== Forecast unavailable: {} ===", e);
        }
    }

    for record in &analysis.reconciled {
        let flag = if record.recalibration_triggered {
            "  recalibration advised"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "Calibration {}: predicted {:.2}, actual {:.2}, error {:.2}%{}",
            record.date,
            record.predicted_prior_close,
            record.actual_close,
            record.error_pct,
            flag
        );
    }
    out
}

/// Human-readable summary of a replay run.
pub fn format_replay(symbol: &str, report: &ReplayReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Replay: {} ===", symbol);
    let _ = writeln!(out, "Cycles:        {}", report.cycles);
    let _ = writeln!(out, "Scored:        {}", report.records.len());
    let _ = writeln!(out, "Triggered:     {}", report.triggered_count());
    let _ = writeln!(out, "Escalations:   {}", report.escalations);
    match report.mean_error_pct {
        Some(m) => {
            let _ = writeln!(out, "Mean Error:    {:.2}%", m);
        }
        None => {
            let _ = writeln!(out, "Mean Error:    n/a");
        }
    }
    let _ = writeln!(out, "Final Mode:    {}", report.final_aggressiveness);
    out
}
