//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store_adapter::{
    DEFAULT_POSITIONS_PATH, DEFAULT_SETTINGS_PATH, JsonFileStore,
};
use crate::domain::app_config::{
    AppConfig, DEFAULT_BINANCE_URL, DEFAULT_LISTEN, DEFAULT_TIMEOUT_SECS,
    DEFAULT_UTC_OFFSET_MINUTES, MAX_KLINES_PER_REQUEST, PriceSource, StorageBackend,
};
use crate::domain::check::{PositionCheck, check_position};
use crate::domain::config_validation::validate_config;
use crate::domain::error::PosCheckError;
use crate::domain::report::{format_time, live_status, outcome_report, saved_summary};
use crate::domain::saved_position::NewPosition;
use crate::domain::validation::{
    PositionInput, ensure_checkable, parse_open_time, validate_position,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::position_store_port::PositionStorePort;
use crate::ports::price_data_port::PriceDataPort;

#[derive(Parser, Debug)]
#[command(name = "poscheck", about = "Check leveraged crypto positions against 1-minute price history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a position from its open time until now
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        position: PositionArgs,
        /// Check a saved position instead of the position flags
        #[arg(long, conflicts_with_all = ["symbol", "entry", "target1", "target2", "stop", "leverage", "open_time"])]
        id: Option<u64>,
        /// Evaluation end time (YYYY-MM-DD HH:MM, display offset); defaults to now
        #[arg(long)]
        now: Option<String>,
    },
    /// Save a position for later checks
    Save {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        position: PositionArgs,
        #[arg(long)]
        name: Option<String>,
    },
    /// List saved positions
    List {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Delete a saved position
    Delete {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        id: u64,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Position fields as raw strings; omitted flags fall back to the last
/// saved settings.
#[derive(Args, Debug, Clone, Default)]
pub struct PositionArgs {
    #[arg(long)]
    pub symbol: Option<String>,
    #[arg(long)]
    pub entry: Option<String>,
    #[arg(long)]
    pub target1: Option<String>,
    #[arg(long)]
    pub target2: Option<String>,
    #[arg(long)]
    pub stop: Option<String>,
    #[arg(long)]
    pub leverage: Option<String>,
    /// YYYY-MM-DD HH:MM in the display offset
    #[arg(long)]
    pub open_time: Option<String>,
}

impl PositionArgs {
    pub fn to_input(&self) -> PositionInput {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        PositionInput {
            symbol: field(&self.symbol),
            entry_price: field(&self.entry),
            target1: field(&self.target1),
            target2: field(&self.target2),
            stop_price: field(&self.stop),
            leverage: field(&self.leverage),
            open_time: field(&self.open_time),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Check {
            config,
            position,
            id,
            now,
        } => run_check(config.as_deref(), &position, id, now.as_deref()),
        Command::Save {
            config,
            position,
            name,
        } => run_save(config.as_deref(), &position, name),
        Command::List { config } => run_list(config.as_deref()),
        Command::Delete { config, id } => run_delete(config.as_deref(), id),
        Command::Serve { config } => run_serve(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

/// Loads and validates the INI file; no path means all defaults.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, PosCheckError> {
    let config = match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_config(&config)?;
    Ok(config)
}

pub fn build_app_config(config: &dyn ConfigPort) -> Result<AppConfig, PosCheckError> {
    let minutes = config.get_int("display", "utc_offset_minutes", DEFAULT_UTC_OFFSET_MINUTES);
    let display_offset = i32::try_from(minutes * 60)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| PosCheckError::ConfigInvalid {
            section: "display".to_string(),
            key: "utc_offset_minutes".to_string(),
            reason: format!("{} is not a valid UTC offset", minutes),
        })?;

    let price_source = match config.get_string_or("prices", "csv_dir", "") {
        dir if !dir.is_empty() => PriceSource::Csv { dir: dir.into() },
        _ => {
            let max = MAX_KLINES_PER_REQUEST as i64;
            PriceSource::Binance {
                base_url: config.get_string_or("binance", "base_url", DEFAULT_BINANCE_URL),
                limit: config.get_int("binance", "limit", max).clamp(1, max) as usize,
                timeout_secs: config
                    .get_int("binance", "timeout_secs", DEFAULT_TIMEOUT_SECS)
                    .max(1) as u64,
            }
        }
    };

    let backend = config.get_string_or("storage", "backend", "json").to_lowercase();
    let storage = match backend.as_str() {
        "json" => StorageBackend::Json {
            settings_path: config
                .get_string_or("storage", "settings_path", DEFAULT_SETTINGS_PATH)
                .into(),
            positions_path: config
                .get_string_or("storage", "positions_path", DEFAULT_POSITIONS_PATH)
                .into(),
        },
        "sqlite" => {
            let path = config.get_string_or("sqlite", "path", "");
            if path.is_empty() {
                return Err(PosCheckError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
            StorageBackend::Sqlite {
                path: path.into(),
                pool_size: config.get_int("sqlite", "pool_size", 4).max(1) as u32,
            }
        }
        other => {
            return Err(PosCheckError::ConfigInvalid {
                section: "storage".to_string(),
                key: "backend".to_string(),
                reason: format!("unknown backend '{}'", other),
            });
        }
    };

    Ok(AppConfig {
        price_source,
        storage,
        display_offset,
        listen: config.get_string_or("web", "listen", DEFAULT_LISTEN),
    })
}

pub fn open_store(
    app: &AppConfig,
) -> Result<Box<dyn PositionStorePort + Send + Sync>, PosCheckError> {
    match &app.storage {
        StorageBackend::Json {
            settings_path,
            positions_path,
        } => Ok(Box::new(JsonFileStore::new(
            settings_path.clone(),
            positions_path.clone(),
        ))),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite { path, pool_size } => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::open(path, *pool_size)?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite { .. } => Err(PosCheckError::ConfigInvalid {
            section: "storage".to_string(),
            key: "backend".to_string(),
            reason: "sqlite feature is required for the sqlite backend".to_string(),
        }),
    }
}

pub fn open_price_source(
    app: &AppConfig,
) -> Result<Box<dyn PriceDataPort + Send + Sync>, PosCheckError> {
    match &app.price_source {
        PriceSource::Csv { dir } => Ok(Box::new(CsvAdapter::new(dir.clone()))),
        #[cfg(feature = "binance")]
        PriceSource::Binance {
            base_url,
            limit,
            timeout_secs,
        } => Ok(Box::new(crate::adapters::binance_adapter::BinanceAdapter::new(
            base_url,
            *limit,
            std::time::Duration::from_secs(*timeout_secs),
        )?)),
        #[cfg(not(feature = "binance"))]
        PriceSource::Binance { .. } => Err(PosCheckError::ConfigInvalid {
            section: "prices".to_string(),
            key: "csv_dir".to_string(),
            reason: "binance feature is required unless csv_dir is set".to_string(),
        }),
    }
}

/// Flags first, then the last saved settings, then built-in defaults.
pub fn resolve_input(
    args: &PositionArgs,
    stored: Option<PositionInput>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> PositionInput {
    let defaults = PositionInput::with_defaults(now, offset);
    args.to_input()
        .or_else(&stored.unwrap_or_default().or_else(&defaults))
}

fn print_check(check: &PositionCheck, offset: FixedOffset) {
    let report = outcome_report(check, offset);
    println!("{}", report.title);
    println!("{}", report.detail);
    println!("{}", live_status(check).text);
}

fn run_check(
    config_path: Option<&Path>,
    args: &PositionArgs,
    id: Option<u64>,
    now: Option<&str>,
) -> Result<(), PosCheckError> {
    let config = load_config(config_path)?;
    let app = build_app_config(&config)?;
    let offset = app.display_offset;
    let store = open_store(&app)?;

    let now = match now {
        Some(value) => parse_open_time(value, offset)?,
        None => Utc::now(),
    };

    let (input, position) = match id {
        Some(id) => {
            let saved = store
                .get_position(id)?
                .ok_or(PosCheckError::PositionNotFound { id })?;
            eprintln!("Checking saved position {} ({})", saved.id, saved.name);
            let position = saved.to_position();
            ensure_checkable(&position, now)?;
            (PositionInput::from_position(&position, offset), position)
        }
        None => {
            let input = resolve_input(args, store.load_settings()?, now, offset);
            let position = validate_position(&input, now, offset)?;
            (input, position)
        }
    };
    store.save_settings(&input)?;

    let source = open_price_source(&app)?;
    eprintln!(
        "Fetching 1m bars for {} from {} to {}",
        position.symbol,
        format_time(position.open_time, offset),
        format_time(now, offset)
    );
    let check = check_position(source.as_ref(), &position, now)?;
    eprintln!("Received {} bars", check.bars.len());
    if check.bars.len() >= source.max_bars() {
        eprintln!(
            "warning: result capped at {} bars; later price action is not covered",
            source.max_bars()
        );
    }

    print_check(&check, offset);
    Ok(())
}

fn run_save(
    config_path: Option<&Path>,
    args: &PositionArgs,
    name: Option<String>,
) -> Result<(), PosCheckError> {
    let config = load_config(config_path)?;
    let app = build_app_config(&config)?;
    let offset = app.display_offset;
    let store = open_store(&app)?;
    let now = Utc::now();

    let input = resolve_input(args, store.load_settings()?, now, offset);
    let position = validate_position(&input, now, offset)?;
    store.save_settings(&input)?;

    let saved = store.add_position(NewPosition::new(position, name, now, offset))?;
    println!("Saved position {}: {}", saved.id, saved.name);
    Ok(())
}

fn run_list(config_path: Option<&Path>) -> Result<(), PosCheckError> {
    let config = load_config(config_path)?;
    let app = build_app_config(&config)?;
    let store = open_store(&app)?;

    let positions = store.list_positions()?;
    if positions.is_empty() {
        eprintln!("No saved positions");
        return Ok(());
    }
    for saved in &positions {
        println!(
            "{:>4}  {}  {}",
            saved.id,
            saved.name,
            saved_summary(saved, app.display_offset)
        );
    }
    Ok(())
}

fn run_delete(config_path: Option<&Path>, id: u64) -> Result<(), PosCheckError> {
    let config = load_config(config_path)?;
    let app = build_app_config(&config)?;
    let store = open_store(&app)?;

    if !store.delete_position(id)? {
        return Err(PosCheckError::PositionNotFound { id });
    }
    println!("Deleted position {}", id);
    Ok(())
}

fn run_serve(config_path: Option<&Path>) -> Result<(), PosCheckError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;

        let config = load_config(config_path)?;
        let app = build_app_config(&config)?;

        let addr: SocketAddr = app.listen.parse().map_err(|_| PosCheckError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("'{}' is not a socket address", app.listen),
        })?;

        // Blocking HTTP clients must be built and dropped outside the runtime.
        let prices: Arc<dyn PriceDataPort + Send + Sync> = Arc::from(open_price_source(&app)?);
        let store: Arc<dyn PositionStorePort + Send + Sync> = Arc::from(open_store(&app)?);

        let router = build_router(AppState {
            prices: Arc::clone(&prices),
            store,
            display_offset: app.display_offset,
        });

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("Web server listening on http://{}", addr);
            eprintln!("Starting web server on {}", addr);
            axum::serve(listener, router).await
        })?;
        drop(prices);
        Ok(())
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(PosCheckError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: "web feature is required for serve".to_string(),
        })
    }
}
