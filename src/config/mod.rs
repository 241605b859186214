//! Typed settings. Sources in rising precedence: `config/default.*`,
//! `postboard.*`, `--config-file`, `POSTBOARD__SECTION__KEY` env vars, CLI flags.

mod cli;

use std::{
    net::{SocketAddr, ToSocketAddrs},
    num::{NonZeroU32, NonZeroU64},
};

use clap::{Parser, ValueEnum};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{Cli, Command, MigrateArgs, ServeArgs};

const ENV_PREFIX: &str = "POSTBOARD";
const BASE_FILE: &str = "config/default";
const LOCAL_FILE: &str = "postboard";

pub const DEFAULT_MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub api: ApiSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub max_body_bytes: NonZeroU64,
}

impl ApiSettings {
    /// The cap as handed to axum. Values past `usize` are refused while loading.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_body_bytes.get()).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read configuration: {0}")]
    Source(#[from] ConfigError),
    #[error("`{key}` is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> LoadError {
    LoadError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Parse the process arguments and resolve settings for them.
pub fn load_with_cli() -> Result<(Cli, Settings), LoadError> {
    let cli = Cli::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

pub fn load(cli: &Cli) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(BASE_FILE).required(false))
        .add_source(File::with_name(LOCAL_FILE).required(false));
    if let Some(path) = &cli.config_file {
        builder = builder.add_source(File::from(path.as_path()));
    }
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    resolve(builder, &cli.command())
}

/// Lay the command's flags over `builder` and validate the result.
fn resolve(builder: ConfigBuilder<DefaultState>, command: &Command) -> Result<Settings, LoadError> {
    let builder = match command {
        Command::Serve(args) => builder
            .set_override_option("server.host", args.host.clone())?
            .set_override_option("server.port", args.port.map(i64::from))?
            .set_override_option("logging.level", args.log_level.clone())?
            .set_override_option("logging.json", args.log_json)?
            .set_override_option("database.url", args.database_url.clone())?
            .set_override_option("database.max_connections", args.max_connections.map(i64::from))?
            .set_override_option("storage.backend", args.storage.map(StorageBackend::as_str))?
            .set_override_option("api.max_body_bytes", args.max_body_bytes)?,
        Command::Migrate(args) => {
            builder.set_override_option("database.url", args.database_url.clone())?
        }
    };

    let layered: Layered = builder.build()?.try_deserialize()?;
    layered.validate()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Layered {
    server: ServerSection,
    logging: LoggingSection,
    database: DatabaseSection,
    storage: StorageSection,
    api: ApiSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServerSection {
    host: String,
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LoggingSection {
    level: String,
    json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DatabaseSection {
    url: Option<String>,
    max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 8,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageSection {
    backend: Option<StorageBackend>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ApiSection {
    max_body_bytes: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Layered {
    fn validate(self) -> Result<Settings, LoadError> {
        let Self {
            server,
            logging,
            database,
            storage,
            api,
        } = self;

        if server.port == 0 {
            return Err(invalid("server.port", "must be non-zero"));
        }
        let addr = (server.host.as_str(), server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| invalid("server.host", format!("cannot resolve `{}`", server.host)))?;

        let level = logging
            .level
            .parse::<LevelFilter>()
            .map_err(|err| invalid("logging.level", err.to_string()))?;
        let format = if logging.json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };

        let url = database
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let max_connections = NonZeroU32::new(database.max_connections)
            .ok_or_else(|| invalid("database.max_connections", "must be non-zero"))?;

        let backend = match (storage.backend, url.is_some()) {
            (Some(StorageBackend::Postgres), false) => {
                return Err(invalid("storage.backend", "postgres needs database.url"));
            }
            (Some(backend), _) => backend,
            (None, true) => StorageBackend::Postgres,
            (None, false) => StorageBackend::Memory,
        };

        let max_body_bytes = NonZeroU64::new(api.max_body_bytes)
            .ok_or_else(|| invalid("api.max_body_bytes", "must be non-zero"))?;
        if usize::try_from(max_body_bytes.get()).is_err() {
            return Err(invalid("api.max_body_bytes", "too large for this platform"));
        }

        Ok(Settings {
            server: ServerSettings { addr },
            logging: LoggingSettings { level, format },
            database: DatabaseSettings {
                url,
                max_connections,
            },
            storage: StorageSettings { backend },
            api: ApiSettings { max_body_bytes },
        })
    }
}
