use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use super::StorageBackend;

#[derive(Debug, Parser)]
#[command(name = "postboard", version, about = "Posts API server for a small blog")]
pub struct Cli {
    /// Extra configuration file, layered over `config/default` and `postboard.*`.
    #[arg(long, env = "POSTBOARD_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; a bare invocation serves with no overrides.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the posts API.
    Serve(ServeArgs),
    /// Bring the Postgres schema up to date and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// trace, debug, info, warn or error.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub log_json: Option<bool>,

    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    #[arg(long, value_name = "COUNT")]
    pub max_connections: Option<u32>,

    /// Where posts are kept. Defaults to postgres when a database url is set.
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub storage: Option<StorageBackend>,

    /// Request body cap in bytes, inline images included.
    #[arg(long, value_name = "BYTES")]
    pub max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MigrateArgs {
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,
}
