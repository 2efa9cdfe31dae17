use clap::Parser;
use std::env;

use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Library lending and personal finance REST backend",
    long_about = "Serves a JSON API for users, books, categories, accounts and ledger entries backed by a local SQLite database.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "FINTRACK_DATA_DIR",
        default_value = ".fintrack/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "log-file",
        env = "FINTRACK_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "FINTRACK_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:3000",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "cors-origin",
        env = "FINTRACK_CORS_ORIGIN",
        value_name = "URL",
        default_value = "http://localhost:4200",
        help = "Browser origin allowed to call the API"
    )]
    pub cors_origin: String,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    let loaded = dotenvy::from_filename(&dotenv_path).is_ok();

    let cli = Cli::parse();
    if loaded {
        log::info!("📄 Loaded env from {}", dotenv_path);
    }
    cli
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["fintrack"]).unwrap();
        assert_eq!(cli.data_dir, ".fintrack/");
        assert_eq!(cli.api_listen.to_string(), "127.0.0.1:3000");
        assert_eq!(cli.cors_origin, "http://localhost:4200");
        assert!(!cli.reset);
        assert!(cli.cmd.is_none());
    }

    #[test]
    fn parses_seed_subcommand_and_flags() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "--data-dir",
            "/tmp/ft",
            "--reset",
            "--api-listen",
            "0.0.0.0:8080",
            "seed",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, "/tmp/ft");
        assert!(cli.reset);
        assert_eq!(cli.api_listen.port(), 8080);
        assert!(matches!(cli.cmd, Some(Command::Seed)));
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["fintrack", "--api-listen", "nowhere"]).is_err());
    }
}
