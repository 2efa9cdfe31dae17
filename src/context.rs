use std::{net::SocketAddr, path::PathBuf};

/// Runtime configuration resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub reset: bool,
    pub log_file: Option<PathBuf>,
    pub api_listen: SocketAddr,
    pub cors_origin: String,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            reset: cli.reset,
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            api_listen: cli.api_listen,
            cors_origin: cli.cors_origin.clone(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("fintrack.sqlite")
    }
}
