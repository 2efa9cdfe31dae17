use anyhow::Result;
use clap::Subcommand;

use crate::{context::Context, seed, storage::SqliteStorage};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Load demo users and books",
        long_about = "Insert the demo accounts (admin/1234, user/1234) and a handful of books. Rows that already exist are left untouched."
    )]
    Seed,
}

impl Command {
    pub fn run(&self, ctx: &Context, storage: &SqliteStorage) -> Result<()> {
        match self {
            Command::Seed => {
                log::info!("🌱 Seeding {}", ctx.db_path().display());
                let report = seed::run(storage)?;
                log::info!(
                    "🌱 Seed done: {} users and {} books inserted",
                    report.users_inserted,
                    report.books_inserted
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageRead;
    use tempfile::TempDir;

    #[test]
    fn seed_command_fills_the_configured_database() {
        let dir = TempDir::new().unwrap();
        let ctx = Context {
            data_dir: dir.path().to_path_buf(),
            reset: false,
            log_file: None,
            api_listen: "127.0.0.1:0".parse().unwrap(),
            cors_origin: "http://localhost:4200".to_string(),
        };
        let storage = SqliteStorage::new(ctx.db_path());
        storage.init().unwrap();

        Command::Seed.run(&ctx, &storage).unwrap();

        assert_eq!(storage.count_users().unwrap(), 2);
        assert!(ctx.db_path().exists());
    }
}
