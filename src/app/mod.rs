mod wiring;

use crate::{cli, context, rest, storage::SqliteStorage};
use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

pub struct App {
    pub ctx: context::Context,
    pub storage: SqliteStorage,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::set_log_file(ctx.log_file.as_deref()).context("opening log file")?;
        log::info!("🚀 Starting fintrack");
        log::info!("📂 Data dir: {}", ctx.data_dir.display());

        let app = Self::from_context(ctx)?;
        Ok((app, cli))
    }

    pub fn from_context(ctx: context::Context) -> Result<Self> {
        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let storage = wiring::init_storage(&ctx)?;
        Ok(Self { ctx, storage })
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!("🌐 REST API: http://{}", app.ctx.api_listen);
    if let Some(path) = app.ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.display());
    }

    let shutdown = CancellationToken::new();

    let api_addr = app.ctx.api_listen;
    let cors_origin = app.ctx.cors_origin.clone();
    let rest_storage = app.storage.clone();
    let rest_shutdown = shutdown.clone();

    let mut rest_handle = tokio::spawn(async move {
        rest::serve(api_addr, rest_storage, cors_origin, rest_shutdown).await
    });

    let mut fatal_error: Option<anyhow::Error> = None;
    let mut rest_done = false;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Ctrl-C received, shutting down");
        }
        res = &mut rest_handle => {
            rest_done = true;
            match res {
                Ok(Ok(())) => log::warn!("REST server stopped unexpectedly"),
                Ok(Err(e)) => {
                    log::error!("REST server error: {:#}", e);
                    fatal_error = Some(e);
                }
                Err(e) => fatal_error = Some(e.into()),
            }
        }
    }

    shutdown.cancel();

    if !rest_done {
        match rest_handle.await {
            Ok(Err(e)) => {
                fatal_error.get_or_insert(e);
            }
            Err(e) => {
                fatal_error.get_or_insert(e.into());
            }
            Ok(Ok(())) => {}
        }
    }

    if let Some(e) = fatal_error {
        return Err(e);
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        cmd.run(&app.ctx, &app.storage)?;
        return Ok(());
    }

    run_daemon(app).await
}
