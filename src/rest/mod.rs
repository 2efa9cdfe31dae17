use std::net::SocketAddr;

use anyhow::Context as _;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::storage::Storage;

pub mod error;
pub mod extract;
mod handlers;
pub mod models;

use handlers::{accounts, auth, books, categories, entries, system, users};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub storage: S,
    pub started_at: std::time::SystemTime,
}

pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("invalid CORS origin {origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(
    storage: S,
    cors_origin: &str,
) -> anyhow::Result<Router> {
    let state = AppState {
        storage,
        started_at: std::time::SystemTime::now(),
    };

    let app = Router::new()
        .route("/", get(system::index))
        .route("/health", get(system::health::<S>))
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users::<S>))
        .route(
            "/users/:id",
            get(users::get_user::<S>).delete(users::delete_user::<S>),
        )
        .route("/users/:id/admin", patch(users::update_user_admin::<S>))
        .route(
            "/books",
            get(books::list_books::<S>).post(books::create_book::<S>),
        )
        .route(
            "/books/:id",
            get(books::get_book::<S>)
                .patch(books::update_book::<S>)
                .delete(books::delete_book::<S>),
        )
        .route("/books/:id/borrow", post(books::borrow_book::<S>))
        .route("/books/:id/return", post(books::return_book::<S>))
        .route(
            "/categories",
            get(categories::list_categories::<S>).post(categories::create_category::<S>),
        )
        .route(
            "/categories/:id",
            get(categories::get_category::<S>)
                .put(categories::update_category::<S>)
                .delete(categories::delete_category::<S>),
        )
        .route(
            "/contas",
            get(accounts::list_accounts::<S>).post(accounts::create_account::<S>),
        )
        .route(
            "/contas/:id",
            get(accounts::get_account::<S>)
                .put(accounts::update_account::<S>)
                .delete(accounts::delete_account::<S>),
        )
        .route(
            "/lancamentos",
            get(entries::list_entries::<S>).post(entries::create_entry::<S>),
        )
        .route(
            "/lancamentos/:id",
            get(entries::get_entry::<S>)
                .put(entries::update_entry::<S>)
                .delete(entries::delete_entry::<S>),
        )
        .fallback(system::not_found)
        .layer(cors_layer(cors_origin)?)
        .with_state(state);

    Ok(app)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    cors_origin: String,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(storage, &cors_origin)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    log::info!("🔓 CORS origin: {}", cors_origin);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
