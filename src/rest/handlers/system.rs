use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::{
    rest::{
        models::{ErrorResponse, HealthResponse},
        AppState,
    },
    storage::Storage,
};

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "fintrack API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": {
                "POST /auth/register": "register a new user (the first one becomes admin)",
                "POST /auth/login": "check credentials (auth required)"
            },
            "users": {
                "GET /users": "list users (admin only)",
                "GET /users/:id": "get a user (admin only)",
                "DELETE /users/:id": "delete a user (admin only)",
                "PATCH /users/:id/admin": "grant or revoke admin (admin only)"
            },
            "books": {
                "GET /books": "list books (auth required)",
                "GET /books/:id": "get a book (auth required)",
                "POST /books": "create a book (admin only)",
                "PATCH /books/:id": "update a book (admin only)",
                "DELETE /books/:id": "delete a book (admin only)",
                "POST /books/:id/borrow": "borrow a book (auth required)",
                "POST /books/:id/return": "return a book (auth required)"
            },
            "categories": {
                "GET /categories": "list own categories",
                "GET /categories/:id": "get an own category",
                "POST /categories": "create a category",
                "PUT /categories/:id": "rename a category",
                "DELETE /categories/:id": "delete a category"
            },
            "contas": {
                "GET /contas": "list own accounts",
                "GET /contas/:id": "get an own account",
                "POST /contas": "create an account",
                "PUT /contas/:id": "update an account",
                "DELETE /contas/:id": "delete an account"
            },
            "lancamentos": {
                "GET /lancamentos": "list own entries (filters: tipo, categoriaId, contaId, efetivado)",
                "GET /lancamentos/:id": "get an own entry with its installments",
                "POST /lancamentos": "create an entry, split into installments when parcelas >= 2",
                "PUT /lancamentos/:id": "update an entry",
                "DELETE /lancamentos/:id": "delete an entry and its installments"
            }
        }
    }))
}

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "endpoint not found".to_string(),
        }),
    )
}
