use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    rest::{
        error::ApiError,
        extract::{parse_id, AuthUser, JsonBody},
        models::{present, AccountEnvelope, AccountRequest, AccountResponse},
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
    types::NewAccount,
};

pub(crate) const ACCOUNT_NOT_FOUND: &str = "account not found";

pub async fn list_accounts<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.storage.list_accounts(user.id)?;
    Ok(Json(accounts.iter().map(AccountResponse::from).collect()))
}

pub async fn get_account<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = parse_id(&id)?;
    match state.storage.load_account(user.id, id)? {
        Some(account) => Ok(Json(AccountResponse::from(&account))),
        None => Err(ApiError::not_found(ACCOUNT_NOT_FOUND)),
    }
}

pub async fn create_account<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<AccountRequest>,
) -> Result<(StatusCode, Json<AccountEnvelope>), ApiError> {
    let description =
        present(body.descricao).ok_or_else(|| ApiError::bad_request("descricao is required"))?;
    let balance = body
        .saldo
        .ok_or_else(|| ApiError::bad_request("saldo is required"))?;
    let limit = body
        .limite
        .ok_or_else(|| ApiError::bad_request("limite is required"))?;

    let tx = state.storage.begin_tx()?;
    let account = tx.insert_account(&NewAccount {
        user_id: user.id,
        description,
        balance,
        limit,
    })?;
    tx.commit()?;

    log::info!("🏦 Account {} created for {}", account.id, user.username);
    Ok((
        StatusCode::CREATED,
        Json(AccountEnvelope {
            message: "account created",
            conta: AccountResponse::from(&account),
        }),
    ))
}

pub async fn update_account<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AccountRequest>,
) -> Result<Json<AccountEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    let mut account = tx
        .load_account(user.id, id)?
        .ok_or_else(|| ApiError::not_found(ACCOUNT_NOT_FOUND))?;

    if let Some(description) = body.descricao {
        account.description = description;
    }
    if let Some(balance) = body.saldo {
        account.balance = balance;
    }
    if let Some(limit) = body.limite {
        account.limit = limit;
    }
    tx.update_account(&account)?;
    tx.commit()?;

    Ok(Json(AccountEnvelope {
        message: "account updated",
        conta: AccountResponse::from(&account),
    }))
}

pub async fn delete_account<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if !tx.delete_account(user.id, id)? {
        return Err(ApiError::not_found(ACCOUNT_NOT_FOUND));
    }
    tx.commit()?;
    Ok(StatusCode::NO_CONTENT)
}
