use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{accounts::ACCOUNT_NOT_FOUND, categories::CATEGORY_NOT_FOUND};
use crate::{
    ledger::{self, MAX_INSTALLMENTS},
    rest::{
        error::ApiError,
        extract::{parse_id, AuthUser, JsonBody},
        models::{
            parse_timestamp, present, CreateEntryRequest, EntryDetailResponse, EntryEnvelope,
            EntryQuery, EntryResponse, UpdateEntryRequest,
        },
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
    types::{Account, Category, EntryFilter, EntryKind, LedgerEntry, NewEntry},
};

const ENTRY_NOT_FOUND: &str = "entry not found";
const INVALID_KIND: &str = "tipo must be RECEITA or DESPESA";

fn parse_kind(raw: &str) -> Result<EntryKind, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(INVALID_KIND))
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, ApiError> {
    parse_timestamp(raw).ok_or_else(|| ApiError::bad_request("invalid date"))
}

fn parse_filter(query: EntryQuery) -> Result<EntryFilter, ApiError> {
    let kind = present(query.tipo).map(|raw| parse_kind(&raw)).transpose()?;
    let category_id = present(query.categoria_id)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request("categoriaId must be an integer"))
        })
        .transpose()?;
    let account_id = present(query.conta_id)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request("contaId must be an integer"))
        })
        .transpose()?;
    let settled = present(query.efetivado)
        .map(|raw| match raw.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ApiError::bad_request("efetivado must be true or false")),
        })
        .transpose()?;

    Ok(EntryFilter {
        kind,
        category_id,
        account_id,
        settled,
    })
}

/// Checks that linked rows exist and belong to the caller.
fn check_links<R: StorageRead + ?Sized>(
    storage: &R,
    user_id: i64,
    category_id: Option<i64>,
    account_id: Option<i64>,
) -> Result<(Option<Category>, Option<Account>), ApiError> {
    let category = match category_id {
        Some(id) => Some(
            storage
                .load_category(user_id, id)?
                .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?,
        ),
        None => None,
    };
    let account = match account_id {
        Some(id) => Some(
            storage
                .load_account(user_id, id)?
                .ok_or_else(|| ApiError::not_found(ACCOUNT_NOT_FOUND))?,
        ),
        None => None,
    };
    Ok((category, account))
}

/// Renders an entry with its category and account resolved.
fn render<R: StorageRead + ?Sized>(
    storage: &R,
    entry: &LedgerEntry,
) -> Result<EntryResponse, ApiError> {
    let category = match entry.category_id {
        Some(id) => storage.load_category(entry.user_id, id)?,
        None => None,
    };
    let account = match entry.account_id {
        Some(id) => storage.load_account(entry.user_id, id)?,
        None => None,
    };
    Ok(EntryResponse::new(entry, category.as_ref(), account.as_ref()))
}

pub async fn list_entries<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let filter = parse_filter(query)?;
    let entries = state.storage.list_entries(user.id, &filter)?;

    let categories: HashMap<i64, Category> = state
        .storage
        .list_categories(user.id)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let accounts: HashMap<i64, Account> = state
        .storage
        .list_accounts(user.id)?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let rendered = entries
        .iter()
        .map(|entry| {
            EntryResponse::new(
                entry,
                entry.category_id.and_then(|id| categories.get(&id)),
                entry.account_id.and_then(|id| accounts.get(&id)),
            )
        })
        .collect();
    Ok(Json(rendered))
}

pub async fn get_entry<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EntryDetailResponse>, ApiError> {
    let id = parse_id(&id)?;
    let entry = state
        .storage
        .load_entry(user.id, id)?
        .ok_or_else(|| ApiError::not_found(ENTRY_NOT_FOUND))?;

    let parcelas = if entry.is_installment_parent() {
        state
            .storage
            .list_installments(user.id, entry.id)?
            .iter()
            .map(|child| render(&state.storage, child))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    Ok(Json(EntryDetailResponse {
        entry: render(&state.storage, &entry)?,
        parcelas,
    }))
}

pub async fn create_entry<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryEnvelope>), ApiError> {
    let description =
        present(body.descricao).ok_or_else(|| ApiError::bad_request("descricao is required"))?;
    let amount = body
        .valor
        .ok_or_else(|| ApiError::bad_request("valor is required"))?;
    let date = present(body.data)
        .ok_or_else(|| ApiError::bad_request("data is required"))
        .and_then(|raw| parse_date(&raw))?;
    let kind = present(body.tipo)
        .ok_or_else(|| ApiError::bad_request("tipo is required"))
        .and_then(|raw| parse_kind(&raw))?;
    let count = match body.parcelas {
        None => 1,
        Some(n) if (1..=i64::from(MAX_INSTALLMENTS)).contains(&n) => n as u32,
        Some(_) => {
            return Err(ApiError::bad_request(format!(
                "parcelas must be between 1 and {MAX_INSTALLMENTS}"
            )))
        }
    };

    let tx = state.storage.begin_tx()?;
    let (category, account) = check_links(&tx, user.id, body.categoria_id, body.conta_id)?;

    let base = NewEntry {
        user_id: user.id,
        description,
        amount,
        date,
        kind,
        category_id: body.categoria_id,
        account_id: body.conta_id,
        parent_id: None,
        total_installments: None,
        installment: None,
        settled: body.efetivado.unwrap_or(false),
    };

    if count == 1 {
        let entry = tx.insert_entry(&base)?;
        tx.commit()?;
        log::info!("🧾 Entry {} created for {}", entry.id, user.username);
        return Ok((
            StatusCode::CREATED,
            Json(EntryEnvelope {
                message: "entry created",
                lancamento: EntryResponse::new(&entry, category.as_ref(), account.as_ref()),
                parcelas: None,
            }),
        ));
    }

    let plan = ledger::plan_installments(base.amount, count, base.date)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let parent = tx.insert_entry(&NewEntry {
        total_installments: Some(count),
        installment: Some(0),
        ..base.clone()
    })?;
    let mut children = Vec::with_capacity(plan.len());
    for step in plan {
        let child = tx.insert_entry(&NewEntry {
            description: ledger::installment_description(&base.description, step.number, count),
            amount: step.amount,
            date: step.date,
            parent_id: Some(parent.id),
            total_installments: Some(count),
            installment: Some(step.number),
            ..base.clone()
        })?;
        children.push(child);
    }
    tx.commit()?;

    log::info!(
        "🧾 Entry {} split into {} installments for {}",
        parent.id,
        count,
        user.username
    );
    let render_one = |entry: &LedgerEntry| {
        EntryResponse::new(entry, category.as_ref(), account.as_ref())
    };
    Ok((
        StatusCode::CREATED,
        Json(EntryEnvelope {
            message: "entry created",
            lancamento: render_one(&parent),
            parcelas: Some(children.iter().map(render_one).collect()),
        }),
    ))
}

pub async fn update_entry<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateEntryRequest>,
) -> Result<Json<EntryEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    let mut entry = tx
        .load_entry(user.id, id)?
        .ok_or_else(|| ApiError::not_found(ENTRY_NOT_FOUND))?;

    if let Some(raw) = body.tipo {
        entry.kind = parse_kind(&raw)?;
    }
    if let Some(raw) = body.data {
        entry.date = parse_date(&raw)?;
    }
    if let Some(description) = body.descricao {
        entry.description = description;
    }
    if let Some(amount) = body.valor {
        entry.amount = amount;
    }
    if let Some(settled) = body.efetivado {
        entry.settled = settled;
    }
    if let Some(link) = body.categoria_id {
        entry.category_id = link;
    }
    if let Some(link) = body.conta_id {
        entry.account_id = link;
    }
    let (category, account) = check_links(&tx, user.id, entry.category_id, entry.account_id)?;

    tx.update_entry(&entry)?;
    tx.commit()?;

    Ok(Json(EntryEnvelope {
        message: "entry updated",
        lancamento: EntryResponse::new(&entry, category.as_ref(), account.as_ref()),
        parcelas: None,
    }))
}

pub async fn delete_entry<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if !tx.delete_entry(user.id, id)? {
        return Err(ApiError::not_found(ENTRY_NOT_FOUND));
    }
    tx.commit()?;
    Ok(StatusCode::NO_CONTENT)
}
