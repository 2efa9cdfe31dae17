use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    rest::{
        error::ApiError,
        extract::{parse_id, AdminUser, AuthUser, JsonBody},
        models::{
            present, BookEnvelope, BookResponse, CreateBookRequest, MessageResponse,
            UpdateBookRequest,
        },
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
    types::NewBook,
};

const BOOK_NOT_FOUND: &str = "book not found";

pub async fn list_books<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.storage.list_books()?;
    Ok(Json(books.iter().map(BookResponse::from).collect()))
}

pub async fn get_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let id = parse_id(&id)?;
    match state.storage.load_book(id)? {
        Some(book) => Ok(Json(BookResponse::from(&book))),
        None => Err(ApiError::not_found(BOOK_NOT_FOUND)),
    }
}

pub async fn create_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(_admin): AdminUser,
    JsonBody(body): JsonBody<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookEnvelope>), ApiError> {
    let (Some(title), Some(author)) = (present(body.title), present(body.author)) else {
        return Err(ApiError::bad_request("title and author are required"));
    };

    let tx = state.storage.begin_tx()?;
    let book = tx.insert_book(&NewBook::new(title, author))?;
    tx.commit()?;

    log::info!("📚 Book {} created: {}", book.id, book.title);
    Ok((
        StatusCode::CREATED,
        Json(BookEnvelope {
            message: "book created",
            book: BookResponse::from(&book),
        }),
    ))
}

pub async fn update_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateBookRequest>,
) -> Result<Json<BookEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    let mut book = tx
        .load_book(id)?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;

    if let Some(title) = body.title {
        book.title = title;
    }
    if let Some(author) = body.author {
        book.author = author;
    }
    if let Some(available) = body.available {
        book.available = available;
    }
    tx.update_book(&book)?;
    tx.commit()?;

    Ok(Json(BookEnvelope {
        message: "book updated",
        book: BookResponse::from(&book),
    }))
}

pub async fn delete_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if !tx.delete_book(id)? {
        return Err(ApiError::not_found(BOOK_NOT_FOUND));
    }
    tx.commit()?;

    Ok(Json(MessageResponse::new("book removed")))
}

pub async fn borrow_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    set_availability(&state.storage, id, false)?;
    log::info!("📕 Book {} borrowed by {}", id, user.username);
    Ok(Json(MessageResponse::new("book borrowed")))
}

pub async fn return_book<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    set_availability(&state.storage, id, true)?;
    log::info!("📗 Book {} returned by {}", id, user.username);
    Ok(Json(MessageResponse::new("book returned")))
}

/// Flips availability, refusing when the book is already in the target state.
fn set_availability<S: Storage>(storage: &S, id: i64, available: bool) -> Result<(), ApiError> {
    let tx = storage.begin_tx()?;
    let mut book = tx
        .load_book(id)?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;

    if book.available == available {
        return Err(ApiError::bad_request(if available {
            "book is already available"
        } else {
            "book is not available for borrowing"
        }));
    }

    book.available = available;
    tx.update_book(&book)?;
    tx.commit()?;
    Ok(())
}
