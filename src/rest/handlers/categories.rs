use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    rest::{
        error::ApiError,
        extract::{parse_id, AuthUser, JsonBody},
        models::{present, CategoryEnvelope, CategoryRequest, CategoryResponse},
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
};

pub(crate) const CATEGORY_NOT_FOUND: &str = "category not found";
const NAME_REQUIRED: &str = "nome is required";

pub async fn list_categories<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.storage.list_categories(user.id)?;
    Ok(Json(categories.iter().map(CategoryResponse::from).collect()))
}

pub async fn get_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id = parse_id(&id)?;
    match state.storage.load_category(user.id, id)? {
        Some(category) => Ok(Json(CategoryResponse::from(&category))),
        None => Err(ApiError::not_found(CATEGORY_NOT_FOUND)),
    }
}

pub async fn create_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryEnvelope>), ApiError> {
    let name = present(body.nome).ok_or_else(|| ApiError::bad_request(NAME_REQUIRED))?;

    let tx = state.storage.begin_tx()?;
    let category = tx.insert_category(user.id, &name)?;
    tx.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryEnvelope {
            message: "category created",
            category: CategoryResponse::from(&category),
        }),
    ))
}

pub async fn update_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CategoryRequest>,
) -> Result<Json<CategoryEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    let mut category = tx
        .load_category(user.id, id)?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?;
    category.name = present(body.nome).ok_or_else(|| ApiError::bad_request(NAME_REQUIRED))?;

    tx.update_category(&category)?;
    tx.commit()?;

    Ok(Json(CategoryEnvelope {
        message: "category updated",
        category: CategoryResponse::from(&category),
    }))
}

pub async fn delete_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if !tx.delete_category(user.id, id)? {
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }
    tx.commit()?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    const ANA: Option<(&str, &str)> = Some(("ana", "1234"));
    const BIA: Option<(&str, &str)> = Some(("bia", "1234"));

    fn seeded() -> TestApp {
        let app = TestApp::new();
        app.add_user("ana", "1234", false);
        app.add_user("bia", "1234", false);
        app
    }

    #[tokio::test]
    async fn crud_round_for_owner() {
        let app = seeded();

        let (status, body) = app
            .call(
                Method::POST,
                "/categories",
                ANA,
                Some(json!({"nome": "Mercado"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["category"]["nome"], "Mercado");
        let id = body["category"]["id"].as_i64().unwrap();
        let path = format!("/categories/{id}");

        let (status, body) = app
            .call(Method::PUT, &path, ANA, Some(json!({"nome": "Feira"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["nome"], "Feira");

        let (status, body) = app.call(Method::GET, "/categories", ANA, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": id, "nome": "Feira"}]));

        let (status, body) = app.call(Method::DELETE, &path, ANA, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = app.call(Method::GET, &path, ANA, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_see_not_found() {
        let app = seeded();
        let (_, body) = app
            .call(Method::POST, "/categories", ANA, Some(json!({"nome": "Casa"})))
            .await;
        let path = format!("/categories/{}", body["category"]["id"]);

        let (status, body) = app.call(Method::GET, &path, BIA, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "category not found");

        let (status, _) = app
            .call(Method::PUT, &path, BIA, Some(json!({"nome": "Hack"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.call(Method::DELETE, &path, BIA, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.call(Method::GET, "/categories", BIA, None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn nome_is_required() {
        let app = seeded();
        let (status, body) = app
            .call(Method::POST, "/categories", ANA, Some(json!({"nome": ""})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "nome is required");

        // missing resource wins over missing field
        let (status, _) = app
            .call(Method::PUT, "/categories/999", ANA, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
