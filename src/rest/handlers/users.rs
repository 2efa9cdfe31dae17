use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    rest::{
        error::ApiError,
        extract::{parse_id, AdminUser, JsonBody},
        models::{AdminFlagRequest, MessageResponse, UserEnvelope, UserResponse},
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
};

const USER_NOT_FOUND: &str = "user not found";

pub async fn list_users<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.storage.list_users()?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

pub async fn get_user<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    match state.storage.load_user(id)? {
        Some(user) => Ok(Json(UserResponse::from(&user))),
        None => Err(ApiError::not_found(USER_NOT_FOUND)),
    }
}

pub async fn delete_user<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if !tx.delete_user(id)? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    tx.commit()?;

    log::info!("🗑️ User {} removed by {}", id, admin.username);
    Ok(Json(MessageResponse::new("user removed")))
}

pub async fn update_user_admin<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AdminFlagRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let tx = state.storage.begin_tx()?;
    if tx.load_user(id)?.is_none() {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    let Some(is_admin) = body.is_admin else {
        return Err(ApiError::bad_request("isAdmin must be a boolean"));
    };

    tx.set_user_admin(id, is_admin)?;
    let user = tx
        .load_user(id)?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    tx.commit()?;

    log::info!(
        "🔑 {} set admin={} on user {}",
        admin.username,
        is_admin,
        user.username
    );
    Ok(Json(UserEnvelope {
        message: "user updated",
        user: UserResponse::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use crate::storage::StorageRead;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const ADMIN: Option<(&str, &str)> = Some(("admin", "1234"));
    const USER: Option<(&str, &str)> = Some(("user", "1234"));

    fn seeded() -> TestApp {
        let app = TestApp::new();
        app.add_user("admin", "1234", true);
        app.add_user("user", "1234", false);
        app
    }

    #[tokio::test]
    async fn admin_lists_users_without_passwords() {
        let app = seeded();
        let (status, body) = app.call(Method::GET, "/users", ADMIN, None).await;
        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["username"], "admin");
        assert_eq!(users[0]["isAdmin"], true);
        assert!(users[0].get("password").is_none());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let app = seeded();
        let (status, body) = app.call(Method::GET, "/users", USER, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "access denied: administrator permission required"
        );

        let (status, _) = app.call(Method::GET, "/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_user_handles_missing_and_bad_ids() {
        let app = seeded();
        let (status, body) = app.call(Method::GET, "/users/999", ADMIN, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "user not found");

        let (status, body) = app.call(Method::GET, "/users/abc", ADMIN, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid id");
    }

    #[tokio::test]
    async fn admin_promotes_and_deletes_users() {
        let app = seeded();
        let user = app.storage.find_user_by_username("user").unwrap().unwrap();

        let (status, body) = app
            .call(
                Method::PATCH,
                &format!("/users/{}/admin", user.id),
                ADMIN,
                Some(json!({"isAdmin": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["isAdmin"], true);

        let (status, body) = app
            .call(
                Method::PATCH,
                &format!("/users/{}/admin", user.id),
                ADMIN,
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "isAdmin must be a boolean");

        let (status, body) = app
            .call(Method::DELETE, &format!("/users/{}", user.id), ADMIN, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "user removed");
        assert!(app.storage.load_user(user.id).unwrap().is_none());

        let (status, _) = app
            .call(Method::DELETE, &format!("/users/{}", user.id), ADMIN, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
