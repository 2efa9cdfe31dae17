use axum::{extract::State, http::StatusCode, Json};

use crate::{
    rest::{
        error::ApiError,
        extract::{AuthUser, JsonBody},
        models::{present, LoginResponse, RegisterRequest, RegisterResponse, UserResponse},
        AppState,
    },
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
    types::NewUser,
};

const MIN_PASSWORD_LEN: usize = 4;

pub async fn login(AuthUser(user): AuthUser) -> Json<LoginResponse> {
    Json(LoginResponse {
        message: "OK",
        user: UserResponse::from(&user),
    })
}

pub async fn register<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (Some(username), Some(password)) = (present(body.username), present(body.password)) else {
        return Err(ApiError::bad_request("username and password are required"));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let tx = state.storage.begin_tx()?;
    if tx.find_user_by_username(&username)?.is_some() {
        return Err(ApiError::bad_request("username already exists"));
    }
    // The very first account administers the instance.
    let is_admin = tx.count_users()? == 0;
    let user = tx.insert_user(&NewUser {
        username,
        password,
        is_admin,
    })?;
    tx.commit()?;

    log::info!("👤 Registered user {} (admin: {})", user.username, user.is_admin);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user created",
            user_id: user.id,
            is_admin: user.is_admin,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::{
        body::Body,
        http::{header, HeaderValue, Method, Request, StatusCode},
    };
    use serde_json::json;

    #[tokio::test]
    async fn first_registered_user_becomes_admin() {
        let app = TestApp::new();

        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": "ana", "password": "1234"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["isAdmin"], true);
        assert!(body["userId"].is_i64());

        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": "bia", "password": "abcd"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["isAdmin"], false);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = TestApp::new();

        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": "ana"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "username and password are required");

        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": "ana", "password": "123"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "password must be at least 4 characters");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let app = TestApp::new();
        app.add_user("ana", "1234", true);

        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": "ana", "password": "5678"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "username already exists");
    }

    #[tokio::test]
    async fn register_rejects_malformed_json() {
        let app = TestApp::new();
        let (status, body) = app
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"username": 5, "password": "1234"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn login_echoes_the_authenticated_user() {
        let app = TestApp::new();
        let user = app.add_user("ana", "1234", false);

        let (status, body) = app
            .call(Method::POST, "/auth/login", Some(("ana", "1234")), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "OK");
        assert_eq!(body["user"]["id"], user.id);
        assert_eq!(body["user"]["username"], "ana");
        assert_eq!(body["user"]["isAdmin"], false);
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let app = TestApp::new();
        app.add_user("ana", "1234", false);

        let (status, body) = app.call(Method::POST, "/auth/login", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "authentication token required");

        let (status, body) = app
            .call(Method::POST, "/auth/login", Some(("ana", "wrong")), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn login_with_unreadable_header_is_invalid_token() {
        let app = TestApp::new();
        app.add_user("ana", "1234", false);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"Basic \xe9YW5hOjEyMzQ=").unwrap(),
            )
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid token");
    }
}
