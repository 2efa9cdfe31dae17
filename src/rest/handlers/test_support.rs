use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    auth::basic_header,
    rest::router,
    storage::{SqliteStorage, Storage, StorageTx, StorageWrite},
    types::{NewUser, User},
};

pub(crate) const TEST_ORIGIN: &str = "http://localhost:4200";

/// A router over a throwaway SQLite file.
pub(crate) struct TestApp {
    _dir: TempDir,
    pub storage: SqliteStorage,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(dir.path().join("fintrack.sqlite"));
        storage.init().unwrap();
        let router = router(storage.clone(), TEST_ORIGIN).unwrap();
        Self {
            _dir: dir,
            storage,
            router,
        }
    }

    pub fn add_user(&self, username: &str, password: &str, is_admin: bool) -> User {
        let tx = self.storage.begin_tx().unwrap();
        let user = tx
            .insert_user(&NewUser {
                username: username.to_string(),
                password: password.to_string(),
                is_admin,
            })
            .unwrap();
        tx.commit().unwrap();
        user
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        credentials: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = credentials {
            builder = builder.header(header::AUTHORIZATION, basic_header(username, password));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}
