use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::http_client::ApiClient;
use crate::session::{LocalStorage, Session, UserData};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_id: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchanges credentials for a bearer token and persists the session.
    pub async fn login(
        &self,
        storage: &LocalStorage,
        user_id: &str,
        password: &str,
    ) -> AppResult<Session> {
        if user_id.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "User ID and password are required".to_string(),
            ));
        }

        tracing::info!("Logging in as {}", user_id);
        let body: Value = self
            .api
            .post("/auth/login", &LoginRequest { user_id, password })
            .await?;

        let data = body.get("data").unwrap_or(&body);
        let access_token = data
            .get("accessToken")
            .or_else(|| data.get("token"))
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Rejected {
                kind: None,
                message: "Login response did not contain a token".to_string(),
            })?
            .to_string();
        let user = extract_user(data)?;

        let session = Session { access_token, user };
        session.save(storage)?;
        self.api.set_token(Some(session.access_token.clone()));
        tracing::info!("Logged in: user={}, role={}", session.user.id, session.user.role);
        Ok(session)
    }

    /// Validates the current bearer token and returns the backend's view of the user.
    pub async fn validate_token(&self) -> AppResult<UserData> {
        let body: Value = self.api.get("/auth/validateToken", Vec::new()).await?;
        let data = body.get("data").unwrap_or(&body);
        extract_user(data)
    }

    pub fn logout(&self, storage: &LocalStorage) -> AppResult<()> {
        self.api.set_token(None);
        Session::clear(storage)?;
        tracing::info!("Logged out");
        Ok(())
    }
}

fn extract_user(data: &Value) -> AppResult<UserData> {
    let user = data
        .get("user")
        .or_else(|| data.get("userData"))
        .unwrap_or(data);
    serde_json::from_value(user.clone()).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::session::ACCESS_TOKEN_KEY;
    use crate::testing::{api_client, FakeTransport};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_persists_session() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({
                "success": true,
                "data": {
                    "accessToken": "fresh-token",
                    "user": {"_id": "c1", "name": "Tanaka", "role": "customer", "canMassDownloadPhotos": true}
                }
            }),
        );
        let api = ApiClient::new(transport.clone());
        let service = AuthService::new(api.clone());
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("s.json"));

        let session = service.login(&storage, "tanaka", "pw").await.unwrap();
        assert_eq!(session.user.role, Role::Customer);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY), Some("fresh-token".to_string()));
        assert_eq!(api.token(), Some("fresh-token".to_string()));

        let body = transport.last_request().unwrap().body.unwrap();
        assert_eq!(body, json!({"userId": "tanaka", "password": "pw"}));
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let transport = FakeTransport::new();
        let service = AuthService::new(api_client(&transport));
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("s.json"));

        let err = service.login(&storage, "", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_validate_token_sends_bearer() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/auth/validateToken",
            200,
            json!({"success": true, "data": {"user": {"_id": "a1", "role": "admin"}}}),
        );
        let service = AuthService::new(api_client(&transport));
        let user = service.validate_token().await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(
            transport.last_request().unwrap().bearer.as_deref(),
            Some("test-token")
        );
    }
}
