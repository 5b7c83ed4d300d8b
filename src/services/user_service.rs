use super::ListQuery;
use crate::error::{AppError, AppResult};
use crate::http_client::ApiClient;
use crate::models::{Ack, DataEnvelope, ListEnvelope, NewUser, Page, Role, User, UserUpdate};

#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ListQuery) -> AppResult<Page<User>> {
        tracing::info!("Listing users: page={}, limit={}", query.page, query.limit);
        let envelope: ListEnvelope<User> =
            self.api.get("/admin/list/users", query.to_pairs()).await?;
        Ok(envelope.into_page(query.page, query.limit))
    }

    /// Non-admin accounts only. Pagination is reported as the backend sent it.
    pub async fn customers(&self, query: &ListQuery) -> AppResult<Page<User>> {
        let mut page = self.list(query).await?;
        page.items.retain(|u| u.role != Role::Admin);
        Ok(page)
    }

    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        user.validate()?;
        tracing::info!("Creating user: user_id={}, role={}", user.user_id, user.role);
        let envelope: DataEnvelope<User> = self.api.post("/admin/create/user", user).await?;
        Ok(envelope.data)
    }

    pub async fn update(&self, id: &str, update: &UserUpdate) -> AppResult<User> {
        if let Some(password) = &update.password {
            if password.is_empty() {
                return Err(AppError::Validation("Password cannot be empty".to_string()));
            }
        }
        tracing::info!("Updating user: id={}", id);
        let envelope: DataEnvelope<User> = self
            .api
            .put(&format!("/admin/update/user/{}", id), update)
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        tracing::info!("Deleting user: id={}", id);
        let _: Ack = self
            .api
            .delete(&format!("/admin/delete/user/{}", id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_client, FakeTransport};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_customers_drops_admins() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/admin/list/users",
            200,
            json!({
                "success": true,
                "data": [
                    {"_id": "a1", "name": "Root", "role": "admin"},
                    {"_id": "s1", "name": "Desk", "role": "subadmin"},
                    {"_id": "c1", "name": "Tanaka Motors", "role": "customer"}
                ],
                "meta": {"pagination": {"currentPage": 1, "totalPages": 1, "totalItems": 3}}
            }),
        );
        let service = UserService::new(api_client(&transport));
        let page = service.customers(&ListQuery::new(1, 10)).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "c1"]);
        assert_eq!(page.pagination.total_items, 3);
    }

    #[tokio::test]
    async fn test_update_omits_unset_password() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::PUT,
            "/admin/update/user/c1",
            200,
            json!({"success": true, "data": {"_id": "c1", "name": "Renamed", "role": "customer"}}),
        );
        let service = UserService::new(api_client(&transport));
        let update = UserUpdate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let user = service.update("c1", &update).await.unwrap();
        assert_eq!(user.name, "Renamed");
        let body = transport.last_request().unwrap().body.unwrap();
        assert_eq!(body, json!({"name": "Renamed"}));
    }
}
