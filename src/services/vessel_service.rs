use super::ListQuery;
use crate::error::{AppError, AppResult};
use crate::http_client::ApiClient;
use crate::models::{Ack, DataEnvelope, ListEnvelope, NewVessel, Page, Vessel, VesselUpdate};

const BASE: &str = "/admin/vessels";
/// Page size used to populate vessel dropdowns in one request.
const DROPDOWN_LIMIT: u32 = 1000;

#[derive(Clone)]
pub struct VesselService {
    api: ApiClient,
}

impl VesselService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ListQuery) -> AppResult<Page<Vessel>> {
        tracing::info!("Listing vessels: page={}, limit={}", query.page, query.limit);
        let envelope: ListEnvelope<Vessel> = self.api.get(BASE, query.to_pairs()).await?;
        Ok(envelope.into_page(query.page, query.limit))
    }

    /// Every vessel, for assignment dropdowns.
    pub async fn all(&self) -> AppResult<Vec<Vessel>> {
        let page = self.list(&ListQuery::new(1, DROPDOWN_LIMIT)).await?;
        if page.pagination.has_next {
            tracing::warn!(
                "Vessel dropdown truncated at {} of {} vessels",
                page.items.len(),
                page.pagination.total_items
            );
        }
        Ok(page.items)
    }

    pub async fn create(&self, vessel: &NewVessel) -> AppResult<Vessel> {
        vessel.validate()?;
        tracing::info!(
            "Creating vessel: name={}, job={}",
            vessel.vessel_name,
            vessel.job_number
        );
        let envelope: DataEnvelope<Vessel> = self.api.post(BASE, vessel).await?;
        Ok(envelope.data)
    }

    pub async fn update(&self, id: &str, update: &VesselUpdate) -> AppResult<Vessel> {
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        tracing::info!("Updating vessel: id={}", id);
        let envelope: DataEnvelope<Vessel> =
            self.api.put(&format!("{}/{}", BASE, id), update).await?;
        Ok(envelope.data)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        tracing::info!("Deleting vessel: id={}", id);
        let _: Ack = self.api.delete(&format!("{}/{}", BASE, id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_client, query_value, FakeTransport};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_accepts_flat_pagination() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            BASE,
            200,
            json!({
                "success": true,
                "data": [{"_id": "v1", "vesselName": "Ocean Star", "jobNumber": "J-1"}],
                "pagination": {"currentPage": 2, "totalPages": 3, "totalItems": 21,
                               "hasNext": true, "hasPrev": true}
            }),
        );
        let service = VesselService::new(api_client(&transport));
        let page = service.list(&ListQuery::new(2, 10)).await.unwrap();
        assert_eq!(page.items[0].vessel_name, "Ocean Star");
        assert_eq!(page.pagination.current_page, 2);
        assert!(page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_all_requests_large_page() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, BASE, 200, json!({"success": true, "data": []}));
        let service = VesselService::new(api_client(&transport));
        assert!(service.all().await.unwrap().is_empty());
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "limit"), Some("1000"));
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::DELETE,
            "/admin/vessels/v1",
            200,
            json!({"success": false, "message": "Vessel has shipments assigned"}),
        );
        let service = VesselService::new(api_client(&transport));
        let err = service.delete("v1").await.unwrap_err();
        assert_eq!(err.user_message(), "Vessel has shipments assigned");
    }

    #[tokio::test]
    async fn test_empty_update_never_sent() {
        let transport = FakeTransport::new();
        let service = VesselService::new(api_client(&transport));
        assert!(service.update("v1", &VesselUpdate::default()).await.is_err());
        assert!(transport.requests().is_empty());
    }
}
