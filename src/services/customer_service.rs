use bytes::Bytes;

use super::ListQuery;
use crate::error::AppResult;
use crate::http_client::ApiClient;
use crate::models::{ListEnvelope, Page, Shipment};

/// Shipments visible to the logged-in customer.
#[derive(Clone)]
pub struct CustomerShipmentService {
    api: ApiClient,
}

impl CustomerShipmentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ListQuery) -> AppResult<Page<Shipment>> {
        tracing::info!(
            "Listing customer shipments: page={}, limit={}",
            query.page,
            query.limit
        );
        let envelope: ListEnvelope<Shipment> =
            self.api.get("/client/get/shipments", query.to_pairs()).await?;
        Ok(envelope.into_page(query.page, query.limit))
    }

    pub fn export_url(&self, customer_id: &str, filters: &[(String, String)]) -> String {
        self.api.url(&export_path(customer_id), filters)
    }

    pub async fn export_csv(
        &self,
        customer_id: &str,
        filters: &[(String, String)],
    ) -> AppResult<Bytes> {
        tracing::info!("Exporting CSV for customer {}", customer_id);
        self.api
            .get_bytes(&export_path(customer_id), filters.to_vec())
            .await
    }
}

fn export_path(customer_id: &str) -> String {
    format!(
        "/client/shipments/export/csv/{}",
        urlencoding::encode(customer_id)
    )
}
