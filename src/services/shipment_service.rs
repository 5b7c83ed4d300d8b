use bytes::Bytes;
use chrono::NaiveDate;

use super::{require_ids, ListQuery};
use crate::error::{AppError, AppResult};
use crate::http_client::ApiClient;
use crate::models::{
    Ack, BulkAssignGateOut, BulkAssignVessel, BulkIds, DataEnvelope, ListEnvelope, NewShipment,
    Page, Shipment, ShipmentUpdate,
};

const BASE: &str = "/admin/shipments";

#[derive(Clone)]
pub struct ShipmentService {
    api: ApiClient,
}

impl ShipmentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ListQuery) -> AppResult<Page<Shipment>> {
        tracing::info!(
            "Listing shipments: page={}, limit={}, filters={}",
            query.page,
            query.limit,
            query.filters.len()
        );
        let envelope: ListEnvelope<Shipment> = self.api.get(BASE, query.to_pairs()).await?;
        Ok(envelope.into_page(query.page, query.limit))
    }

    pub async fn get(&self, id: &str) -> AppResult<Shipment> {
        let envelope: DataEnvelope<Shipment> =
            self.api.get(&format!("{}/{}", BASE, id), Vec::new()).await?;
        Ok(envelope.data)
    }

    /// Rejections of type `CONFLICT` surface as [`AppError::Conflict`].
    pub async fn create(&self, shipment: &NewShipment) -> AppResult<Shipment> {
        shipment.validate()?;
        tracing::info!(
            "Creating shipment: chassis={}, client={}",
            shipment.chassis_number,
            shipment.client_id
        );
        let envelope: DataEnvelope<Shipment> = self.api.post(BASE, shipment).await?;
        Ok(envelope.data)
    }

    pub async fn update(&self, id: &str, update: &ShipmentUpdate) -> AppResult<Shipment> {
        update.validate()?;
        tracing::info!("Updating shipment: id={}", id);
        let envelope: DataEnvelope<Shipment> =
            self.api.put(&format!("{}/{}", BASE, id), update).await?;
        Ok(envelope.data)
    }

    pub async fn update_remarks(&self, id: &str, remarks: &str) -> AppResult<Shipment> {
        let update = ShipmentUpdate {
            remarks: Some(remarks.trim().to_string()),
            ..Default::default()
        };
        self.update(id, &update).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Shipment id is required".to_string()));
        }
        tracing::info!("Deleting shipment: id={}", id);
        let _: Ack = self.api.delete(&format!("{}/{}", BASE, id)).await?;
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> AppResult<()> {
        require_ids(ids, "delete")?;
        tracing::info!("Bulk deleting {} shipments", ids.len());
        let body = BulkIds {
            shipment_ids: ids.to_vec(),
        };
        let _: Ack = self
            .api
            .post(&format!("{}/bulk-delete", BASE), &body)
            .await?;
        Ok(())
    }

    pub async fn bulk_assign_vessel(&self, ids: &[String], vessel_id: &str) -> AppResult<()> {
        require_ids(ids, "assign a vessel")?;
        if vessel_id.trim().is_empty() {
            return Err(AppError::Validation("Select a vessel".to_string()));
        }
        tracing::info!("Assigning vessel {} to {} shipments", vessel_id, ids.len());
        let body = BulkAssignVessel {
            shipment_ids: ids.to_vec(),
            vessel_id: vessel_id.to_string(),
        };
        let _: Ack = self
            .api
            .post(&format!("{}/bulk-assign-vessel", BASE), &body)
            .await?;
        Ok(())
    }

    pub async fn bulk_assign_gate_out(&self, ids: &[String], date: NaiveDate) -> AppResult<()> {
        require_ids(ids, "set a gate-out date")?;
        tracing::info!("Assigning gate-out {} to {} shipments", date, ids.len());
        let body = BulkAssignGateOut {
            shipment_ids: ids.to_vec(),
            gate_out_date: Some(date),
        };
        let _: Ack = self
            .api
            .post(&format!("{}/bulk-gate-out", BASE), &body)
            .await?;
        Ok(())
    }

    /// Export link carrying the current filters; the backend streams the file.
    pub fn export_url(&self, filters: &[(String, String)]) -> String {
        self.api.url(&format!("{}/export/csv", BASE), filters)
    }

    pub async fn export_csv(&self, filters: &[(String, String)]) -> AppResult<Bytes> {
        tracing::info!("Exporting shipments CSV: filters={}", filters.len());
        self.api
            .get_bytes(&format!("{}/export/csv", BASE), filters.to_vec())
            .await
    }
}
