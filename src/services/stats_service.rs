use chrono::NaiveDate;

use crate::error::AppResult;
use crate::http_client::ApiClient;
use crate::models::{DataEnvelope, DashboardStats, GateStats};

#[derive(Clone)]
pub struct StatsService {
    api: ApiClient,
}

impl StatsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let envelope: DataEnvelope<DashboardStats> =
            self.api.get("/admin/stats/dashboard", Vec::new()).await?;
        Ok(envelope.data)
    }

    /// Gate movements, optionally bounded by a date range.
    pub async fn gates(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<GateStats> {
        let mut query = Vec::new();
        if let Some(from) = from {
            query.push(("startDate".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = to {
            query.push(("endDate".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        let envelope: DataEnvelope<GateStats> =
            self.api.get("/admin/stats/gates", query).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_client, query_value, FakeTransport};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_gates_with_range() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/admin/stats/gates",
            200,
            json!({"success": true, "data": {"gateIn": [{"_id": "2024-01-02", "count": 3}], "gateOut": []}}),
        );
        let service = StatsService::new(api_client(&transport));
        let stats = service
            .gates(NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .await
            .unwrap();
        assert_eq!(stats.total_in(), 3);
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "startDate"), Some("2024-01-01"));
        assert_eq!(query_value(&request, "endDate"), None);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/admin/stats/dashboard",
            200,
            json!({"success": true, "data": {"totalShipments": 7, "inYard": 4}}),
        );
        let service = StatsService::new(api_client(&transport));
        let stats = service.dashboard().await.unwrap();
        assert_eq!(stats.total_shipments, 7);
        assert_eq!(stats.in_yard, 4);
    }
}
