use serde::{Deserialize, Serialize};

/// Headline numbers for the analytics dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_shipments: u64,
    #[serde(default)]
    pub in_yard: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub shipped: u64,
    #[serde(default)]
    pub unshipped: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub total_vessels: u64,
    /// Anything else the backend reports; passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCount {
    #[serde(alias = "_id", alias = "date", alias = "month")]
    pub period: String,
    #[serde(default)]
    pub count: u64,
}

/// Gate-in / gate-out movement series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStats {
    #[serde(default, alias = "gateIns")]
    pub gate_in: Vec<GateCount>,
    #[serde(default, alias = "gateOuts")]
    pub gate_out: Vec<GateCount>,
}

impl GateStats {
    pub fn total_in(&self) -> u64 {
        self.gate_in.iter().map(|g| g.count).sum()
    }

    pub fn total_out(&self) -> u64 {
        self.gate_out.iter().map(|g| g.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gate_stats_totals() {
        let stats: GateStats = serde_json::from_value(json!({
            "gateIn": [{"_id": "2024-01", "count": 12}, {"_id": "2024-02", "count": 8}],
            "gateOut": [{"_id": "2024-01", "count": 5}]
        }))
        .unwrap();
        assert_eq!(stats.total_in(), 20);
        assert_eq!(stats.total_out(), 5);
    }

    #[test]
    fn test_dashboard_keeps_unknown_fields() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "totalShipments": 40,
            "shipped": 10,
            "averageStorageDays": 17.5
        }))
        .unwrap();
        assert_eq!(stats.total_shipments, 40);
        assert!(stats.extra.contains_key("averageStorageDays"));
    }
}
