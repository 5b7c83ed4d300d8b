use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::{optional_date, storage_days};
use super::photo::Car;
use super::user::User;
use super::vessel::Vessel;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    #[default]
    Pending,
    Shipped,
    Unshipped,
    Cancelled,
}

impl ExportStatus {
    pub const ALL: [ExportStatus; 4] = [
        ExportStatus::Pending,
        ExportStatus::Shipped,
        ExportStatus::Unshipped,
        ExportStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Pending => "pending",
            ExportStatus::Shipped => "shipped",
            ExportStatus::Unshipped => "unshipped",
            ExportStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ExportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Unknown export status: {}", s)))
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Related records arrive either as a bare id or populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(String),
    Populated(Box<T>),
}

impl<T> Ref<T> {
    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Populated(inner) => Some(inner),
            Ref::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, with = "optional_date")]
    pub gate_in_date: Option<NaiveDate>,
    #[serde(default, with = "optional_date")]
    pub gate_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub yard: Option<u32>,
    #[serde(default)]
    pub export_status: ExportStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub vessel: Option<Ref<Vessel>>,
    #[serde(default)]
    pub client_id: Option<Ref<User>>,
    #[serde(default)]
    pub car: Option<Car>,
    /// Computed by the backend from the gate dates.
    #[serde(default)]
    pub storage_days: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Shipment {
    pub fn chassis_number(&self) -> Option<&str> {
        self.car.as_ref().map(|c| c.chassis_number.as_str())
    }

    pub fn vessel_name(&self) -> Option<&str> {
        self.vessel
            .as_ref()
            .and_then(Ref::populated)
            .map(|v| v.vessel_name.as_str())
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.client_id
            .as_ref()
            .and_then(Ref::populated)
            .map(|u| u.name.as_str())
    }

    /// Backend value when present, otherwise derived from the gate dates.
    pub fn storage_days_on(&self, today: NaiveDate) -> Option<i64> {
        self.storage_days.or_else(|| {
            self.gate_in_date
                .map(|gate_in| storage_days(gate_in, self.gate_out_date, today))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub client_id: String,
    #[serde(with = "optional_date")]
    pub gate_in_date: Option<NaiveDate>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub gate_out_date: Option<NaiveDate>,
    pub chassis_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_id: Option<String>,
    pub export_status: ExportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl NewShipment {
    /// Customer, gate-in date and chassis number are mandatory.
    pub fn validate(&self) -> AppResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AppError::Validation("Customer is required".to_string()));
        }
        let Some(gate_in) = self.gate_in_date else {
            return Err(AppError::Validation("Gate-in date is required".to_string()));
        };
        if self.chassis_number.trim().is_empty() {
            return Err(AppError::Validation("Chassis number is required".to_string()));
        }
        if let Some(gate_out) = self.gate_out_date {
            if gate_out < gate_in {
                return Err(AppError::Validation(
                    "Gate-out date cannot be before gate-in date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Partial update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub gate_in_date: Option<NaiveDate>,
    #[serde(with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub gate_out_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_status: Option<ExportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl ShipmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.gate_in_date.is_none()
            && self.gate_out_date.is_none()
            && self.chassis_number.is_none()
            && self.make_model.is_none()
            && self.yard.is_none()
            && self.vessel_id.is_none()
            && self.export_status.is_none()
            && self.remarks.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        if let Some(chassis) = &self.chassis_number {
            if chassis.trim().is_empty() {
                return Err(AppError::Validation("Chassis number cannot be empty".to_string()));
            }
        }
        if let (Some(gate_in), Some(gate_out)) = (self.gate_in_date, self.gate_out_date) {
            if gate_out < gate_in {
                return Err(AppError::Validation(
                    "Gate-out date cannot be before gate-in date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIds {
    pub shipment_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignVessel {
    pub shipment_ids: Vec<String>,
    pub vessel_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignGateOut {
    pub shipment_ids: Vec<String>,
    #[serde(with = "optional_date")]
    pub gate_out_date: Option<NaiveDate>,
}
