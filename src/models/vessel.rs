use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::optional_date;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub vessel_name: String,
    #[serde(default)]
    pub job_number: Option<String>,
    #[serde(default, with = "optional_date")]
    pub etd: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_line: Option<String>,
    /// Port of discharge.
    #[serde(default)]
    pub pod: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVessel {
    pub vessel_name: String,
    pub job_number: String,
    #[serde(with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub etd: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
}

impl NewVessel {
    pub fn validate(&self) -> AppResult<()> {
        if self.vessel_name.trim().is_empty() {
            return Err(AppError::Validation("Vessel name is required".to_string()));
        }
        if self.job_number.trim().is_empty() {
            return Err(AppError::Validation("Job number is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_number: Option<String>,
    #[serde(with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub etd: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
}

impl VesselUpdate {
    pub fn is_empty(&self) -> bool {
        self.vessel_name.is_none()
            && self.job_number.is_none()
            && self.etd.is_none()
            && self.shipping_line.is_none()
            && self.pod.is_none()
    }
}
