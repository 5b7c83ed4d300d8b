//! Gate dates, storage-day arithmetic and date-range checks.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{AppError, AppResult};

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// serde helpers for `Option<NaiveDate>` fields exchanged as strings.
pub mod optional_date {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}

/// Days a vehicle has spent in the yard. Open stays count up to `today`.
pub fn storage_days(gate_in: NaiveDate, gate_out: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let end = gate_out.unwrap_or(today);
    (end - gate_in).num_days().max(0)
}

/// Colour band used when listing storage days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBand {
    Normal,
    Warning,
    Critical,
}

impl StorageBand {
    pub const WARNING_AFTER_DAYS: i64 = 30;
    pub const CRITICAL_AFTER_DAYS: i64 = 60;

    pub fn for_days(days: i64) -> Self {
        if days > Self::CRITICAL_AFTER_DAYS {
            StorageBand::Critical
        } else if days > Self::WARNING_AFTER_DAYS {
            StorageBand::Warning
        } else {
            StorageBand::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageBand::Normal => "normal",
            StorageBand::Warning => "warning",
            StorageBand::Critical => "critical",
        }
    }
}

/// Rejects a range whose end precedes its start. Open-ended ranges pass.
pub fn validate_date_range(from: Option<&str>, to: Option<&str>) -> AppResult<()> {
    let parse = |label: &str, raw: Option<&str>| -> AppResult<Option<NaiveDate>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => parse_date(s).map(Some).ok_or_else(|| {
                AppError::Validation(format!("{} is not a valid date: {}", label, s))
            }),
        }
    };

    let from = parse("Start date", from)?;
    let to = parse("End date", to)?;
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            return Err(AppError::Validation(
                "End date must be on or after the start date".to_string(),
            ));
        }
    }
    Ok(())
}
