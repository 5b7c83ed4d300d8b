use serde::Serialize;

pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortConfig {
    pub field: String,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl SortConfig {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Next state after a header click on `field`:
    /// asc, then desc, then back to the default ordering.
    pub fn cycle(&self, field: &str) -> SortConfig {
        if self.field != field || self.is_default() {
            return SortConfig::new(field, SortOrder::Asc);
        }
        match self.order {
            SortOrder::Asc => SortConfig::new(field, SortOrder::Desc),
            SortOrder::Desc => SortConfig::default(),
        }
    }
}
