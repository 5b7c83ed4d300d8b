use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Subadmin,
    #[default]
    Customer,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Subadmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Subadmin => "subadmin",
            Role::Customer => "customer",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "subadmin" | "sub-admin" => Ok(Role::Subadmin),
            "customer" => Ok(Role::Customer),
            other => Err(AppError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account as returned by the backend. Passwords are never decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub can_mass_download_photos: bool,
}

impl User {
    /// Login id; older accounts only carry `username`.
    pub fn login_id(&self) -> &str {
        self.user_id
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub user_id: String,
    pub password: String,
    pub role: Role,
    pub can_mass_download_photos: bool,
}

impl NewUser {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("User ID is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Write-only; only sent when the operator sets a new password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_mass_download_photos: Option<bool>,
}
