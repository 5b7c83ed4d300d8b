//! Application route tree and role homes.

use std::fmt::Display;

use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Login,
    CustomerDashboard,
    AdminShipments,
    AdminCustomers,
    AdminVessels,
    AdminAnalytics,
    NotFound,
}

impl AppRoute {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" | "/login" => Self::Login,
            "/customer" => Self::CustomerDashboard,
            "/admin" | "/admin/shipments" => Self::AdminShipments,
            "/admin/customers" => Self::AdminCustomers,
            "/admin/vessels" => Self::AdminVessels,
            "/admin/analytics" => Self::AdminAnalytics,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::CustomerDashboard => "/customer",
            Self::AdminShipments => "/admin/shipments",
            Self::AdminCustomers => "/admin/customers",
            Self::AdminVessels => "/admin/vessels",
            Self::AdminAnalytics => "/admin/analytics",
            Self::NotFound => "/404",
        }
    }

    /// Reachable without credentials.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::NotFound)
    }

    pub fn is_admin_tree(&self) -> bool {
        matches!(
            self,
            Self::AdminShipments | Self::AdminCustomers | Self::AdminVessels | Self::AdminAnalytics
        )
    }

    pub fn is_customer_tree(&self) -> bool {
        matches!(self, Self::CustomerDashboard)
    }

    /// Whether a signed-in user with `role` may stay on this route.
    pub fn allows(&self, role: Role) -> bool {
        let required = self.required_roles();
        required.is_empty() || required.contains(&role)
    }

    /// Roles admitted to this route; empty for routes open to everyone.
    pub fn required_roles(&self) -> &'static [Role] {
        if self.is_admin_tree() {
            &[Role::Admin, Role::Subadmin]
        } else if self.is_customer_tree() {
            &[Role::Customer]
        } else {
            &[]
        }
    }

    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Admin | Role::Subadmin => Self::AdminShipments,
            Role::Customer => Self::CustomerDashboard,
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
