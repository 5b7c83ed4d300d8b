use crate::config::AuthFailurePolicy;
use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::routes::AppRoute;
use crate::services::AuthService;
use crate::session::{LocalStorage, Session, UserData};

/// Capabilities of the signed-in user, handed to every flow that needs them.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthContext {
    user: UserData,
}

impl AuthContext {
    pub fn new(user: UserData) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &UserData {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.user.role.is_staff()
    }

    pub fn can_delete_shipments(&self) -> bool {
        self.is_admin()
    }

    pub fn can_edit_vessels(&self) -> bool {
        self.is_admin()
    }

    pub fn can_manage_users(&self) -> bool {
        self.is_admin()
    }

    pub fn can_mass_download_photos(&self) -> bool {
        self.user.can_mass_download_photos
    }

    /// Own id for customers; staff have no customer scope.
    pub fn customer_id(&self) -> Option<&str> {
        (self.user.role == Role::Customer).then_some(self.user.id.as_str())
    }

    /// `Forbidden` unless `allowed`.
    pub fn ensure(&self, allowed: bool, action: &str) -> AppResult<()> {
        if allowed {
            Ok(())
        } else {
            tracing::warn!(
                "Denied '{}' for user {} (role={})",
                action,
                self.user.id,
                self.user.role
            );
            Err(AppError::Forbidden(action.to_string()))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateDecision {
    Allow(AuthContext),
    /// Public route, no credentials involved.
    AllowAnonymous,
    Redirect(AppRoute),
}

/// The one place that decides whether a route may render.
#[derive(Clone)]
pub struct AuthGate {
    auth: AuthService,
    storage: LocalStorage,
    policy: AuthFailurePolicy,
}

impl AuthGate {
    pub fn new(auth: AuthService, storage: LocalStorage, policy: AuthFailurePolicy) -> Self {
        Self {
            auth,
            storage,
            policy,
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub async fn check(&self, path: &str) -> GateDecision {
        let route = AppRoute::from_path(path);

        let Some(session) = Session::load(&self.storage) else {
            self.auth.api().set_token(None);
            return anonymous(route);
        };
        self.auth.api().set_token(Some(session.access_token.clone()));

        match self.auth.validate_token().await {
            Ok(user) => {
                if user != session.user {
                    let refreshed = Session {
                        access_token: session.access_token.clone(),
                        user: user.clone(),
                    };
                    if let Err(e) = refreshed.save(&self.storage) {
                        tracing::warn!("Failed to refresh cached userData: {}", e);
                    }
                }
                signed_in(route, user)
            }
            Err(e @ (AppError::Unauthorized | AppError::Rejected { .. })) => {
                tracing::info!("Token rejected ({}), clearing session", e);
                self.auth.api().set_token(None);
                if let Err(e) = Session::clear(&self.storage) {
                    tracing::error!("Failed to clear session: {}", e);
                }
                anonymous(route)
            }
            Err(e) => match self.policy {
                AuthFailurePolicy::FailClosed => {
                    tracing::warn!("Token check failed ({}), denying {}", e, route);
                    anonymous(route)
                }
                AuthFailurePolicy::FailOpen => {
                    tracing::warn!("Token check failed ({}), using cached user", e);
                    signed_in(route, session.user)
                }
            },
        }
    }

    /// Like [`check`](Self::check) but as a result, for callers that cannot redirect.
    pub async fn require(&self, path: &str) -> AppResult<AuthContext> {
        match self.check(path).await {
            GateDecision::Allow(ctx) => Ok(ctx),
            GateDecision::AllowAnonymous | GateDecision::Redirect(AppRoute::Login) => {
                Err(AppError::Unauthorized)
            }
            GateDecision::Redirect(home) => Err(AppError::Forbidden(format!(
                "open {} (your home is {})",
                path, home
            ))),
        }
    }
}

fn anonymous(route: AppRoute) -> GateDecision {
    if route.is_public() {
        GateDecision::AllowAnonymous
    } else {
        GateDecision::Redirect(AppRoute::Login)
    }
}

fn signed_in(route: AppRoute, user: UserData) -> GateDecision {
    let home = AppRoute::home_for(user.role);
    if route == AppRoute::Login || !route.allows(user.role) {
        tracing::debug!("Redirecting {} from {} to {}", user.id, route, home);
        return GateDecision::Redirect(home);
    }
    GateDecision::Allow(AuthContext::new(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::ApiClient;
    use crate::session::ACCESS_TOKEN_KEY;
    use crate::testing::FakeTransport;
    use http::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn user(role: Role) -> UserData {
        UserData {
            id: "u1".to_string(),
            name: "Kato".to_string(),
            user_id: Some("kato".to_string()),
            role,
            can_mass_download_photos: false,
        }
    }

    fn gate(
        transport: &Arc<FakeTransport>,
        policy: AuthFailurePolicy,
    ) -> (AuthGate, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("session.json"));
        let auth = AuthService::new(ApiClient::new(transport.clone()));
        (AuthGate::new(auth, storage, policy), dir)
    }

    fn sign_in(gate: &AuthGate, role: Role) {
        Session {
            access_token: "tok".to_string(),
            user: user(role),
        }
        .save(gate.storage())
        .unwrap();
    }

    fn validate_ok(transport: &FakeTransport, role: &str) {
        transport.always(
            Method::GET,
            "/auth/validateToken",
            200,
            json!({"success": true, "data": {"user": {"_id": "u1", "name": "Kato", "userId": "kato", "role": role}}}),
        );
    }

    #[tokio::test]
    async fn test_no_session_only_login() {
        let transport = FakeTransport::new();
        let (gate, _dir) = gate(&transport, AuthFailurePolicy::FailClosed);
        assert_eq!(gate.check("/login").await, GateDecision::AllowAnonymous);
        assert_eq!(
            gate.check("/admin/shipments").await,
            GateDecision::Redirect(AppRoute::Login)
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_redirects_to_role_home() {
        let transport = FakeTransport::new();
        validate_ok(&transport, "admin");
        let (gate, _dir) = gate(&transport, AuthFailurePolicy::FailClosed);
        sign_in(&gate, Role::Admin);
        assert_eq!(
            gate.check("/login").await,
            GateDecision::Redirect(AppRoute::AdminShipments)
        );
        assert_eq!(
            transport.last_request().unwrap().bearer.as_deref(),
            Some("tok")
        );
    }

    #[tokio::test]
    async fn test_wrong_tree_redirects_home() {
        let transport = FakeTransport::new();
        validate_ok(&transport, "customer");
        let (gate, _dir) = gate(&transport, AuthFailurePolicy::FailClosed);
        sign_in(&gate, Role::Customer);
        assert_eq!(
            gate.check("/admin/vessels").await,
            GateDecision::Redirect(AppRoute::CustomerDashboard)
        );
        match gate.check("/customer").await {
            GateDecision::Allow(ctx) => assert_eq!(ctx.customer_id(), Some("u1")),
            other => panic!("expected allow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_token_clears_session() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/auth/validateToken", 401, json!({}));
        let (gate, _dir) = gate(&transport, AuthFailurePolicy::FailOpen);
        sign_in(&gate, Role::Admin);
        assert_eq!(
            gate.check("/admin/shipments").await,
            GateDecision::Redirect(AppRoute::Login)
        );
        assert!(gate.storage().get(ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_success_false_clears_session() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/auth/validateToken",
            200,
            json!({"success": false, "message": "Token expired"}),
        );
        let (gate, _dir) = gate(&transport, AuthFailurePolicy::FailClosed);
        sign_in(&gate, Role::Customer);
        assert_eq!(
            gate.check("/customer").await,
            GateDecision::Redirect(AppRoute::Login)
        );
        assert!(Session::load(gate.storage()).is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_follows_policy() {
        let transport = FakeTransport::new();
        transport.always(
            Method::GET,
            "/auth/validateToken",
            503,
            json!({"message": "unavailable"}),
        );

        let (closed, _d1) = gate(&transport, AuthFailurePolicy::FailClosed);
        sign_in(&closed, Role::Admin);
        assert_eq!(
            closed.check("/admin/shipments").await,
            GateDecision::Redirect(AppRoute::Login)
        );
        // credentials survive a transient failure
        assert!(Session::load(closed.storage()).is_some());

        let (open, _d2) = gate(&transport, AuthFailurePolicy::FailOpen);
        sign_in(&open, Role::Admin);
        assert!(matches!(
            open.check("/admin/shipments").await,
            GateDecision::Allow(_)
        ));
    }

    #[test]
    fn test_capabilities() {
        let admin = AuthContext::new(user(Role::Admin));
        let sub = AuthContext::new(user(Role::Subadmin));
        assert!(admin.can_delete_shipments());
        assert!(!sub.can_delete_shipments());
        assert!(sub.is_staff());
        assert_eq!(sub.customer_id(), None);
        assert!(matches!(
            sub.ensure(sub.can_manage_users(), "manage users"),
            Err(AppError::Forbidden(_))
        ));
    }
}
