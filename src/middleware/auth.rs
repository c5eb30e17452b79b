use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditEvent, AuditOutcome};
use crate::auth::Session;
use crate::database::StaffProfile;
use crate::error::ApiError;
use crate::rbac::{self, AppLevel, Role};
use crate::state::AppState;

/// What a protected handler needs beyond an active staff profile
#[derive(Debug, Clone, Default)]
pub struct AccessRequirement {
    pub role: Option<Role>,
    pub permission: Option<String>,
    pub location: Option<String>,
    /// Minimum access level in a named app
    pub app: Option<(String, AppLevel)>,
    /// Also consult the static route table for the request path
    pub check_route: bool,
    /// Audit successful access too, not only denials
    pub sensitive: bool,
}

impl AccessRequirement {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Self {
            permission: Some(permission.into()),
            ..Self::default()
        }
    }

    pub fn app(app: impl Into<String>, level: AppLevel) -> Self {
        Self::default().with_app(app, level)
    }

    pub fn with_app(mut self, app: impl Into<String>, level: AppLevel) -> Self {
        self.app = Some((app.into(), level));
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_route_check(mut self) -> Self {
        self.check_route = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// `Err` carries a user-safe reason naming what was required
    pub fn evaluate(&self, profile: &StaffProfile, path: &str) -> Result<(), String> {
        let grants = Some(profile.permissions.as_slice());

        if let Some(required) = self.role {
            if !rbac::has_role(&profile.role, required.as_str()) {
                return Err(format!(
                    "Requires {} role (current: {})",
                    required,
                    display_role(&profile.role)
                ));
            }
        }

        if let Some(permission) = &self.permission {
            if !rbac::has_permission(&profile.role, permission, grants) {
                return Err(format!(
                    "Missing permission '{}' (current role: {})",
                    permission,
                    display_role(&profile.role)
                ));
            }
        }

        if let Some(location) = &self.location {
            if !rbac::has_location_access(&profile.locations, location) {
                return Err(format!("No access to location '{}'", location));
            }
        }

        if let Some((app, level)) = &self.app {
            if !rbac::has_app_access(&profile.role, &profile.app_permissions, app, *level) {
                return Err(format!(
                    "Requires {} access to {} (current: {})",
                    level,
                    app,
                    rbac::app_level(&profile.role, &profile.app_permissions, app)
                ));
            }
        }

        if self.check_route && !rbac::can_access_route(&profile.role, path, grants) {
            let allowed = rbac::route_rule(path)
                .map(|rule| rule.roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            return Err(format!(
                "Route {} requires one of [{}] (current: {})",
                path,
                allowed,
                display_role(&profile.role)
            ));
        }

        Ok(())
    }
}

fn display_role(role: &str) -> &str {
    if rbac::Role::from_name(role).is_some() {
        role
    } else {
        "unknown"
    }
}

/// Middleware state: the shared app state plus this route group's requirement
#[derive(Clone)]
pub struct Gate {
    pub state: AppState,
    pub requirement: Arc<AccessRequirement>,
}

impl Gate {
    pub fn new(state: AppState, requirement: AccessRequirement) -> Self {
        Self {
            state,
            requirement: Arc::new(requirement),
        }
    }
}

/// Request gate: session, then staff profile, then role/permission check.
/// The first failing step answers the request; the handler only runs once
/// all three pass, with `Session` and `StaffProfile` in the extensions.
pub async fn require_access(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let outcome = authorize(&gate.state, &gate.requirement, request.method(), request.headers(), &path).await;

    match outcome {
        Ok((session, profile)) => {
            request.extensions_mut().insert(session);
            request.extensions_mut().insert(profile);
            next.run(request).await
        }
        Err(ApiError::Unauthenticated { message, .. }) if !is_api_path(&path) => {
            let login = login_redirect(&gate.state.config.auth.login_url, &path_and_query);
            ApiError::login_required(message, login).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn authorize(
    state: &AppState,
    requirement: &AccessRequirement,
    method: &Method,
    headers: &HeaderMap,
    path: &str,
) -> Result<(Session, StaffProfile), ApiError> {
    let timeout = Duration::from_millis(state.config.auth.lookup_timeout_ms);
    let action = method.as_str();

    // Unauthenticated -> SessionResolved
    let session = match tokio::time::timeout(timeout, state.sessions.get_session(headers)).await {
        Ok(Ok(Some(session))) => session,
        Ok(Ok(None)) => {
            return Err(deny_unauthenticated(state, action, path, "no session credential"));
        }
        Ok(Err(e)) => {
            tracing::debug!("Session rejected for {}: {}", path, e);
            return Err(deny_unauthenticated(state, action, path, "invalid session"));
        }
        Err(_) => {
            tracing::warn!("Session lookup timed out after {:?}", timeout);
            return Err(deny_unauthenticated(state, action, path, "session lookup timed out"));
        }
    };

    // SessionResolved -> ProfileResolved
    let profile = match tokio::time::timeout(timeout, state.profiles.get_profile(session.user_id)).await {
        Ok(Ok(Some(profile))) if profile.is_active => profile,
        Ok(Ok(Some(_))) => {
            return Err(deny(state, &session, action, path, "Staff profile is inactive"));
        }
        Ok(Ok(None)) => {
            return Err(deny(state, &session, action, path, "No staff profile for this account"));
        }
        Ok(Err(e)) => {
            let reason = ApiError::from(e).message().to_string();
            return Err(deny(state, &session, action, path, &reason));
        }
        Err(_) => {
            tracing::warn!("Profile lookup for {} timed out after {:?}", session.user_id, timeout);
            return Err(deny(state, &session, action, path, "Unable to verify staff profile"));
        }
    };

    // ProfileResolved -> Authorized
    if let Err(reason) = requirement.evaluate(&profile, path) {
        return Err(deny(state, &session, action, path, &reason));
    }

    if requirement.sensitive {
        state.auditor.record(AuditEvent::new(
            Some(session.user_id),
            action,
            path,
            AuditOutcome::Granted,
        ));
    }

    tracing::debug!("Authorized {} ({}) for {} {}", session.email, profile.role, action, path);
    Ok((session, profile))
}

fn deny_unauthenticated(state: &AppState, action: &str, path: &str, reason: &str) -> ApiError {
    state.auditor.record(
        AuditEvent::new(None, action, path, AuditOutcome::Unauthenticated).with_reason(reason),
    );
    ApiError::unauthenticated("Authentication required")
}

fn deny(state: &AppState, session: &Session, action: &str, path: &str, reason: &str) -> ApiError {
    tracing::warn!("Access denied for {} on {} {}: {}", session.user_id, action, path, reason);
    state.auditor.record(
        AuditEvent::new(Some(session.user_id), action, path, AuditOutcome::Denied).with_reason(reason),
    );
    ApiError::forbidden(reason)
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

fn login_redirect(login_url: &str, original: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{}{}redirect={}", login_url, separator, encoded)
}
