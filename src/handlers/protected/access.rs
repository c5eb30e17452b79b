use axum::{extract::Query, Extension};
use serde::{Deserialize, Serialize};

use crate::database::StaffProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::rbac::{self, AppLevel};

#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    pub role: Option<String>,
    pub permission: Option<String>,
    pub location: Option<String>,
    pub route: Option<String>,
    pub app: Option<String>,
    /// Level asked for with `app`, `read` when omitted
    pub level: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_role: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_permission: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_location_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_access_route: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_level: Option<AppLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_app_access: Option<bool>,
}

pub fn check(profile: &StaffProfile, query: &AccessQuery, app_required: AppLevel) -> AccessReport {
    let grants = Some(profile.permissions.as_slice());
    let apps = &profile.app_permissions;

    AccessReport {
        role: profile.role.clone(),
        has_role: query.role.as_deref().map(|r| rbac::has_role(&profile.role, r)),
        has_permission: query
            .permission
            .as_deref()
            .map(|p| rbac::has_permission(&profile.role, p, grants)),
        has_location_access: query
            .location
            .as_deref()
            .map(|l| rbac::has_location_access(&profile.locations, l)),
        can_access_route: query
            .route
            .as_deref()
            .map(|r| rbac::can_access_route(&profile.role, r, grants)),
        app_level: query.app.as_deref().map(|a| rbac::app_level(&profile.role, apps, a)),
        has_app_access: query
            .app
            .as_deref()
            .map(|a| rbac::has_app_access(&profile.role, apps, a, app_required)),
    }
}

/// GET /api/access/check?role=&permission=&location=&route=&app=&level=
///
/// Answers for the calling user only; at least one question is required.
pub async fn access_check(
    Extension(profile): Extension<StaffProfile>,
    Query(query): Query<AccessQuery>,
) -> ApiResult<AccessReport> {
    if query.role.is_none()
        && query.permission.is_none()
        && query.location.is_none()
        && query.route.is_none()
        && query.app.is_none()
    {
        return Err(ApiError::bad_request(
            "Provide at least one of role, permission, location, route or app",
        ));
    }

    let app_required = match query.level.as_deref() {
        None => AppLevel::Read,
        Some(raw) => AppLevel::from_name(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown app access level '{}'", raw)))?,
    };

    Ok(ApiResponse::success(check(&profile, &query, app_required)))
}
