use axum::Extension;
use serde::Serialize;

use crate::auth::Session;
use crate::database::StaffProfile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::rbac::{self, Role};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub session: Session,
    pub profile: StaffProfile,
    pub level: u8,
    pub permissions: Vec<String>,
}

/// Role baseline followed by any explicit grants not already covered
pub fn effective_permissions(profile: &StaffProfile) -> Vec<String> {
    let Some(role) = Role::from_name(&profile.role) else {
        return Vec::new();
    };

    let mut permissions: Vec<String> = role.permissions().iter().map(|p| p.to_string()).collect();
    for grant in &profile.permissions {
        if !permissions.contains(grant) {
            permissions.push(grant.clone());
        }
    }
    permissions
}

/// GET /api/auth/whoami
pub async fn whoami(
    Extension(session): Extension<Session>,
    Extension(profile): Extension<StaffProfile>,
) -> ApiResult<WhoAmI> {
    let level = rbac::role_level(&profile.role);
    let permissions = effective_permissions(&profile);

    Ok(ApiResponse::success(WhoAmI {
        session,
        profile,
        level,
        permissions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(role: &str, grants: &[&str]) -> StaffProfile {
        StaffProfile {
            user_id: Uuid::new_v4(),
            email: "staff@example.com".to_string(),
            name: None,
            role: role.to_string(),
            department: None,
            locations: vec![],
            permissions: grants.iter().map(|s| s.to_string()).collect(),
            is_active: true,
            app_permissions: Default::default(),
        }
    }

    #[test]
    fn grants_extend_role_baseline() {
        let perms = effective_permissions(&profile("staff", &["reports:read", "inventory:read"]));
        assert!(perms.contains(&"inventory:read".to_string()));
        assert!(perms.contains(&"reports:read".to_string()));
        assert_eq!(perms.iter().filter(|p| *p == "inventory:read").count(), 1);
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        assert!(effective_permissions(&profile("contractor", &["reports:read"])).is_empty());
    }
}
