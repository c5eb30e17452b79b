use once_cell::sync::Lazy;

use super::{has_permission, Role};

/// Protected route prefix with the roles allowed through it. A user outside
/// `roles` still passes when they hold `permission`.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub route: &'static str,
    pub roles: &'static [Role],
    pub permission: Option<&'static str>,
}

const STAFF_AND_UP: &[Role] = &[Role::Staff, Role::Manager, Role::Superadmin];
const MANAGER_AND_UP: &[Role] = &[Role::Manager, Role::Superadmin];
const SUPERADMIN_ONLY: &[Role] = &[Role::Superadmin];

static ROUTE_RULES: Lazy<Vec<RouteRule>> = Lazy::new(|| {
    vec![
        RouteRule { route: "/admin", roles: SUPERADMIN_ONLY, permission: None },
        RouteRule { route: "/config", roles: SUPERADMIN_ONLY, permission: None },
        RouteRule { route: "/api/routes/refresh", roles: SUPERADMIN_ONLY, permission: None },
        RouteRule { route: "/dashboard", roles: STAFF_AND_UP, permission: None },
        RouteRule { route: "/inventory", roles: STAFF_AND_UP, permission: Some("inventory:read") },
        RouteRule { route: "/handouts", roles: STAFF_AND_UP, permission: Some("handouts:read") },
        RouteRule { route: "/compliance", roles: STAFF_AND_UP, permission: Some("training:read") },
        RouteRule { route: "/staffing", roles: MANAGER_AND_UP, permission: Some("schedule:write") },
        RouteRule { route: "/reports", roles: MANAGER_AND_UP, permission: Some("reports:read") },
        RouteRule { route: "/purchasing", roles: MANAGER_AND_UP, permission: Some("purchasing:approve") },
        RouteRule { route: "/batch", roles: MANAGER_AND_UP, permission: None },
    ]
});

fn covers(rule_route: &str, route: &str) -> bool {
    match route.strip_prefix(rule_route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Most specific rule covering `route`, `None` when the route is public
pub fn route_rule(route: &str) -> Option<&'static RouteRule> {
    let route = route.split(['?', '#']).next().unwrap_or(route);
    ROUTE_RULES
        .iter()
        .filter(|rule| covers(rule.route, route))
        .max_by_key(|rule| rule.route.len())
}

pub fn can_access_route(role: &str, route: &str, explicit_grants: Option<&[String]>) -> bool {
    let Some(parsed) = Role::from_name(role) else {
        return false;
    };

    let Some(rule) = route_rule(route) else {
        return true;
    };

    if rule.roles.contains(&parsed) {
        return true;
    }

    rule.permission
        .map(|permission| has_permission(role, permission, explicit_grants))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_route_is_superadmin_only() {
        assert!(!can_access_route("staff", "/admin", None));
        assert!(!can_access_route("manager", "/admin/users", None));
        assert!(can_access_route("superadmin", "/admin", None));
    }

    #[test]
    fn unmapped_routes_are_public() {
        assert!(can_access_route("staff", "/unmapped-public-route", None));
        assert!(can_access_route("patient", "/", None));
    }

    #[test]
    fn unknown_role_is_denied() {
        assert!(!can_access_route("intern", "/admin", None));
        assert!(!can_access_route("intern", "/unmapped-public-route", None));
    }

    #[test]
    fn prefix_matching_respects_segments() {
        assert!(route_rule("/administrator").is_none());
        assert_eq!(route_rule("/admin/users?page=2").map(|r| r.route), Some("/admin"));
        assert_eq!(
            route_rule("/api/routes/refresh").map(|r| r.route),
            Some("/api/routes/refresh")
        );
    }

    #[test]
    fn explicit_grant_opens_permission_backed_route() {
        assert!(!can_access_route("staff", "/reports", None));
        let grants = vec!["reports:read".to_string()];
        assert!(can_access_route("staff", "/reports/monthly", Some(&grants)));
        // Routes without a backing permission ignore grants
        assert!(!can_access_route("staff", "/batch", Some(&grants)));
    }

    #[test]
    fn patient_cannot_reach_staff_tools() {
        assert!(!can_access_route("patient", "/inventory", None));
        assert!(can_access_route("staff", "/inventory/items", None));
    }
}
