//! Role and permission checks for staff portal users.
//!
//! Every check takes the raw role string from the staff directory. Strings
//! that do not name a known role resolve to level 0 with no permissions, so
//! malformed input always ends in a deny.

pub mod apps;
pub mod routes;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use apps::{app_level, has_app_access, AppLevel, AppLevels};
pub use routes::{can_access_route, route_rule, RouteRule};

/// Grants every permission when present in a role's set or an explicit grant list
pub const WILDCARD: &str = "*";

/// Grants every location when present in a user's location list
pub const ALL_LOCATIONS: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Staff,
    Manager,
    Superadmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Patient, Role::Staff, Role::Manager, Role::Superadmin];

    /// Case-insensitive lookup, `None` for anything outside the closed set
    pub fn from_name(name: &str) -> Option<Role> {
        match name.trim().to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "staff" => Some(Role::Staff),
            "manager" => Some(Role::Manager),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Role::Patient => 1,
            Role::Staff => 2,
            Role::Manager => 3,
            Role::Superadmin => 4,
        }
    }

    /// Static permission set for the role
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Patient => &["appointments:read_own", "handouts:read"],
            Role::Staff => &[
                "appointments:read_own",
                "handouts:read",
                "handouts:write",
                "inventory:read",
                "inventory:write",
                "schedule:read",
                "patients:read",
                "training:read",
            ],
            Role::Manager => &[
                "appointments:read_own",
                "handouts:read",
                "handouts:write",
                "inventory:read",
                "inventory:write",
                "inventory:approve",
                "schedule:read",
                "schedule:write",
                "patients:read",
                "training:read",
                "training:manage",
                "reports:read",
                "staff:manage",
                "purchasing:approve",
            ],
            Role::Superadmin => &[WILDCARD],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric level for a role string; 0 when the role is unknown
pub fn role_level(role: &str) -> u8 {
    Role::from_name(role).map(|r| r.level()).unwrap_or(0)
}

/// Role baseline plus explicit grants. Grants only add; an unknown role
/// denies even when grants are supplied.
pub fn has_permission(role: &str, permission: &str, explicit_grants: Option<&[String]>) -> bool {
    let Some(role) = Role::from_name(role) else {
        return false;
    };

    if role == Role::Superadmin {
        return true;
    }

    if role.permissions().iter().any(|p| *p == permission) {
        return true;
    }

    explicit_grants
        .map(|grants| grants.iter().any(|g| g == permission || g == WILDCARD))
        .unwrap_or(false)
}

/// True iff `role` sits at or above `required_role` in the hierarchy
pub fn has_role(role: &str, required_role: &str) -> bool {
    let (Some(actual), Some(required)) = (Role::from_name(role), Role::from_name(required_role))
    else {
        return false;
    };
    actual.level() >= required.level()
}

pub fn has_location_access(user_locations: &[String], required_location: &str) -> bool {
    user_locations
        .iter()
        .any(|loc| loc == ALL_LOCATIONS || loc == required_location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn superadmin_holds_every_permission() {
        for permission in ["inventory:read", "anything:at_all", "", "*"] {
            assert!(has_permission("superadmin", permission, None));
        }
    }

    #[test]
    fn static_permissions_are_consulted() {
        assert!(has_permission("staff", "inventory:write", None));
        assert!(!has_permission("staff", "reports:read", None));
        assert!(has_permission("manager", "reports:read", None));
        assert!(!has_permission("patient", "inventory:read", None));
    }

    #[test]
    fn explicit_grants_only_add() {
        let extra = grants(&["reports:read"]);
        assert!(has_permission("staff", "reports:read", Some(&extra)));
        // A grant list never removes the baseline
        assert!(has_permission("staff", "inventory:read", Some(&extra)));

        let all = grants(&["*"]);
        assert!(has_permission("patient", "staff:manage", Some(&all)));
    }

    #[test]
    fn unknown_roles_deny_everything() {
        let all = grants(&["*"]);
        for role in ["", "admin", "root", "super admin", "🙂"] {
            assert_eq!(role_level(role), 0);
            assert!(!has_permission(role, "handouts:read", None));
            assert!(!has_permission(role, "handouts:read", Some(&all)));
            assert!(!has_role(role, "patient"));
            assert!(!has_role("superadmin", role));
        }
    }

    #[test]
    fn role_hierarchy_is_total() {
        for lower in Role::ALL {
            for higher in Role::ALL {
                if lower.level() < higher.level() {
                    assert!(!has_role(lower.as_str(), higher.as_str()));
                    assert!(has_role(higher.as_str(), lower.as_str()));
                }
            }
            assert!(has_role(lower.as_str(), lower.as_str()));
        }
    }

    #[test]
    fn role_names_are_case_insensitive() {
        assert_eq!(Role::from_name("Manager"), Some(Role::Manager));
        assert_eq!(Role::from_name(" SUPERADMIN "), Some(Role::Superadmin));
    }

    #[test]
    fn location_access() {
        let locations = grants(&["ann-arbor", "wixom"]);
        assert!(has_location_access(&locations, "wixom"));
        assert!(!has_location_access(&locations, "plymouth"));
        assert!(has_location_access(&grants(&["*"]), "plymouth"));
        assert!(!has_location_access(&[], "wixom"));
    }
}
