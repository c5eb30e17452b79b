//! Per-app access levels, granted per user and app name with role defaults
//! when no grant exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Role;

/// Ordered so that a higher level implies every lower one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLevel {
    None,
    Read,
    Write,
    Admin,
}

impl AppLevel {
    pub fn from_name(name: &str) -> Option<AppLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(AppLevel::None),
            "read" => Some(AppLevel::Read),
            "write" => Some(AppLevel::Write),
            "admin" => Some(AppLevel::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppLevel::None => "none",
            AppLevel::Read => "read",
            AppLevel::Write => "write",
            AppLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AppLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// App grants keyed by app name
pub type AppLevels = BTreeMap<String, AppLevel>;

/// Level a role gets in any app it holds no explicit grant for
fn default_level(role: Role) -> AppLevel {
    match role {
        Role::Superadmin => AppLevel::Admin,
        Role::Manager | Role::Staff => AppLevel::Write,
        Role::Patient => AppLevel::None,
    }
}

/// Effective level for `app`. Superadmin is always admin; otherwise an
/// explicit grant (including `none`) replaces the role default. Unknown
/// roles get `none`.
pub fn app_level(role: &str, grants: &AppLevels, app: &str) -> AppLevel {
    let Some(role) = Role::from_name(role) else {
        return AppLevel::None;
    };

    if role == Role::Superadmin {
        return AppLevel::Admin;
    }

    grants.get(app).copied().unwrap_or_else(|| default_level(role))
}

/// True iff the user's effective level in `app` is at least `required`.
/// An unknown role is denied at every level.
pub fn has_app_access(role: &str, grants: &AppLevels, app: &str, required: AppLevel) -> bool {
    Role::from_name(role).is_some() && app_level(role, grants, app) >= required
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(items: &[(&str, AppLevel)]) -> AppLevels {
        items.iter().map(|(app, level)| (app.to_string(), *level)).collect()
    }

    #[test]
    fn levels_are_ordered() {
        assert!(AppLevel::None < AppLevel::Read);
        assert!(AppLevel::Read < AppLevel::Write);
        assert!(AppLevel::Write < AppLevel::Admin);
        assert_eq!(AppLevel::from_name(" Write "), Some(AppLevel::Write));
        assert_eq!(AppLevel::from_name("owner"), None);
    }

    #[test]
    fn role_defaults_apply_without_grant() {
        let none = AppLevels::new();
        assert!(has_app_access("staff", &none, "inventory", AppLevel::Write));
        assert!(!has_app_access("staff", &none, "inventory", AppLevel::Admin));
        assert!(has_app_access("manager", &none, "inventory", AppLevel::Read));
        assert!(!has_app_access("patient", &none, "inventory", AppLevel::Read));
        assert!(has_app_access("superadmin", &none, "inventory", AppLevel::Admin));
    }

    #[test]
    fn explicit_grant_replaces_default() {
        let grants = levels(&[("inventory", AppLevel::Admin), ("pharma", AppLevel::None)]);
        assert!(has_app_access("staff", &grants, "inventory", AppLevel::Admin));
        assert!(!has_app_access("staff", &grants, "pharma", AppLevel::Read));
        assert!(has_app_access("patient", &levels(&[("handouts", AppLevel::Read)]), "handouts", AppLevel::Read));
    }

    #[test]
    fn superadmin_ignores_grants() {
        let grants = levels(&[("inventory", AppLevel::None)]);
        assert_eq!(app_level("superadmin", &grants, "inventory"), AppLevel::Admin);
    }

    #[test]
    fn unknown_role_is_denied_even_with_grants() {
        let grants = levels(&[("inventory", AppLevel::Admin)]);
        for role in ["", "admin", "viewer"] {
            assert_eq!(app_level(role, &grants, "inventory"), AppLevel::None);
            assert!(!has_app_access(role, &grants, "inventory", AppLevel::None));
        }
    }
}
