use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{output_result, yes_no};
use crate::cli::OutputFormat;
use crate::rbac::{self, AppLevel, AppLevels, Role};

#[derive(Subcommand)]
pub enum AccessCommands {
    #[command(about = "Evaluate a role against a permission and/or route")]
    Check {
        #[arg(long, help = "Role name (patient, staff, manager, superadmin)")]
        role: String,
        #[arg(long, help = "Permission to test, e.g. inventory:read")]
        permission: Option<String>,
        #[arg(long, help = "Route to test, e.g. /admin")]
        route: Option<String>,
        #[arg(long = "grant", help = "Explicit grant held by the user (repeatable)")]
        grants: Vec<String>,
        #[arg(long, help = "App to test, e.g. inventory")]
        app: Option<String>,
        #[arg(long, default_value = "read", value_parser = parse_level, help = "Level required in --app")]
        level: AppLevel,
        #[arg(long = "app-grant", value_parser = parse_app_grant, help = "App grant as app=level (repeatable)")]
        app_grants: Vec<(String, AppLevel)>,
    },
}

#[derive(Debug, Serialize)]
struct AccessAnswer {
    role: String,
    known_role: bool,
    level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_permission: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    can_access_route: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_level: Option<AppLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_app_access: Option<bool>,
}

fn parse_level(raw: &str) -> Result<AppLevel, String> {
    AppLevel::from_name(raw).ok_or_else(|| format!("unknown level '{}' (none, read, write, admin)", raw))
}

fn parse_app_grant(raw: &str) -> Result<(String, AppLevel), String> {
    let (app, level) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected app=level, got '{}'", raw))?;
    Ok((app.trim().to_string(), parse_level(level)?))
}

pub async fn handle(cmd: AccessCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AccessCommands::Check {
            role,
            permission,
            route,
            grants,
            app,
            level,
            app_grants,
        } => {
            let grants = (!grants.is_empty()).then_some(grants.as_slice());
            let app_grants: AppLevels = app_grants.into_iter().collect();

            let answer = AccessAnswer {
                known_role: Role::from_name(&role).is_some(),
                level: rbac::role_level(&role),
                has_permission: permission
                    .as_deref()
                    .map(|p| rbac::has_permission(&role, p, grants)),
                can_access_route: route.as_deref().map(|r| rbac::can_access_route(&role, r, grants)),
                app_level: app.as_deref().map(|a| rbac::app_level(&role, &app_grants, a)),
                has_app_access: app
                    .as_deref()
                    .map(|a| rbac::has_app_access(&role, &app_grants, a, level)),
                role,
            };

            output_result(output_format, &answer, |a| {
                println!("role: {} (level {}{})", a.role, a.level, if a.known_role { "" } else { ", unknown" });
                if let (Some(p), Some(ok)) = (&permission, a.has_permission) {
                    println!("permission {}: {}", p, yes_no(ok));
                }
                if let (Some(r), Some(ok)) = (&route, a.can_access_route) {
                    println!("route {}: {}", r, yes_no(ok));
                }
                if let (Some(name), Some(current), Some(ok)) = (&app, a.app_level, a.has_app_access) {
                    println!("app {} ({} required, has {}): {}", name, level, current, yes_no(ok));
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_grant_argument_parses() {
        assert_eq!(
            parse_app_grant("inventory=admin"),
            Ok(("inventory".to_string(), AppLevel::Admin))
        );
        assert!(parse_app_grant("inventory").is_err());
        assert!(parse_app_grant("inventory=owner").is_err());
    }
}
