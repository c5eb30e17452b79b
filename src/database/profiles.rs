use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProfileError;
use crate::rbac::{AppLevel, AppLevels};

/// Staff directory record joined to a session's user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub department: Option<String>,
    pub locations: Vec<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    /// Per-app access grants; apps missing here fall back to the role default
    #[serde(default)]
    pub app_permissions: AppLevels,
}

/// Staff directory seam. Profiles are read fresh on every request.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<StaffProfile>, ProfileError>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<StaffProfile>, ProfileError> {
        let query = r#"
            SELECT
                user_id, email, name, role, department,
                locations, permissions, is_active
            FROM staff_profiles
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let app_permissions = self.app_permissions(user_id).await?;

        Ok(Some(StaffProfile {
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
            department: row.try_get("department")?,
            locations: row.try_get::<Option<Vec<String>>, _>("locations")?.unwrap_or_default(),
            permissions: row.try_get::<Option<Vec<String>>, _>("permissions")?.unwrap_or_default(),
            is_active: row.try_get("is_active")?,
            app_permissions,
        }))
    }
}

impl PgProfileStore {
    /// Unexpired app grants; rows with an unrecognised level are skipped
    async fn app_permissions(&self, user_id: Uuid) -> Result<AppLevels, ProfileError> {
        let query = r#"
            SELECT app_name, permission_level
            FROM app_permissions
            WHERE user_id = $1
              AND (expires_at IS NULL OR expires_at > now())
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let mut levels = AppLevels::new();
        for row in rows {
            let app: String = row.try_get("app_name")?;
            let raw: String = row.try_get("permission_level")?;
            match AppLevel::from_name(&raw) {
                Some(level) => {
                    levels.insert(app, level);
                }
                None => tracing::warn!("Ignoring app permission '{}' on {} for {}", raw, app, user_id),
            }
        }
        Ok(levels)
    }
}

/// In-process directory for development and tests
#[derive(Default, Clone)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<Uuid, StaffProfile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: StaffProfile) {
        self.profiles.write().await.insert(profile.user_id, profile);
    }

    pub async fn remove(&self, user_id: Uuid) -> Option<StaffProfile> {
        self.profiles.write().await.remove(&user_id)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<StaffProfile>, ProfileError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}
