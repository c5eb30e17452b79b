//! Fire-and-forget audit trail for gate decisions.
//!
//! The gate hands events to [`Auditor::record`], which spawns the sink call
//! and only logs sink failures. A broken audit backend never fails a request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Granted,
    Unauthenticated,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Granted => "granted",
            AuditOutcome::Unauthenticated => "unauthenticated",
            AuditOutcome::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: Option<Uuid>,
    pub action: String,
    pub resource: String,
    pub outcome: AuditOutcome,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor: Option<Uuid>,
        action: impl Into<String>,
        resource: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            resource: resource.into(),
            outcome,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Cheap handle shared through `AppState`
#[derive(Clone)]
pub struct Auditor {
    sink: Option<Arc<dyn AuditSink>>,
}

impl Auditor {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn record(&self, event: AuditEvent) {
        let Some(sink) = self.sink.clone() else {
            return;
        };

        tokio::spawn(async move {
            let action = event.action.clone();
            if let Err(e) = sink.record(event).await {
                tracing::warn!("Audit sink failed to record '{}': {}", action, e);
            }
        });
    }
}

/// Emits one structured log line per event under the `audit` target
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            target: "audit",
            actor = ?event.actor,
            action = %event.action,
            resource = %event.resource,
            outcome = event.outcome.as_str(),
            reason = event.reason.as_deref().unwrap_or(""),
            timestamp = %event.timestamp,
            "audit event"
        );
        Ok(())
    }
}

pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let query = r#"
            INSERT INTO audit_logs (user_id, action, resource, outcome, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(event.actor)
            .bind(&event.action)
            .bind(&event.resource)
            .bind(event.outcome.as_str())
            .bind(&event.reason)
            .bind(event.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Keeps events in memory; lets tests assert on what the gate recorded
#[derive(Default, Clone)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}
