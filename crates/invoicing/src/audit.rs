//! Audit trail recorder.
//!
//! Entries are created exclusively alongside a status change and appended to
//! the owning invoice; after append they are never mutated or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apflow_core::UserId;

use crate::invoice::InvoiceStatus;

/// Action tag on a trail entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Status resolved through a matching run.
    UpdateAndMatch,
    /// Plain status change without matching.
    StatusChange,
    /// Project-manager approval decision.
    PmDecision,
}

/// Request provenance captured at the HTTP boundary.
///
/// Must be extracted before any async work in the request path; upstream
/// proxies do not reliably preserve these headers after intervening calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestProvenance {
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestProvenance {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

/// Who performed a mutation, as recorded on the trail.
///
/// Decoupled from the auth layer so the domain crate stays transport- and
/// token-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    /// None for system-initiated actions (ingestion jobs, migrations).
    pub id: Option<UserId>,
    pub name: String,
    pub role: String,
}

impl AuditActor {
    pub fn user(id: UserId, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            role: role.into(),
        }
    }

    pub fn system() -> Self {
        Self {
            id: None,
            name: "System".to_string(),
            role: "SYSTEM".to_string(),
        }
    }
}

/// One immutable trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor: String,
    pub actor_id: Option<UserId>,
    pub actor_role: String,
    pub timestamp: DateTime<Utc>,
    pub previous_status: InvoiceStatus,
    pub new_status: InvoiceStatus,
    pub notes: String,
    pub ip_address: String,
    pub user_agent: String,
}

/// Build a trail entry. Deterministic given its inputs.
pub fn record(
    action: AuditAction,
    actor: &AuditActor,
    previous_status: InvoiceStatus,
    new_status: InvoiceStatus,
    notes: impl Into<String>,
    provenance: &RequestProvenance,
    now: DateTime<Utc>,
) -> AuditEntry {
    AuditEntry {
        action,
        actor: actor.name.clone(),
        actor_id: actor.id,
        actor_role: actor.role.clone(),
        timestamp: now,
        previous_status,
        new_status,
        notes: notes.into(),
        ip_address: provenance.ip_address.clone(),
        user_agent: provenance.user_agent.clone(),
    }
}
