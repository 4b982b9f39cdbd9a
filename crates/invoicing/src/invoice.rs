//! Invoice record and patch model.
//!
//! Wire/persisted form is camelCase SCREAMING_SNAKE status strings — the
//! shape older records in the invoice store already carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apflow_core::{DomainError, DomainResult, InvoiceId, Money, ProjectId, UserId, VendorId};

use crate::audit::AuditEntry;

/// Invoice status lifecycle.
///
/// Legal edges live in [`crate::lifecycle`]; this enum is the closed set a
/// persisted invoice must always be inside.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Received,
    Digitizing,
    ValidationRequired,
    Verified,
    MatchDiscrepancy,
    PendingApproval,
    Approved,
    Rejected,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Received => "RECEIVED",
            InvoiceStatus::Digitizing => "DIGITIZING",
            InvoiceStatus::ValidationRequired => "VALIDATION_REQUIRED",
            InvoiceStatus::Verified => "VERIFIED",
            InvoiceStatus::MatchDiscrepancy => "MATCH_DISCREPANCY",
            InvoiceStatus::PendingApproval => "PENDING_APPROVAL",
            InvoiceStatus::Approved => "APPROVED",
            InvoiceStatus::Rejected => "REJECTED",
            InvoiceStatus::Paid => "PAID",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Rejected)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice category; decides which matching references are mandatory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceCategory {
    /// Physical deliveries: a PO is mandatory, a goods receipt is expected.
    Goods,
    /// Time-and-materials services: a PO is expected but its absence is a
    /// discrepancy, not a hard failure.
    Services,
    /// Pass-through expenses: no PO, no receipt.
    Expense,
}

impl InvoiceCategory {
    pub fn mandates_po(&self) -> bool {
        matches!(self, InvoiceCategory::Goods)
    }

    pub fn requires_receipt(&self) -> bool {
        matches!(self, InvoiceCategory::Goods)
    }
}

/// Vendor identity embedded on the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRef {
    pub id: VendorId,
    pub name: String,
    pub code: String,
}

/// One billed line: a role at a quantity (units or hours) and unit rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub role: String,
    pub quantity: u32,
    pub unit_rate: Money,
    pub subtotal: Money,
}

impl LineItem {
    /// Build a line with a consistent subtotal.
    pub fn new(role: impl Into<String>, quantity: u32, unit_rate: Money) -> DomainResult<Self> {
        let subtotal = unit_rate
            .checked_mul_qty(quantity)
            .ok_or_else(|| DomainError::invariant("line subtotal overflow"))?;
        Ok(Self {
            role: role.into(),
            quantity,
            unit_rate,
            subtotal,
        })
    }

    /// Invariant: subtotal must equal quantity × unit rate.
    pub fn validate(&self) -> DomainResult<()> {
        let expected = self
            .unit_rate
            .checked_mul_qty(self.quantity)
            .ok_or_else(|| DomainError::invariant("line subtotal overflow"))?;
        if self.subtotal != expected {
            return Err(DomainError::validation(format!(
                "line '{}' subtotal {} does not equal quantity x rate ({})",
                self.role, self.subtotal, expected
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PmApprovalStatus {
    Approved,
    Rejected,
}

/// Project-manager approval decision.
///
/// Once present it is settled: changing it again requires the explicit
/// override flag on the patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmApproval {
    pub status: PmApprovalStatus,
    pub actor_id: UserId,
    pub actor_role: String,
    pub decided_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// PO rate snapshot captured into a match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRate {
    pub role: String,
    pub approved_rate: Money,
}

/// Receipt quantity snapshot captured into a match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleQuantity {
    pub role: String,
    pub quantity: u32,
}

/// Snapshot of the reference values a match verdict was computed from.
///
/// Kept for reproducibility: the audit story must survive later edits to
/// the PO or receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReference {
    pub po_number: Option<String>,
    pub po_total: Option<Money>,
    pub po_rates: Vec<RoleRate>,
    pub received_quantities: Vec<RoleQuantity>,
}

/// Verdict of a three-way match run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub is_matched: bool,
    pub discrepancies: Vec<String>,
    pub matched_at: DateTime<Utc>,
    pub reference: MatchReference,
}

/// The invoice record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub vendor: VendorRef,
    pub submitted_by: UserId,
    pub project_id: Option<ProjectId>,
    pub category: InvoiceCategory,
    pub amount: Money,
    pub po_number: Option<String>,
    pub lines: Vec<LineItem>,
    pub status: InvoiceStatus,
    pub matching: Option<MatchResult>,
    pub pm_approval: Option<PmApproval>,
    /// Append-only; insertion order is the canonical history.
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// A freshly ingested invoice, before digitization.
    pub fn received(
        id: InvoiceId,
        vendor: VendorRef,
        submitted_by: UserId,
        category: InvoiceCategory,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vendor,
            submitted_by,
            project_id: None,
            category,
            amount,
            po_number: None,
            lines: Vec::new(),
            status: InvoiceStatus::Received,
            matching: None,
            pm_approval: None,
            audit_trail: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the data fields of a patch (not status — that is the state
    /// machine's job) and return the merged copy. The original is untouched.
    pub fn merged_with(&self, patch: &InvoicePatch) -> DomainResult<Invoice> {
        let mut merged = self.clone();

        if let Some(po) = &patch.po_number {
            if po.trim().is_empty() {
                return Err(DomainError::validation("poNumber must not be blank"));
            }
            merged.po_number = Some(po.clone());
        }
        if let Some(lines) = &patch.lines {
            for line in lines {
                line.validate()?;
            }
            merged.lines = lines.clone();
        }
        if let Some(amount) = patch.amount {
            merged.amount = amount;
        }

        Ok(merged)
    }
}

/// A PM's approve/reject decision carried on a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmDecision {
    pub decision: PmApprovalStatus,
    pub notes: Option<String>,
}

/// JSON patch accepted by the update endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    pub status: Option<InvoiceStatus>,
    pub po_number: Option<String>,
    pub lines: Option<Vec<LineItem>>,
    pub amount: Option<Money>,
    /// Free-form note; does not touch status and produces no audit entry.
    pub notes: Option<String>,
    pub pm_decision: Option<PmDecision>,
    /// Explicit consent to replace a settled PM approval.
    #[serde(default)]
    pub override_approval: bool,
}

impl InvoicePatch {
    pub fn status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn po_number(po: impl Into<String>) -> Self {
        Self {
            po_number: Some(po.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_subtotal_is_checked() {
        let ok = LineItem::new("Engineer", 10, Money::from_minor(9_500)).unwrap();
        assert_eq!(ok.subtotal, Money::from_minor(95_000));
        assert!(ok.validate().is_ok());

        let tampered = LineItem {
            subtotal: Money::from_minor(1),
            ..ok
        };
        assert!(tampered.validate().is_err());
    }

    #[test]
    fn merge_rejects_blank_po_number() {
        let invoice = test_invoice();
        let err = invoice
            .merged_with(&InvoicePatch::po_number("  "))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn merge_does_not_touch_status_or_audit() {
        let invoice = test_invoice();
        let merged = invoice
            .merged_with(&InvoicePatch::po_number("PO-1001"))
            .unwrap();
        assert_eq!(merged.status, invoice.status);
        assert_eq!(merged.audit_trail.len(), invoice.audit_trail.len());
        assert_eq!(merged.po_number.as_deref(), Some("PO-1001"));
    }

    #[test]
    fn status_serializes_as_screaming_snake() {
        let json = serde_json::to_string(&InvoiceStatus::MatchDiscrepancy).unwrap();
        assert_eq!(json, "\"MATCH_DISCREPANCY\"");
        let back: InvoiceStatus = serde_json::from_str("\"VALIDATION_REQUIRED\"").unwrap();
        assert_eq!(back, InvoiceStatus::ValidationRequired);
    }

    pub(crate) fn test_invoice() -> Invoice {
        Invoice::received(
            InvoiceId::parse("INV-TEST0001").unwrap(),
            VendorRef {
                id: VendorId::new(),
                name: "NexBridge Partners".to_string(),
                code: "NEXB".to_string(),
            },
            UserId::new(),
            InvoiceCategory::Services,
            Money::from_minor(123_456),
            Utc::now(),
        )
    }
}
