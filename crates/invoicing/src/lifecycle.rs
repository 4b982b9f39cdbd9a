//! Invoice lifecycle state machine.
//!
//! Owns the canonical set of legal transitions and the single `transition`
//! entry point every mutation goes through. Matching verdicts are computed
//! by the caller (the matcher is a suspend point) and handed in; when a
//! verdict is present it is authoritative over any conflicting requested
//! status.

use chrono::{DateTime, Utc};

use apflow_core::{DomainError, DomainResult};

use crate::audit::{self, AuditAction, AuditActor, AuditEntry, RequestProvenance};
use crate::invoice::{
    Invoice, InvoicePatch, InvoiceStatus, MatchResult, PmApproval, PmApprovalStatus,
};

/// Audit note appended on a successful match.
pub const MATCH_SUCCESS_NOTE: &str = "Invoice updated and matched successfully";

/// Placeholder when a discrepant verdict carries no messages.
const UNKNOWN_DISCREPANCY: &str = "Unknown";

/// Is `from -> to` a legal manual edge?
///
/// Forced edges (a matching verdict landing on `Verified` or
/// `MatchDiscrepancy`) do not consult this table.
pub fn is_legal_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    use InvoiceStatus::*;
    match from {
        Received => matches!(to, Digitizing | ValidationRequired | Verified),
        Digitizing => matches!(to, ValidationRequired | Verified),
        ValidationRequired => matches!(to, Digitizing | Verified),
        Verified => matches!(to, PendingApproval | MatchDiscrepancy | Rejected),
        // Re-enterable: a corrected resubmission goes back through matching.
        MatchDiscrepancy => matches!(to, ValidationRequired | Verified | Rejected),
        PendingApproval => matches!(to, Approved | Rejected),
        Approved => matches!(to, Paid | Rejected),
        Paid | Rejected => false,
    }
}

/// Does this patch require a matching run?
///
/// Deliberately a standalone pure predicate (not buried in `transition`) so
/// the "when does matching re-run" decision stays explicit and testable on
/// its own: matching runs when the patch requests `Verified`, or when it
/// carries a PO reference at all — whatever status it asks for. An
/// unchanged reference still re-runs matching: the PO/receipt data behind
/// it may have been corrected since the last verdict.
pub fn patch_requires_matching(patch: &InvoicePatch) -> bool {
    patch.status == Some(InvoiceStatus::Verified) || patch.po_number.is_some()
}

/// Result of a resolved transition: the next invoice state and the audit
/// entry that belongs to it (already appended to the trail), if the status
/// actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub invoice: Invoice,
    pub audit: Option<AuditEntry>,
}

impl TransitionOutcome {
    pub fn status_changed(&self) -> bool {
        self.audit.is_some()
    }
}

/// Resolve a patch (and an optional matching verdict) into the next invoice
/// state.
///
/// - A present verdict forces `Verified` on success and `MatchDiscrepancy`
///   on failure, overriding any requested status.
/// - Without a verdict, a requested status is applied iff it is a legal
///   edge; re-requesting the current status is a no-op, not an error.
/// - An audit entry is produced iff the resolved status differs from the
///   prior status.
///
/// Pure: errors leave the input untouched (the caller persists the returned
/// copy or nothing).
pub fn transition(
    invoice: &Invoice,
    patch: &InvoicePatch,
    verdict: Option<MatchResult>,
    actor: &AuditActor,
    provenance: &RequestProvenance,
    now: DateTime<Utc>,
) -> DomainResult<TransitionOutcome> {
    let mut working = invoice.merged_with(patch)?;

    // PM decisions route through the same machine as explicit status
    // requests; legality is checked below like any other edge.
    let mut requested = patch.status;
    if let Some(decision) = &patch.pm_decision {
        if invoice.pm_approval.is_some() && !patch.override_approval {
            return Err(DomainError::validation(
                "pmApproval is settled; pass overrideApproval to replace it",
            ));
        }
        let actor_id = actor.id.ok_or_else(|| {
            DomainError::validation("a PM decision requires an authenticated actor")
        })?;
        working.pm_approval = Some(PmApproval {
            status: decision.decision,
            actor_id,
            actor_role: actor.role.clone(),
            decided_at: now,
            notes: decision.notes.clone(),
        });
        requested = Some(match decision.decision {
            PmApprovalStatus::Approved => InvoiceStatus::Approved,
            PmApprovalStatus::Rejected => InvoiceStatus::Rejected,
        });
    }

    let resolved = match &verdict {
        Some(v) => {
            working.matching = Some(v.clone());
            if v.is_matched {
                InvoiceStatus::Verified
            } else {
                InvoiceStatus::MatchDiscrepancy
            }
        }
        None => match requested {
            Some(to) if to == invoice.status => invoice.status,
            Some(to) => {
                if !is_legal_transition(invoice.status, to) {
                    return Err(DomainError::validation(format!(
                        "invalid transition {} -> {}",
                        invoice.status, to
                    )));
                }
                to
            }
            None => invoice.status,
        },
    };

    working.status = resolved;
    working.updated_at = now;

    let audit = if resolved != invoice.status {
        let action = if verdict.is_some() {
            AuditAction::UpdateAndMatch
        } else if patch.pm_decision.is_some() {
            AuditAction::PmDecision
        } else {
            AuditAction::StatusChange
        };
        let notes = transition_notes(&verdict, invoice.status, resolved);
        let entry = audit::record(
            action,
            actor,
            invoice.status,
            resolved,
            notes,
            provenance,
            now,
        );
        working.audit_trail.push(entry.clone());
        Some(entry)
    } else {
        None
    };

    Ok(TransitionOutcome {
        invoice: working,
        audit,
    })
}

fn transition_notes(
    verdict: &Option<MatchResult>,
    from: InvoiceStatus,
    to: InvoiceStatus,
) -> String {
    match verdict {
        Some(v) if v.is_matched => MATCH_SUCCESS_NOTE.to_string(),
        Some(v) => {
            let detail = if v.discrepancies.is_empty() {
                UNKNOWN_DISCREPANCY.to_string()
            } else {
                v.discrepancies.join(", ")
            };
            format!("Invoice updated with matching discrepancies: {detail}")
        }
        None => format!("Status changed from {from} to {to}"),
    }
}
