//! The invoice update pipeline.
//!
//! One entry point drives a whole update: scoped load, mutation policy,
//! optional three-way match, lifecycle transition, conditional save. The
//! match verdict is computed against the patched snapshot and either the
//! full outcome persists or nothing does.

use chrono::{DateTime, Utc};
use thiserror::Error;

use apflow_auth::{may_update, Actor};
use apflow_core::{DomainError, InvoiceId};
use apflow_invoicing::{
    lifecycle, AuditActor, Invoice, InvoicePatch, RequestProvenance,
};
use apflow_matching::{MatchError, ThreeWayMatcher};
use apflow_purchasing::{GoodsReceiptSource, PurchaseOrderSource};

use crate::repository::InvoiceRepository;

pub const UPDATE_SUCCESS_MESSAGE: &str = "Invoice updated successfully";

/// Failure modes of an update, shaped for transport-layer mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("you do not have permission to update this invoice")]
    Forbidden,

    #[error("invoice not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// PO/receipt backend was unreachable; the update can be retried.
    #[error("matching data is unavailable: {0}")]
    MatchDependency(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for UpdateError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                UpdateError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) => UpdateError::Storage(msg),
            DomainError::NotFound => UpdateError::NotFound,
            DomainError::Conflict(msg) => UpdateError::Conflict(msg),
            DomainError::Unauthenticated => UpdateError::Unauthenticated,
            DomainError::Forbidden(_) => UpdateError::Forbidden,
        }
    }
}

impl From<MatchError> for UpdateError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::PoRequired => UpdateError::Validation(err.to_string()),
            MatchError::Source(e) => UpdateError::MatchDependency(e.to_string()),
        }
    }
}

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub invoice: Invoice,
    pub version: u64,
    pub message: &'static str,
}

pub struct UpdatePipeline<S, P, R> {
    repository: S,
    matcher: ThreeWayMatcher<P, R>,
}

impl<S, P, R> UpdatePipeline<S, P, R>
where
    S: InvoiceRepository,
    P: PurchaseOrderSource,
    R: GoodsReceiptSource,
{
    pub fn new(repository: S, matcher: ThreeWayMatcher<P, R>) -> Self {
        Self {
            repository,
            matcher,
        }
    }

    /// Apply a patch to one invoice on behalf of an actor.
    ///
    /// A record outside the actor's read scope reports `NotFound`, never
    /// `Forbidden`, so callers cannot probe for existence. A concurrent
    /// writer between our read and our save surfaces as `Conflict`; the
    /// caller retries with fresh state.
    pub fn update_invoice(
        &self,
        id: &InvoiceId,
        patch: &InvoicePatch,
        actor: &Actor,
        provenance: &RequestProvenance,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, UpdateError> {
        let Some(current) = self.repository.get(id, actor)? else {
            return Err(UpdateError::NotFound);
        };
        let invoice = current.value;

        if !may_update(actor, invoice.submitted_by, invoice.project_id) {
            return Err(UpdateError::Forbidden);
        }

        // Match against the patched snapshot so a PO number supplied in this
        // very request participates in its own verdict.
        let verdict = if lifecycle::patch_requires_matching(patch) {
            let snapshot = invoice.merged_with(patch)?;
            Some(self.matcher.match_invoice(&snapshot, now)?)
        } else {
            None
        };

        let audit_actor = AuditActor::user(actor.id, actor.name.clone(), actor.role.as_str());
        let outcome = lifecycle::transition(&invoice, patch, verdict, &audit_actor, provenance, now)?;

        let version = self
            .repository
            .save(outcome.invoice.clone(), current.version)?;

        tracing::info!(
            invoice_id = %outcome.invoice.id,
            status = %outcome.invoice.status,
            status_changed = outcome.status_changed(),
            actor = %actor.id,
            "invoice updated"
        );

        Ok(UpdateOutcome {
            invoice: outcome.invoice,
            version,
            message: UPDATE_SUCCESS_MESSAGE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use apflow_auth::Role;
    use apflow_core::{Money, ProjectId, UserId, VendorId};
    use apflow_invoicing::{
        AuditAction, InvoiceCategory, InvoiceStatus, LineItem, PmApprovalStatus, PmDecision,
        VendorRef, MATCH_SUCCESS_NOTE,
    };
    use apflow_purchasing::{GoodsReceipt, PoLine, PurchaseOrder, ReceiptLine};

    use crate::repository::InMemoryInvoiceRepository;
    use crate::sources::{InMemoryGoodsReceiptStore, InMemoryPurchaseOrderStore};

    type TestPipeline = UpdatePipeline<
        Arc<InMemoryInvoiceRepository>,
        Arc<InMemoryPurchaseOrderStore>,
        Arc<InMemoryGoodsReceiptStore>,
    >;

    struct Fixture {
        pipeline: TestPipeline,
        repo: Arc<InMemoryInvoiceRepository>,
        orders: Arc<InMemoryPurchaseOrderStore>,
        receipts: Arc<InMemoryGoodsReceiptStore>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let orders = Arc::new(InMemoryPurchaseOrderStore::new());
        let receipts = Arc::new(InMemoryGoodsReceiptStore::new());
        let pipeline = UpdatePipeline::new(
            Arc::clone(&repo),
            ThreeWayMatcher::new(Arc::clone(&orders), Arc::clone(&receipts)),
        );
        Fixture {
            pipeline,
            repo,
            orders,
            receipts,
        }
    }

    fn finance() -> Actor {
        Actor::new(UserId::new(), "Priya", Role::FinanceUser)
    }

    fn seeded_invoice(fx: &Fixture, status: InvoiceStatus) -> Invoice {
        let mut inv = Invoice::received(
            InvoiceId::parse("INV-PIPE0001").unwrap(),
            VendorRef {
                id: VendorId::new(),
                name: "NexBridge Partners".to_string(),
                code: "NEXB".to_string(),
            },
            UserId::new(),
            InvoiceCategory::Services,
            Money::from_minor(95_000),
            Utc::now(),
        );
        inv.status = status;
        inv.lines = vec![LineItem::new("Engineer", 10, Money::from_minor(9_500)).unwrap()];
        fx.repo.insert(inv.clone()).unwrap();
        inv
    }

    #[test]
    fn verify_with_matching_po_lands_in_verified_with_audit() {
        let fx = fixture();
        let inv = seeded_invoice(&fx, InvoiceStatus::ValidationRequired);
        fx.orders
            .put(PurchaseOrder {
                number: "PO-1001".to_string(),
                vendor_id: inv.vendor.id,
                project_id: None,
                lines: vec![PoLine {
                    role: "Engineer".to_string(),
                    quantity: 10,
                    approved_rate: Money::from_minor(9_500),
                }],
                total: Money::from_minor(95_000),
            })
            .unwrap();

        let patch = InvoicePatch {
            status: Some(InvoiceStatus::Verified),
            po_number: Some("PO-1001".to_string()),
            ..Default::default()
        };
        let outcome = fx
            .pipeline
            .update_invoice(
                &inv.id,
                &patch,
                &finance(),
                &RequestProvenance::new("10.1.2.3", "jest/29"),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::Verified);
        assert_eq!(outcome.message, UPDATE_SUCCESS_MESSAGE);
        assert_eq!(outcome.version, 2);
        let entry = outcome.invoice.audit_trail.last().unwrap();
        assert_eq!(entry.action, AuditAction::UpdateAndMatch);
        assert_eq!(entry.notes, MATCH_SUCCESS_NOTE);
        assert_eq!(entry.ip_address, "10.1.2.3");

        // The persisted record is the returned record.
        let stored = fx.repo.get(&inv.id, &finance()).unwrap().unwrap();
        assert_eq!(stored.value, outcome.invoice);
    }

    #[test]
    fn short_delivery_lands_in_discrepancy_with_detail_note() {
        let fx = fixture();
        let mut inv = seeded_invoice(&fx, InvoiceStatus::ValidationRequired);
        inv.category = InvoiceCategory::Goods;
        fx.repo.save(inv.clone(), 1).unwrap();

        fx.orders
            .put(PurchaseOrder {
                number: "PO-2002".to_string(),
                vendor_id: inv.vendor.id,
                project_id: None,
                lines: vec![PoLine {
                    role: "Engineer".to_string(),
                    quantity: 10,
                    approved_rate: Money::from_minor(9_500),
                }],
                total: Money::from_minor(95_000),
            })
            .unwrap();
        fx.receipts
            .put(GoodsReceipt {
                po_number: "PO-2002".to_string(),
                lines: vec![ReceiptLine {
                    role: "Engineer".to_string(),
                    received_quantity: 8,
                }],
            })
            .unwrap();

        let patch = InvoicePatch {
            status: Some(InvoiceStatus::Verified),
            po_number: Some("PO-2002".to_string()),
            ..Default::default()
        };
        let outcome = fx
            .pipeline
            .update_invoice(
                &inv.id,
                &patch,
                &finance(),
                &RequestProvenance::unknown(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::MatchDiscrepancy);
        let matching = outcome.invoice.matching.as_ref().unwrap();
        assert!(!matching.is_matched);
        let entry = outcome.invoice.audit_trail.last().unwrap();
        assert!(entry
            .notes
            .contains("Quantity mismatch for line 'Engineer': invoiced 10, received 8"));
    }

    #[test]
    fn resubmitting_the_same_po_number_re_matches_after_upstream_correction() {
        let fx = fixture();
        let mut inv = seeded_invoice(&fx, InvoiceStatus::MatchDiscrepancy);
        inv.po_number = Some("PO-1001".to_string());
        fx.repo.save(inv.clone(), 1).unwrap();

        // The PO was fixed upstream after the discrepant verdict.
        fx.orders
            .put(PurchaseOrder {
                number: "PO-1001".to_string(),
                vendor_id: inv.vendor.id,
                project_id: None,
                lines: vec![PoLine {
                    role: "Engineer".to_string(),
                    quantity: 10,
                    approved_rate: Money::from_minor(9_500),
                }],
                total: Money::from_minor(95_000),
            })
            .unwrap();

        let outcome = fx
            .pipeline
            .update_invoice(
                &inv.id,
                &InvoicePatch::po_number("PO-1001"),
                &finance(),
                &RequestProvenance::unknown(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::Verified);
        assert!(outcome.invoice.matching.unwrap().is_matched);
    }

    #[test]
    fn pm_decision_moves_pending_approval_to_approved() {
        let fx = fixture();
        let project = ProjectId::new();
        let mut inv = seeded_invoice(&fx, InvoiceStatus::PendingApproval);
        inv.project_id = Some(project);
        fx.repo.save(inv.clone(), 1).unwrap();

        let pm = Actor::new(UserId::new(), "Dana", Role::ProjectManager)
            .with_projects(vec![project]);
        let patch = InvoicePatch {
            pm_decision: Some(PmDecision {
                decision: PmApprovalStatus::Approved,
                notes: Some("Rates check out".to_string()),
            }),
            ..Default::default()
        };
        let outcome = fx
            .pipeline
            .update_invoice(&inv.id, &patch, &pm, &RequestProvenance::unknown(), Utc::now())
            .unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::Approved);
        let approval = outcome.invoice.pm_approval.unwrap();
        assert_eq!(approval.status, PmApprovalStatus::Approved);
        assert_eq!(approval.actor_id, pm.id);
        let entry = outcome.invoice.audit_trail.last().unwrap();
        assert_eq!(entry.action, AuditAction::PmDecision);
    }

    #[test]
    fn cross_vendor_update_reads_as_not_found() {
        let fx = fixture();
        let inv = seeded_invoice(&fx, InvoiceStatus::Received);

        let stranger = Actor::new(UserId::new(), "Other Vendor", Role::Vendor);
        let err = fx
            .pipeline
            .update_invoice(
                &inv.id,
                &InvoicePatch::status(InvoiceStatus::Digitizing),
                &stranger,
                &RequestProvenance::unknown(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, UpdateError::NotFound);
    }

    #[test]
    fn illegal_transition_fails_and_persists_nothing() {
        let fx = fixture();
        let inv = seeded_invoice(&fx, InvoiceStatus::Received);

        let err = fx
            .pipeline
            .update_invoice(
                &inv.id,
                &InvoicePatch::status(InvoiceStatus::Paid),
                &finance(),
                &RequestProvenance::unknown(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));

        let stored = fx.repo.get(&inv.id, &finance()).unwrap().unwrap();
        assert_eq!(stored.value.status, InvoiceStatus::Received);
        assert_eq!(stored.version, 1);
        assert!(stored.value.audit_trail.is_empty());
    }

    #[test]
    fn replaying_the_same_status_adds_no_second_audit_entry() {
        let fx = fixture();
        let inv = seeded_invoice(&fx, InvoiceStatus::Received);
        let patch = InvoicePatch::status(InvoiceStatus::Digitizing);

        let first = fx
            .pipeline
            .update_invoice(&inv.id, &patch, &finance(), &RequestProvenance::unknown(), Utc::now())
            .unwrap();
        assert_eq!(first.invoice.audit_trail.len(), 1);

        let second = fx
            .pipeline
            .update_invoice(&inv.id, &patch, &finance(), &RequestProvenance::unknown(), Utc::now())
            .unwrap();
        assert_eq!(second.invoice.status, InvoiceStatus::Digitizing);
        assert_eq!(second.invoice.audit_trail.len(), 1);
    }

    #[test]
    fn unreachable_po_backend_is_a_retryable_dependency_error() {
        struct DownSource;
        impl PurchaseOrderSource for DownSource {
            fn find_by_number(
                &self,
                _: &str,
            ) -> Result<Option<PurchaseOrder>, apflow_purchasing::SourceError> {
                Err(apflow_purchasing::SourceError::new("connection refused"))
            }
        }
        impl GoodsReceiptSource for DownSource {
            fn find_by_po_number(
                &self,
                _: &str,
            ) -> Result<Option<GoodsReceipt>, apflow_purchasing::SourceError> {
                Err(apflow_purchasing::SourceError::new("connection refused"))
            }
        }

        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let pipeline =
            UpdatePipeline::new(Arc::clone(&repo), ThreeWayMatcher::new(DownSource, DownSource));

        let mut inv = Invoice::received(
            InvoiceId::parse("INV-PIPE0002").unwrap(),
            VendorRef {
                id: VendorId::new(),
                name: "NexBridge Partners".to_string(),
                code: "NEXB".to_string(),
            },
            UserId::new(),
            InvoiceCategory::Services,
            Money::from_minor(95_000),
            Utc::now(),
        );
        inv.status = InvoiceStatus::ValidationRequired;
        repo.insert(inv.clone()).unwrap();

        let err = pipeline
            .update_invoice(
                &inv.id,
                &InvoicePatch::po_number("PO-1001"),
                &finance(),
                &RequestProvenance::unknown(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, UpdateError::MatchDependency(_)));

        let stored = repo.get(&inv.id, &finance()).unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.value.po_number.is_none());
    }
}
