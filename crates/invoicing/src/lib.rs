//! `apflow-invoicing` — the invoice domain.
//!
//! Owns the invoice record, its lifecycle state machine, and the audit
//! recorder. Matching verdicts are produced elsewhere (`apflow-matching`)
//! and consumed here; persistence is behind `apflow-infra`.

pub mod audit;
pub mod invoice;
pub mod lifecycle;

pub use audit::{record, AuditAction, AuditActor, AuditEntry, RequestProvenance};
pub use invoice::{
    Invoice, InvoiceCategory, InvoicePatch, InvoiceStatus, LineItem, MatchReference, MatchResult,
    PmApproval, PmApprovalStatus, PmDecision, RoleQuantity, RoleRate, VendorRef,
};
pub use lifecycle::{
    is_legal_transition, patch_requires_matching, transition, TransitionOutcome,
    MATCH_SUCCESS_NOTE,
};
