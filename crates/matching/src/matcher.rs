//! The three-way match algorithm.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use apflow_core::Money;
use apflow_invoicing::{Invoice, MatchReference, MatchResult, RoleQuantity, RoleRate};
use apflow_purchasing::{
    GoodsReceiptSource, PurchaseOrder, PurchaseOrderSource, SourceError,
};

use crate::tolerance::TolerancePolicy;

/// Matching failures that are not discrepancies.
///
/// A discrepancy is a completed comparison that found a mismatch; these are
/// the cases where the comparison could not validly run at all. They must
/// never be converted into a `MATCH_DISCREPANCY` status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The invoice category mandates a purchase order and none is referenced.
    #[error("a purchase order reference is required for this invoice category")]
    PoRequired,

    /// PO/receipt lookup failed (I/O); recoverable, retry later.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Three-way matcher over pluggable PO/receipt sources.
#[derive(Debug)]
pub struct ThreeWayMatcher<P, R> {
    po_source: P,
    receipt_source: R,
    policy: TolerancePolicy,
}

impl<P, R> ThreeWayMatcher<P, R> {
    pub fn new(po_source: P, receipt_source: R) -> Self {
        Self {
            po_source,
            receipt_source,
            policy: TolerancePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TolerancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TolerancePolicy {
        self.policy
    }
}

impl<P, R> ThreeWayMatcher<P, R>
where
    P: PurchaseOrderSource,
    R: GoodsReceiptSource,
{
    /// Compute the match verdict for an invoice snapshot.
    ///
    /// Deterministic: the discrepancy list is ordered (reference problems,
    /// then per-role comparisons in role order, then the total check), so
    /// repeated invocations over the same data produce identical results.
    pub fn match_invoice(
        &self,
        invoice: &Invoice,
        now: DateTime<Utc>,
    ) -> Result<MatchResult, MatchError> {
        let mut discrepancies: Vec<String> = Vec::new();
        let mut reference = MatchReference::default();

        let po = self.resolve_po(invoice, &mut discrepancies, &mut reference)?;

        if let Some(po) = &po {
            reference.po_total = Some(po.total);

            // Duplicate PO lines for the same role are aggregated up front:
            // quantities sum, the approved rate comes from the first line.
            let mut po_roles: BTreeMap<&str, (u32, Money)> = BTreeMap::new();
            for line in &po.lines {
                po_roles
                    .entry(line.role.as_str())
                    .and_modify(|(qty, _)| *qty += line.quantity)
                    .or_insert((line.quantity, line.approved_rate));
            }
            reference.po_rates = po_roles
                .iter()
                .map(|(role, (_, rate))| RoleRate {
                    role: (*role).to_string(),
                    approved_rate: *rate,
                })
                .collect();

            let received = self.resolve_receipt(invoice, po, &mut discrepancies)?;
            if let Some(received) = &received {
                reference.received_quantities = received
                    .iter()
                    .map(|(role, qty)| RoleQuantity {
                        role: role.clone(),
                        quantity: *qty,
                    })
                    .collect();
            }

            // Invoice lines aggregate the same way so a role split across
            // several lines is one comparison, not several discrepancies.
            let mut invoiced: BTreeMap<&str, (u32, Money)> = BTreeMap::new();
            for line in &invoice.lines {
                invoiced
                    .entry(line.role.as_str())
                    .and_modify(|(qty, _)| *qty += line.quantity)
                    .or_insert((line.quantity, line.unit_rate));
            }

            for (role, (_, invoiced_rate)) in &invoiced {
                match po_roles.get(role) {
                    None => discrepancies
                        .push(format!("No purchase order line for role '{role}'")),
                    Some((_, approved)) => {
                        if !self.policy.within(*invoiced_rate, *approved) {
                            discrepancies.push(format!(
                                "Rate mismatch for line '{role}': invoiced {invoiced_rate}, approved {approved}"
                            ));
                        }
                    }
                }
            }

            // Quantities reconcile against the receipt when one exists and
            // fall back to the ordered quantities otherwise.
            match &received {
                Some(received) => {
                    for (role, (invoiced_qty, _)) in &invoiced {
                        let received_qty = received.get(*role).copied().unwrap_or(0);
                        if *invoiced_qty != received_qty {
                            discrepancies.push(format!(
                                "Quantity mismatch for line '{role}': invoiced {invoiced_qty}, received {received_qty}"
                            ));
                        }
                    }
                }
                None => {
                    for (role, (invoiced_qty, _)) in &invoiced {
                        if let Some((ordered_qty, _)) = po_roles.get(role) {
                            if invoiced_qty != ordered_qty {
                                discrepancies.push(format!(
                                    "Quantity mismatch for line '{role}': invoiced {invoiced_qty}, ordered {ordered_qty}"
                                ));
                            }
                        }
                    }
                }
            }

            if !self.policy.within(invoice.amount, po.total) {
                discrepancies.push(format!(
                    "Invoice total {} does not match purchase order total {}",
                    invoice.amount, po.total
                ));
            }
        }

        let is_matched = discrepancies.is_empty();
        tracing::debug!(
            invoice_id = %invoice.id,
            is_matched,
            discrepancy_count = discrepancies.len(),
            "three-way match completed"
        );

        Ok(MatchResult {
            is_matched,
            discrepancies,
            matched_at: now,
            reference,
        })
    }

    fn resolve_po(
        &self,
        invoice: &Invoice,
        discrepancies: &mut Vec<String>,
        reference: &mut MatchReference,
    ) -> Result<Option<PurchaseOrder>, MatchError> {
        let Some(number) = &invoice.po_number else {
            if invoice.category.mandates_po() {
                return Err(MatchError::PoRequired);
            }
            discrepancies.push("No purchase order reference provided".to_string());
            return Ok(None);
        };

        reference.po_number = Some(number.clone());
        match self.po_source.find_by_number(number)? {
            Some(po) => Ok(Some(po)),
            None => {
                discrepancies.push(format!("Purchase order '{number}' not found"));
                Ok(None)
            }
        }
    }

    fn resolve_receipt(
        &self,
        invoice: &Invoice,
        po: &PurchaseOrder,
        discrepancies: &mut Vec<String>,
    ) -> Result<Option<BTreeMap<String, u32>>, MatchError> {
        if !invoice.category.requires_receipt() {
            return Ok(None);
        }

        match self.receipt_source.find_by_po_number(&po.number)? {
            Some(receipt) => {
                let mut by_role: BTreeMap<String, u32> = BTreeMap::new();
                for line in receipt.lines {
                    *by_role.entry(line.role).or_insert(0) += line.received_quantity;
                }
                Ok(Some(by_role))
            }
            None => {
                discrepancies.push(format!(
                    "No goods receipt recorded for purchase order '{}'",
                    po.number
                ));
                Ok(None)
            }
        }
    }
}
