//! `apflow-matching` — the three-way matching engine.
//!
//! Reconciles an invoice snapshot against its purchase order and goods
//! receipt and produces a [`apflow_invoicing::MatchResult`] verdict. Pure
//! with respect to its inputs: the same snapshot and the same referenced
//! PO/receipt data always yield the same verdict.

pub mod matcher;
pub mod tolerance;

pub use matcher::{MatchError, ThreeWayMatcher};
pub use tolerance::TolerancePolicy;
