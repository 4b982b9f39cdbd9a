//! Access policy resolver.
//!
//! `scope_for` is the single source of truth for which records an actor may
//! see. Every list/read path delegates to the predicate it returns; no
//! collaborator re-derives role logic inline. The mapping is total: every
//! (role, resource) pair has a defined outcome, and anything unrecognized
//! resolves to `Deny` — never to unrestricted.

use std::collections::BTreeSet;

use apflow_core::{ProjectId, UserId, VendorId};

use crate::{Actor, Role};

/// Resource families the resolver knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Invoices,
    Projects,
    RateCards,
    Users,
}

/// The filter predicate restricting what an actor may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Unrestricted.
    All,
    /// Restricted to records attached to one of these projects.
    Projects(BTreeSet<ProjectId>),
    /// Restricted to records submitted by exactly this user.
    OwnSubmissions(UserId),
    /// Restricted to records belonging to exactly this vendor.
    Vendor(VendorId),
    /// Nothing is visible.
    Deny,
}

impl AccessScope {
    /// Does this scope admit an invoice with the given ownership fields?
    pub fn allows_invoice(
        &self,
        submitted_by: UserId,
        project_id: Option<ProjectId>,
        vendor_id: VendorId,
    ) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Projects(assigned) => {
                project_id.is_some_and(|p| assigned.contains(&p))
            }
            AccessScope::OwnSubmissions(user) => submitted_by == *user,
            AccessScope::Vendor(v) => vendor_id == *v,
            AccessScope::Deny => false,
        }
    }

    pub fn allows_project(&self, project_id: ProjectId) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Projects(assigned) => assigned.contains(&project_id),
            // Submission- and vendor-keyed scopes have no meaning for projects.
            AccessScope::OwnSubmissions(_) | AccessScope::Vendor(_) | AccessScope::Deny => false,
        }
    }

    pub fn allows_rate_card(&self, vendor_id: VendorId, project_id: Option<ProjectId>) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Projects(assigned) => {
                project_id.is_some_and(|p| assigned.contains(&p))
            }
            AccessScope::Vendor(v) => vendor_id == *v,
            AccessScope::OwnSubmissions(_) | AccessScope::Deny => false,
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, AccessScope::Deny)
            || matches!(self, AccessScope::Projects(p) if p.is_empty())
    }
}

/// Compute the visibility predicate for an actor and a resource family.
pub fn scope_for(actor: &Actor, resource: ResourceKind) -> AccessScope {
    match (actor.role, resource) {
        (Role::Admin, _) => AccessScope::All,

        // Finance has full financial visibility (parity with admin on
        // invoices/projects/rate cards) but no user administration.
        (Role::FinanceUser, ResourceKind::Invoices)
        | (Role::FinanceUser, ResourceKind::Projects)
        | (Role::FinanceUser, ResourceKind::RateCards) => AccessScope::All,
        (Role::FinanceUser, ResourceKind::Users) => AccessScope::Deny,

        (Role::ProjectManager, ResourceKind::Invoices)
        | (Role::ProjectManager, ResourceKind::Projects)
        | (Role::ProjectManager, ResourceKind::RateCards) => {
            AccessScope::Projects(actor.assigned_projects.iter().copied().collect())
        }
        (Role::ProjectManager, ResourceKind::Users) => AccessScope::Deny,

        // A vendor sees exactly its own submissions. This must never widen
        // even when zero rows match.
        (Role::Vendor, ResourceKind::Invoices) => AccessScope::OwnSubmissions(actor.id),
        (Role::Vendor, ResourceKind::RateCards) => match actor.vendor_id {
            Some(v) => AccessScope::Vendor(v),
            None => AccessScope::Deny,
        },
        (Role::Vendor, ResourceKind::Projects) | (Role::Vendor, ResourceKind::Users) => {
            AccessScope::Deny
        }
    }
}

/// May this actor mutate the given invoice?
///
/// Mutation rights are a strict subset of visibility: admin and finance
/// always, a PM within its assigned projects, a vendor only on its own
/// submissions.
pub fn may_update(actor: &Actor, submitted_by: UserId, project_id: Option<ProjectId>) -> bool {
    match actor.role {
        Role::Admin | Role::FinanceUser => true,
        Role::ProjectManager => project_id.is_some_and(|p| actor.assigned_projects.contains(&p)),
        Role::Vendor => submitted_by == actor.id,
    }
}
