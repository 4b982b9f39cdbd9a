//! Invoice repository with optimistic concurrency.
//!
//! Reads are scope-filtered at the storage seam: a record outside the
//! caller's scope behaves exactly like a record that does not exist, so
//! callers cannot distinguish "hidden" from "absent".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use apflow_auth::{scope_for, Actor, ResourceKind};
use apflow_core::{DomainError, DomainResult, InvoiceId};
use apflow_invoicing::Invoice;

/// A stored value plus the version token used for conditional writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Persistence seam for invoices.
///
/// `save` is conditional: it succeeds only when the caller still holds the
/// version it read, so concurrent read-modify-write cycles cannot silently
/// overwrite each other.
pub trait InvoiceRepository: Send + Sync {
    /// Load one invoice the actor is allowed to see.
    fn get(&self, id: &InvoiceId, actor: &Actor) -> DomainResult<Option<Versioned<Invoice>>>;

    /// All invoices visible to the actor, newest first.
    fn list(&self, actor: &Actor) -> DomainResult<Vec<Invoice>>;

    /// Store a new invoice at version 1. Fails if the id is taken.
    fn insert(&self, invoice: Invoice) -> DomainResult<()>;

    /// Replace an invoice if its stored version still equals
    /// `expected_version`. Returns the new version.
    fn save(&self, invoice: Invoice, expected_version: u64) -> DomainResult<u64>;
}

impl<S> InvoiceRepository for Arc<S>
where
    S: InvoiceRepository + ?Sized,
{
    fn get(&self, id: &InvoiceId, actor: &Actor) -> DomainResult<Option<Versioned<Invoice>>> {
        (**self).get(id, actor)
    }

    fn list(&self, actor: &Actor) -> DomainResult<Vec<Invoice>> {
        (**self).list(actor)
    }

    fn insert(&self, invoice: Invoice) -> DomainResult<()> {
        (**self).insert(invoice)
    }

    fn save(&self, invoice: Invoice, expected_version: u64) -> DomainResult<u64> {
        (**self).save(invoice, expected_version)
    }
}

/// In-memory repository. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    records: RwLock<HashMap<InvoiceId, Versioned<Invoice>>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceRepository for InMemoryInvoiceRepository {
    fn get(&self, id: &InvoiceId, actor: &Actor) -> DomainResult<Option<Versioned<Invoice>>> {
        let scope = scope_for(actor, ResourceKind::Invoices);
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))?;

        Ok(records.get(id).filter(|v| {
            scope.allows_invoice(v.value.submitted_by, v.value.project_id, v.value.vendor.id)
        }).cloned())
    }

    fn list(&self, actor: &Actor) -> DomainResult<Vec<Invoice>> {
        let scope = scope_for(actor, ResourceKind::Invoices);
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))?;

        let mut visible: Vec<Invoice> = records
            .values()
            .filter(|v| {
                scope.allows_invoice(v.value.submitted_by, v.value.project_id, v.value.vendor.id)
            })
            .map(|v| v.value.clone())
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(visible)
    }

    fn insert(&self, invoice: Invoice) -> DomainResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))?;

        if records.contains_key(&invoice.id) {
            return Err(DomainError::conflict(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }
        records.insert(
            invoice.id.clone(),
            Versioned {
                value: invoice,
                version: 1,
            },
        );
        Ok(())
    }

    fn save(&self, invoice: Invoice, expected_version: u64) -> DomainResult<u64> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))?;

        let Some(existing) = records.get_mut(&invoice.id) else {
            return Err(DomainError::NotFound);
        };
        if existing.version != expected_version {
            return Err(DomainError::conflict(format!(
                "invoice {} was modified concurrently (expected version {expected_version}, found {})",
                invoice.id, existing.version
            )));
        }

        existing.value = invoice;
        existing.version += 1;
        Ok(existing.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apflow_auth::Role;
    use apflow_core::{Money, UserId, VendorId};
    use apflow_invoicing::{InvoiceCategory, VendorRef};
    use chrono::Utc;

    fn invoice(id: &str, submitted_by: UserId) -> Invoice {
        Invoice::received(
            InvoiceId::parse(id).unwrap(),
            VendorRef {
                id: VendorId::new(),
                name: "NexBridge Partners".to_string(),
                code: "NEXB".to_string(),
            },
            submitted_by,
            InvoiceCategory::Services,
            Money::from_minor(50_000),
            Utc::now(),
        )
    }

    fn admin() -> Actor {
        Actor::new(UserId::new(), "Root", Role::Admin)
    }

    #[test]
    fn insert_then_get_round_trips_at_version_one() {
        let repo = InMemoryInvoiceRepository::new();
        let inv = invoice("INV-0001", UserId::new());
        repo.insert(inv.clone()).unwrap();

        let loaded = repo.get(&inv.id, &admin()).unwrap().unwrap();
        assert_eq!(loaded.value, inv);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let repo = InMemoryInvoiceRepository::new();
        let inv = invoice("INV-0001", UserId::new());
        repo.insert(inv.clone()).unwrap();
        assert!(matches!(repo.insert(inv), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn stale_save_is_rejected_and_leaves_the_record_untouched() {
        let repo = InMemoryInvoiceRepository::new();
        let inv = invoice("INV-0001", UserId::new());
        repo.insert(inv.clone()).unwrap();

        // A second writer bumps the version first.
        let mut theirs = inv.clone();
        theirs.po_number = Some("PO-9".to_string());
        assert_eq!(repo.save(theirs.clone(), 1).unwrap(), 2);

        let mut ours = inv.clone();
        ours.po_number = Some("PO-1".to_string());
        assert!(matches!(repo.save(ours, 1), Err(DomainError::Conflict(_))));

        let current = repo.get(&inv.id, &admin()).unwrap().unwrap();
        assert_eq!(current.value.po_number.as_deref(), Some("PO-9"));
        assert_eq!(current.version, 2);
    }

    #[test]
    fn out_of_scope_get_reads_as_absent() {
        let repo = InMemoryInvoiceRepository::new();
        let owner = UserId::new();
        let inv = invoice("INV-0001", owner);
        repo.insert(inv.clone()).unwrap();

        let stranger = Actor::new(UserId::new(), "Other Vendor", Role::Vendor);
        assert!(repo.get(&inv.id, &stranger).unwrap().is_none());

        let owner_actor = Actor::new(owner, "NexBridge", Role::Vendor);
        assert!(repo.get(&inv.id, &owner_actor).unwrap().is_some());
    }

    #[test]
    fn list_is_scope_filtered_and_newest_first() {
        let repo = InMemoryInvoiceRepository::new();
        let vendor_user = UserId::new();

        let mut older = invoice("INV-0001", vendor_user);
        older.created_at = Utc::now() - chrono::Duration::days(2);
        let newer = invoice("INV-0002", vendor_user);
        let foreign = invoice("INV-0003", UserId::new());
        repo.insert(older.clone()).unwrap();
        repo.insert(newer.clone()).unwrap();
        repo.insert(foreign).unwrap();

        let vendor = Actor::new(vendor_user, "NexBridge", Role::Vendor);
        let listed = repo.list(&vendor).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);

        assert_eq!(repo.list(&admin()).unwrap().len(), 3);
    }

    #[test]
    fn pm_without_assignments_lists_an_empty_set_not_everything() {
        let repo = InMemoryInvoiceRepository::new();
        let mut inv = invoice("INV-0001", UserId::new());
        inv.project_id = Some(apflow_core::ProjectId::new());
        repo.insert(inv).unwrap();

        let pm = Actor::new(UserId::new(), "Dana", Role::ProjectManager);
        assert!(repo.list(&pm).unwrap().is_empty());
    }
}
