use apflow_auth::Actor;
use apflow_invoicing::RequestProvenance;

/// Authenticated actor for a request.
///
/// Inserted by the auth middleware; must be present on all domain routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}

/// Request provenance (client ip + user agent) captured at ingress, before
/// any handler work runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceContext {
    provenance: RequestProvenance,
}

impl ProvenanceContext {
    pub fn new(provenance: RequestProvenance) -> Self {
        Self { provenance }
    }

    pub fn provenance(&self) -> &RequestProvenance {
        &self.provenance
    }
}
