//! Authenticated actor model.

use serde::{Deserialize, Serialize};

use apflow_core::{ProjectId, UserId, VendorId};

use crate::Role;

/// An authenticated actor (ephemeral — derived from validated claims, never
/// persisted by this core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,

    /// Projects this actor is assigned to. Only consulted for
    /// PROJECT_MANAGER scoping; an empty list means "nothing", not "all".
    #[serde(default)]
    pub assigned_projects: Vec<ProjectId>,

    /// Vendor the actor submits on behalf of (VENDOR role only).
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
}

impl Actor {
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            assigned_projects: Vec::new(),
            vendor_id: None,
        }
    }

    pub fn with_projects(mut self, projects: Vec<ProjectId>) -> Self {
        self.assigned_projects = projects;
        self
    }

    pub fn with_vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }
}
