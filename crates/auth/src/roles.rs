//! Normalized role model.
//!
//! Persisted role values arrive in mixed case from older data ("Vendor",
//! "admin", "Project_Manager"). `Role::parse` is the single canonicalization
//! point; nothing else in the codebase compares role strings directly.

use serde::{Deserialize, Serialize};

/// The closed set of roles recognized by the workflow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    ProjectManager,
    FinanceUser,
    Vendor,
}

impl Role {
    /// Canonicalize a role string.
    ///
    /// Case-insensitive and tolerant of the separators/aliases observed in
    /// legacy records. Returns `None` for anything unrecognized — callers
    /// must treat that as the most restrictive outcome, never as a default
    /// role.
    pub fn parse(raw: &str) -> Option<Role> {
        let canonical: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match canonical.as_str() {
            "admin" => Some(Role::Admin),
            "projectmanager" | "pm" => Some(Role::ProjectManager),
            "financeuser" | "finance" => Some(Role::FinanceUser),
            "vendor" => Some(Role::Vendor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ProjectManager => "PROJECT_MANAGER",
            Role::FinanceUser => "FINANCE_USER",
            Role::Vendor => "VENDOR",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_legacy_mixed_case() {
        assert_eq!(Role::parse("Vendor"), Some(Role::Vendor));
        assert_eq!(Role::parse("VENDOR"), Some(Role::Vendor));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Project_Manager"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("PROJECT_MANAGER"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("pm"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("Finance_User"), Some(Role::FinanceUser));
        assert_eq!(Role::parse(" finance "), Some(Role::FinanceUser));
    }

    #[test]
    fn parse_rejects_unknown_roles() {
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse("vend0r"), None);
    }

    #[test]
    fn canonical_strings_round_trip() {
        for role in [
            Role::Admin,
            Role::ProjectManager,
            Role::FinanceUser,
            Role::Vendor,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
