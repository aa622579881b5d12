//! Derived per-session admin status.

use serde::{Deserialize, Serialize};

use crate::permission::{PermissionSet, permissions_for_role};
use crate::types::{Permission, Role};

/// Resolved admin status for the current session.
///
/// Derived from the `isAdmin` flag of the local mirror. The flag only ever
/// grants the `Admin` role; `Moderator` and `SuperAdmin` exist for the
/// permission model but have no source in the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    /// `false` until the first resolution completes.
    pub is_loaded: bool,
    /// Whether the session is an admin session.
    pub is_admin: bool,
    /// Resolved role, if any.
    pub role: Option<Role>,
    /// Granted permissions.
    pub permissions: PermissionSet,
}

impl AdminStatus {
    /// Status before resolution has completed.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            is_loaded: false,
            is_admin: false,
            role: None,
            permissions: PermissionSet::empty(),
        }
    }

    /// Resolve the status from the raw stored flag.
    ///
    /// Only the exact string `"true"` grants admin; a missing or malformed
    /// flag resolves to a loaded, non-admin status.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        if flag == Some("true") {
            Self::for_role(Role::Admin)
        } else {
            Self {
                is_loaded: true,
                is_admin: false,
                role: None,
                permissions: PermissionSet::empty(),
            }
        }
    }

    /// A loaded status carrying `role` and its permissions.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self {
            is_loaded: true,
            is_admin: role >= Role::Admin,
            role: Some(role),
            permissions: permissions_for_role(role),
        }
    }

    /// Returns `true` if `permission` is granted.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }
}

impl Default for AdminStatus {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_status_grants_nothing() {
        let status = AdminStatus::loading();
        assert!(!status.is_loaded);
        assert!(status.permissions.is_empty());
    }

    #[test]
    fn test_true_flag_resolves_to_admin() {
        let status = AdminStatus::from_flag(Some("true"));
        assert!(status.is_loaded);
        assert!(status.is_admin);
        assert_eq!(status.role, Some(Role::Admin));
        assert!(status.can(Permission::ManageTrips));
        assert!(!status.can(Permission::ManageUsers));
    }

    #[test]
    fn test_other_flags_resolve_to_non_admin() {
        for flag in [None, Some("false"), Some("TRUE"), Some("1"), Some("")] {
            let status = AdminStatus::from_flag(flag);
            assert!(status.is_loaded);
            assert!(!status.is_admin);
            assert_eq!(status.role, None);
            assert!(status.permissions.is_empty());
        }
    }

    #[test]
    fn test_moderator_is_not_admin() {
        let status = AdminStatus::for_role(Role::Moderator);
        assert!(!status.is_admin);
        assert!(status.can(Permission::Write));
    }
}
