//! Static role to permission mapping and permission checks.
//!
//! Every function here is pure and total: unknown roles fall back to the
//! `User` set and no check ever fails with an error.
//!
//! | Role        | Permissions                                                  |
//! |-------------|--------------------------------------------------------------|
//! | User        | read                                                         |
//! | Moderator   | read, write, view_analytics                                  |
//! | Admin       | read, write, delete, admin, manage_trips, view_analytics     |
//! | SuperAdmin  | everything Admin has, plus manage_users                      |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Permission, Role};

/// An ordered set of granted permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns `true` if `permission` is granted.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Returns `true` if nothing is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of granted permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if every permission in `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Iterate over granted permissions in order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

const USER_PERMISSIONS: &[Permission] = &[Permission::Read];

const MODERATOR_PERMISSIONS: &[Permission] = &[
    Permission::Read,
    Permission::Write,
    Permission::ViewAnalytics,
];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::Read,
    Permission::Write,
    Permission::Delete,
    Permission::Admin,
    Permission::ManageTrips,
    Permission::ViewAnalytics,
];

const SUPER_ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::Read,
    Permission::Write,
    Permission::Delete,
    Permission::Admin,
    Permission::ManageTrips,
    Permission::ManageUsers,
    Permission::ViewAnalytics,
];

/// Permissions granted to `role`.
#[must_use]
pub fn permissions_for_role(role: Role) -> PermissionSet {
    let granted = match role {
        Role::User => USER_PERMISSIONS,
        Role::Moderator => MODERATOR_PERMISSIONS,
        Role::Admin => ADMIN_PERMISSIONS,
        Role::SuperAdmin => SUPER_ADMIN_PERMISSIONS,
    };
    granted.iter().copied().collect()
}

/// Permissions for a role given by name.
///
/// Unrecognized names get the `User` set.
#[must_use]
pub fn permissions_for_role_name(name: &str) -> PermissionSet {
    let role = name.parse::<Role>().unwrap_or(Role::User);
    permissions_for_role(role)
}

/// Returns `true` if `required` is in `granted`.
#[must_use]
pub fn has_permission(granted: &PermissionSet, required: Permission) -> bool {
    granted.contains(required)
}

/// Returns `true` if at least one of `required` is granted.
///
/// An empty `required` list is never satisfied.
#[must_use]
pub fn has_any(granted: &PermissionSet, required: &[Permission]) -> bool {
    required.iter().any(|p| granted.contains(*p))
}

/// Returns `true` if every one of `required` is granted.
///
/// An empty `required` list is always satisfied.
#[must_use]
pub fn has_all(granted: &PermissionSet, required: &[Permission]) -> bool {
    required.iter().all(|p| granted.contains(*p))
}

/// Returns `true` if a holder of `assigner` may hand out `target`.
///
/// Policy primitive only; nothing in the access gate consults it.
#[must_use]
pub const fn can_assign_role(assigner: Role, target: Role) -> bool {
    assigner.rank() >= target.rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_permissions() {
        for role in Role::ALL {
            assert!(!permissions_for_role(role).is_empty(), "{role} has no permissions");
        }
    }

    #[test]
    fn test_permissions_are_deterministic() {
        for role in Role::ALL {
            assert_eq!(permissions_for_role(role), permissions_for_role(role));
        }
    }

    #[test]
    fn test_hierarchy_is_strictly_increasing() {
        for pair in Role::ALL.windows(2) {
            let [lower, higher] = pair else { continue };
            let lower_set = permissions_for_role(*lower);
            let higher_set = permissions_for_role(*higher);
            assert!(lower_set.is_subset(&higher_set));
            assert!(higher_set.len() > lower_set.len());
        }
    }

    #[test]
    fn test_manage_users_is_super_admin_only() {
        for role in Role::ALL {
            let granted = permissions_for_role(role).contains(Permission::ManageUsers);
            assert_eq!(granted, role == Role::SuperAdmin);
        }
    }

    #[test]
    fn test_unknown_role_name_defaults_to_user() {
        assert_eq!(
            permissions_for_role_name("pilot"),
            permissions_for_role(Role::User)
        );
        assert_eq!(
            permissions_for_role_name("admin"),
            permissions_for_role(Role::Admin)
        );
    }

    #[test]
    fn test_has_permission_matches_membership() {
        let granted = permissions_for_role(Role::Moderator);
        for p in Permission::ALL {
            assert_eq!(has_permission(&granted, p), granted.iter().any(|g| g == p));
        }
    }

    #[test]
    fn test_empty_set_grants_nothing() {
        let empty = PermissionSet::empty();
        for p in Permission::ALL {
            assert!(!has_permission(&empty, p));
        }
    }

    #[test]
    fn test_has_any_and_has_all() {
        let granted = permissions_for_role(Role::Moderator);
        assert!(has_any(&granted, &[Permission::Delete, Permission::Write]));
        assert!(!has_any(&granted, &[Permission::Delete, Permission::ManageUsers]));
        assert!(!has_any(&granted, &[]));

        assert!(has_all(&granted, &[Permission::Read, Permission::Write]));
        assert!(!has_all(&granted, &[Permission::Read, Permission::Delete]));
        assert!(has_all(&granted, &[]));
    }

    #[test]
    fn test_can_assign_role() {
        assert!(can_assign_role(Role::Admin, Role::Moderator));
        assert!(!can_assign_role(Role::Moderator, Role::Admin));
        assert!(can_assign_role(Role::Admin, Role::Admin));
        for role in Role::ALL {
            assert!(can_assign_role(Role::SuperAdmin, role));
            assert!(can_assign_role(role, Role::User));
        }
    }
}
