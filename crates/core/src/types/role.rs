//! Roles and permissions for back-office access.

use serde::{Deserialize, Serialize};

/// Back-office role, ordered from least to most privileged.
///
/// The ordering is only used to decide who may assign which role; access
/// checks always go through the role's permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular site visitor.
    User,
    /// Can edit content and see analytics.
    Moderator,
    /// Full access to trip management and migration.
    Admin,
    /// Everything an admin can do, plus user management.
    SuperAdmin,
}

impl Role {
    /// All roles in hierarchy order.
    pub const ALL: [Self; 4] = [Self::User, Self::Moderator, Self::Admin, Self::SuperAdmin];

    /// Position of the role in the hierarchy (`User` = 0).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Moderator => 1,
            Self::Admin => 2,
            Self::SuperAdmin => 3,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

/// A single capability that can be granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
    Admin,
    ManageTrips,
    ManageUsers,
    ViewAnalytics,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Read,
        Self::Write,
        Self::Delete,
        Self::Admin,
        Self::ManageTrips,
        Self::ManageUsers,
        Self::ViewAnalytics,
    ];
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Admin => "admin",
            Self::ManageTrips => "manage_trips",
            Self::ManageUsers => "manage_users",
            Self::ViewAnalytics => "view_analytics",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_round_trips() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert_eq!(err, ParseRoleError("owner".to_owned()));
        assert_eq!(err.to_string(), "invalid role: owner");
    }

    #[test]
    fn test_role_hierarchy_order() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert_eq!(Role::SuperAdmin.rank(), 3);
    }

    #[test]
    fn test_role_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
        assert_eq!(
            serde_json::to_string(&Permission::ViewAnalytics).unwrap(),
            "\"view_analytics\""
        );
    }
}
