//! Resource access policy.
//!
//! Every role decision in the server goes through this module. Row access is
//! one lookup in [`RULES`]: a caller either sees every row of a resource
//! ([`Scope::All`]) or only the rows it owns ([`Scope::Owner`]). Whole-route
//! gates such as analytics or user administration are looked up in
//! [`FEATURES`].

use crm_core::{Role, UserId};
use thiserror::Error;

use crate::models::Identity;

/// A table the API exposes to authenticated callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Customer,
    Task,
    Deal,
    Report,
    Notification,
}

impl Resource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Task => "task",
            Self::Deal => "deal",
            Self::Report => "report",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// Which rows a query may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every row of the resource.
    All,
    /// Only rows whose `user_id` matches.
    Owner(UserId),
}

impl Scope {
    /// The owner filter to apply, if any.
    #[must_use]
    pub const fn owner(self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::Owner(id) => Some(id),
        }
    }
}

/// Route-level capabilities that depend on role alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// The per-caller analytics aggregate.
    AdvancedAnalytics,
    /// Listing users and changing their role.
    ManageUsers,
    /// Registering an account with the admin role.
    CreateAdmin,
}

/// Why a caller was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("{action:?} is not supported for {resource}s")]
    Unsupported { resource: Resource, action: Action },
    #[error("this action requires the {required} role")]
    RoleRequired { required: Role },
}

struct Rule {
    resource: Resource,
    actions: &'static [Action],
    /// Whether the admin role lifts the owner filter.
    admin_wide: bool,
}

const CRUD: &[Action] = &[Action::Read, Action::Create, Action::Update, Action::Delete];

const RULES: &[Rule] = &[
    Rule {
        resource: Resource::Customer,
        actions: CRUD,
        admin_wide: true,
    },
    Rule {
        resource: Resource::Task,
        actions: CRUD,
        admin_wide: true,
    },
    Rule {
        resource: Resource::Deal,
        actions: CRUD,
        admin_wide: true,
    },
    Rule {
        resource: Resource::Report,
        actions: &[Action::Read, Action::Create],
        admin_wide: true,
    },
    Rule {
        resource: Resource::Notification,
        actions: &[Action::Read, Action::Update],
        admin_wide: false,
    },
];

/// Exact role each feature requires. Admin does not imply premium.
const FEATURES: &[(Feature, Role)] = &[
    (Feature::AdvancedAnalytics, Role::Premium),
    (Feature::ManageUsers, Role::Admin),
    (Feature::CreateAdmin, Role::Admin),
];

/// Decide which rows `identity` may touch for `action` on `resource`.
///
/// Creates are always stamped with the caller as owner, admins included.
///
/// # Errors
///
/// Returns `AccessDenied::Unsupported` if the resource does not offer the action.
pub fn scope_for(
    resource: Resource,
    action: Action,
    identity: &Identity,
) -> Result<Scope, AccessDenied> {
    let rule = RULES
        .iter()
        .find(|rule| rule.resource == resource)
        .filter(|rule| rule.actions.contains(&action))
        .ok_or(AccessDenied::Unsupported { resource, action })?;

    if action != Action::Create && rule.admin_wide && identity.role.is_admin() {
        Ok(Scope::All)
    } else {
        Ok(Scope::Owner(identity.user_id))
    }
}

/// Check a role against a feature gate.
///
/// # Errors
///
/// Returns `AccessDenied::RoleRequired` when `role` is not the feature's role.
pub fn require(feature: Feature, role: Role) -> Result<(), AccessDenied> {
    let required = FEATURES
        .iter()
        .find_map(|&(f, r)| (f == feature).then_some(r))
        .unwrap_or(Role::Admin);

    if role == required {
        Ok(())
    } else {
        Err(AccessDenied::RoleRequired { required })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn caller(id: i32, role: Role) -> Identity {
        Identity {
            user_id: UserId::new(id),
            role,
        }
    }

    #[test]
    fn test_owner_scope_for_non_admins() {
        for role in [Role::User, Role::Premium] {
            for resource in [Resource::Customer, Resource::Task, Resource::Deal] {
                for action in [Action::Read, Action::Update, Action::Delete] {
                    assert_eq!(
                        scope_for(resource, action, &caller(4, role)).unwrap(),
                        Scope::Owner(UserId::new(4))
                    );
                }
            }
        }
    }

    #[test]
    fn test_admin_sees_all_rows() {
        let admin = caller(1, Role::Admin);
        assert_eq!(
            scope_for(Resource::Customer, Action::Read, &admin).unwrap(),
            Scope::All
        );
        assert_eq!(
            scope_for(Resource::Deal, Action::Delete, &admin).unwrap(),
            Scope::All
        );
        assert_eq!(
            scope_for(Resource::Report, Action::Read, &admin).unwrap(),
            Scope::All
        );
    }

    #[test]
    fn test_create_always_stamps_caller() {
        let admin = caller(1, Role::Admin);
        assert_eq!(
            scope_for(Resource::Task, Action::Create, &admin).unwrap(),
            Scope::Owner(UserId::new(1))
        );
    }

    #[test]
    fn test_notifications_never_widen() {
        let admin = caller(9, Role::Admin);
        assert_eq!(
            scope_for(Resource::Notification, Action::Read, &admin).unwrap(),
            Scope::Owner(UserId::new(9))
        );
        assert_eq!(
            scope_for(Resource::Notification, Action::Update, &admin)
                .unwrap()
                .owner(),
            Some(UserId::new(9))
        );
    }

    #[test]
    fn test_unsupported_actions_are_denied() {
        let user = caller(2, Role::User);
        assert_eq!(
            scope_for(Resource::Report, Action::Update, &user),
            Err(AccessDenied::Unsupported {
                resource: Resource::Report,
                action: Action::Update
            })
        );
        assert!(scope_for(Resource::Report, Action::Delete, &caller(1, Role::Admin)).is_err());
        assert!(scope_for(Resource::Notification, Action::Delete, &user).is_err());
    }

    #[test]
    fn test_analytics_requires_exactly_premium() {
        assert!(require(Feature::AdvancedAnalytics, Role::Premium).is_ok());
        assert_eq!(
            require(Feature::AdvancedAnalytics, Role::Admin),
            Err(AccessDenied::RoleRequired {
                required: Role::Premium
            })
        );
        assert!(require(Feature::AdvancedAnalytics, Role::User).is_err());
    }

    #[test]
    fn test_user_management_requires_admin() {
        assert!(require(Feature::ManageUsers, Role::Admin).is_ok());
        assert!(require(Feature::CreateAdmin, Role::Admin).is_ok());
        assert!(require(Feature::ManageUsers, Role::Premium).is_err());
        assert!(require(Feature::CreateAdmin, Role::User).is_err());
    }

    #[test]
    fn test_denial_messages() {
        let err = require(Feature::AdvancedAnalytics, Role::User).unwrap_err();
        assert_eq!(err.to_string(), "this action requires the premium role");
        let err = scope_for(Resource::Report, Action::Delete, &caller(1, Role::User)).unwrap_err();
        assert_eq!(err.to_string(), "Delete is not supported for reports");
    }
}
