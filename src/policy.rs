//! Role-based permissions, consulted uniformly by every view.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::models::{Role, User};
use crate::types::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Allow,
    Deny,
    /// Allowed only on records assigned to the acting user.
    IfAssigned,
}

pub trait Policy: Send + Sync {
    /// Total over every role, resource and action.
    fn permission(&self, role: Role, resource: ResourceKind, action: Action) -> Permission;

    /// Resolve the permission for `user` acting on a record assigned to
    /// `assignee` (or on the collection, when there is no record).
    fn allows(
        &self,
        user: &User,
        resource: ResourceKind,
        action: Action,
        assignee: Option<&str>,
    ) -> bool {
        match self.permission(user.role, resource, action) {
            Permission::Allow => true,
            Permission::Deny => false,
            Permission::IfAssigned => assignee == Some(user.id.as_str()),
        }
    }
}

/// Default role matrix:
/// - every role reads assets, parts and work orders
/// - admin and manager create, edit and delete them
/// - technicians edit work orders assigned to them
/// - only admin manages users; admin and manager may list them
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl Policy for RolePolicy {
    fn permission(&self, role: Role, resource: ResourceKind, action: Action) -> Permission {
        use Action::*;
        use Permission::*;

        let staff = matches!(role, Role::Admin | Role::Manager);
        match (resource, action) {
            (ResourceKind::Users, Read) if staff => Allow,
            (ResourceKind::Users, _) if role == Role::Admin => Allow,
            (ResourceKind::Users, _) => Deny,

            (_, Read) => Allow,
            (_, Create | Edit | Delete) if staff => Allow,
            (ResourceKind::WorkOrders, Edit) if role == Role::Technician => IfAssigned,
            (_, Create | Edit | Delete) => Deny,
        }
    }
}

/// Base policy with individual entries replaced.
#[derive(Clone, Default)]
pub struct PolicyOverrides<P: Policy = RolePolicy> {
    base: P,
    overrides: HashMap<(Role, ResourceKind, Action), Permission>,
}

impl PolicyOverrides<RolePolicy> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: Policy> PolicyOverrides<P> {
    pub fn over(base: P) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
        }
    }

    pub fn set(mut self, role: Role, resource: ResourceKind, action: Action, permission: Permission) -> Self {
        self.overrides.insert((role, resource, action), permission);
        self
    }
}

impl<P: Policy> Policy for PolicyOverrides<P> {
    fn permission(&self, role: Role, resource: ResourceKind, action: Action) -> Permission {
        self.overrides
            .get(&(role, resource, action))
            .copied()
            .unwrap_or_else(|| self.base.permission(role, resource, action))
    }
}
