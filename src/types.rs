//! Shared types used across the codebase

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Remote resource families the client works with. Used for endpoint paths,
/// cache tags and policy decisions alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Assets,
    WorkOrders,
    Parts,
    Users,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Assets,
        ResourceKind::WorkOrders,
        ResourceKind::Parts,
        ResourceKind::Users,
    ];

    /// Collection path relative to the versioned API root.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Assets => "assets/",
            ResourceKind::WorkOrders => "work-orders/",
            ResourceKind::Parts => "parts/",
            ResourceKind::Users => "admin/users/",
        }
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.path(), id)
    }

    /// Name used in cache tags, e.g. `WorkOrders:W1`.
    pub fn tag_name(&self) -> &'static str {
        match self {
            ResourceKind::Assets => "Assets",
            ResourceKind::WorkOrders => "WorkOrders",
            ResourceKind::Parts => "Parts",
            ResourceKind::Users => "Users",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Assets => "assets",
            ResourceKind::WorkOrders => "work orders",
            ResourceKind::Parts => "parts",
            ResourceKind::Users => "users",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// A server-side record addressable by id.
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    /// User the record is assigned to, for records that carry one.
    fn assignee(&self) -> Option<&str> {
        None
    }
}

/// Mutations supported by every resource binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}
