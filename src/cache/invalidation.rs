use std::collections::HashSet;

use super::key::CacheKey;
use crate::types::{Operation, ResourceKind};

/// A create/update/delete issued against one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub resource: ResourceKind,
    pub operation: Operation,
    /// Target entity; absent for creates.
    pub id: Option<String>,
}

impl Mutation {
    pub fn create(resource: ResourceKind) -> Self {
        Self {
            resource,
            operation: Operation::Create,
            id: None,
        }
    }

    pub fn update(resource: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            resource,
            operation: Operation::Update,
            id: Some(id.into()),
        }
    }

    pub fn delete(resource: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            resource,
            operation: Operation::Delete,
            id: Some(id.into()),
        }
    }
}

/// Tags to discard after `mutation` resolved with `result`.
///
/// - create: the collection only
/// - update: the entity only
/// - delete: the entity and the collection
///
/// A failed mutation invalidates nothing.
pub fn invalidated_keys<T, E>(mutation: &Mutation, result: &Result<T, E>) -> HashSet<CacheKey> {
    if result.is_err() {
        return HashSet::new();
    }

    let resource = mutation.resource;
    let entity = mutation
        .id
        .as_ref()
        .map(|id| CacheKey::entity(resource, id.clone()));

    match mutation.operation {
        Operation::Create => HashSet::from([CacheKey::list(resource)]),
        Operation::Update => entity.into_iter().collect(),
        Operation::Delete => entity
            .into_iter()
            .chain(std::iter::once(CacheKey::list(resource)))
            .collect(),
    }
}
