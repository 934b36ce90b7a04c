use std::collections::HashSet;
use std::fmt;

use crate::types::{Record, ResourceKind};

/// Either one entity or the whole collection of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagId {
    List,
    Id(String),
}

/// Label associating stored query results with what they describe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub resource: ResourceKind,
    pub id: TagId,
}

impl CacheKey {
    pub fn list(resource: ResourceKind) -> Self {
        Self {
            resource,
            id: TagId::List,
        }
    }

    pub fn entity(resource: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: TagId::Id(id.into()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.resource),
            TagId::Id(id) => write!(f, "{}:{}", self.resource, id),
        }
    }
}

/// Identity of a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List(ResourceKind),
    One(ResourceKind, String),
    /// Users with a role that can be assigned work.
    Technicians,
}

impl QueryKey {
    pub fn resource(&self) -> ResourceKind {
        match self {
            QueryKey::List(resource) | QueryKey::One(resource, _) => *resource,
            QueryKey::Technicians => ResourceKind::Users,
        }
    }

    /// Whether a result of this query could carry `tag`, before the result
    /// is known. Collection queries may contain any entity of their resource.
    pub fn may_provide(&self, tag: &CacheKey) -> bool {
        match self {
            QueryKey::List(_) | QueryKey::Technicians => tag.resource == self.resource(),
            QueryKey::One(resource, id) => {
                tag.resource == *resource && tag.id == TagId::Id(id.clone())
            }
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::List(resource) => write!(f, "list({})", resource),
            QueryKey::One(resource, id) => write!(f, "one({}, {})", resource, id),
            QueryKey::Technicians => f.write_str("technicians"),
        }
    }
}

/// Tags provided by a fetch-all result: the collection plus every entity.
pub fn list_tags<R: Record>(resource: ResourceKind, records: &[R]) -> HashSet<CacheKey> {
    let mut tags: HashSet<CacheKey> = records
        .iter()
        .map(|record| CacheKey::entity(resource, record.id()))
        .collect();
    tags.insert(CacheKey::list(resource));
    tags
}

/// Tags provided by a fetch-one result.
pub fn entity_tags(resource: ResourceKind, id: &str) -> HashSet<CacheKey> {
    HashSet::from([CacheKey::entity(resource, id)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_as_type_and_id() {
        assert_eq!(CacheKey::entity(ResourceKind::WorkOrders, "W1").to_string(), "WorkOrders:W1");
        assert_eq!(CacheKey::list(ResourceKind::Parts).to_string(), "Parts:LIST");
    }

    #[test]
    fn single_queries_only_provide_their_own_tag() {
        let query = QueryKey::One(ResourceKind::Assets, "A1".into());
        assert!(query.may_provide(&CacheKey::entity(ResourceKind::Assets, "A1")));
        assert!(!query.may_provide(&CacheKey::entity(ResourceKind::Assets, "A2")));
        assert!(!query.may_provide(&CacheKey::list(ResourceKind::Assets)));
    }

    #[test]
    fn technicians_query_belongs_to_users() {
        assert!(QueryKey::Technicians.may_provide(&CacheKey::list(ResourceKind::Users)));
        assert!(!QueryKey::Technicians.may_provide(&CacheKey::list(ResourceKind::WorkOrders)));
    }
}
