use std::marker::PhantomData;

use serde::Serialize;

use super::http::HttpClient;
use crate::cache::key::{entity_tags, list_tags};
use crate::cache::{invalidated_keys, Mutation, QueryCache, QueryKey};
use crate::error::ClientError;
use crate::types::{Record, ResourceKind};

/// Binding between a remote collection and its request/response shapes.
pub trait Resource: Send + Sync + 'static {
    type Record: Record;
    type Create: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    fn kind() -> ResourceKind {
        <Self::Record as Record>::KIND
    }
}

/// CRUD operations for one resource, reading through the shared query cache
/// and invalidating it when mutations commit.
pub struct ResourceApi<R: Resource> {
    http: HttpClient,
    cache: QueryCache,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            cache: self.cache.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    pub fn new(http: HttpClient, cache: QueryCache) -> Self {
        Self {
            http,
            cache,
            _resource: PhantomData,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        R::kind()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Fetch-all, served from the cache when a current entry exists.
    pub async fn list(&self) -> Result<Vec<R::Record>, ClientError> {
        let key = QueryKey::List(R::kind());
        if let Some(records) = self.cache.get(&key) {
            return Ok(records);
        }
        self.refetch_list().await
    }

    /// Fetch-all from the server, bypassing any cached entry.
    pub async fn refetch_list(&self) -> Result<Vec<R::Record>, ClientError> {
        let kind = R::kind();
        let ticket = self.cache.begin(QueryKey::List(kind));
        match self.http.get::<Vec<R::Record>>(kind.path()).await {
            Ok(records) => {
                let tags = list_tags(kind, &records);
                self.cache.store(ticket, &records, tags);
                Ok(records)
            }
            Err(e) => {
                self.cache.abandon(ticket);
                Err(e)
            }
        }
    }

    /// Fetch-one, served from the cache when a current entry exists.
    pub async fn get(&self, id: &str) -> Result<R::Record, ClientError> {
        let key = QueryKey::One(R::kind(), id.to_string());
        if let Some(record) = self.cache.get(&key) {
            return Ok(record);
        }
        self.refetch(id).await
    }

    pub async fn refetch(&self, id: &str) -> Result<R::Record, ClientError> {
        let kind = R::kind();
        let ticket = self.cache.begin(QueryKey::One(kind, id.to_string()));
        match self.http.get::<R::Record>(&kind.item_path(id)).await {
            Ok(record) => {
                self.cache.store(ticket, &record, entity_tags(kind, id));
                Ok(record)
            }
            Err(e) => {
                self.cache.abandon(ticket);
                Err(e)
            }
        }
    }

    pub async fn create(&self, payload: &R::Create) -> Result<R::Record, ClientError> {
        let result = self.http.post(R::kind().path(), payload).await;
        self.commit(Mutation::create(R::kind()), result)
    }

    /// Partial update (PATCH); absent fields are left untouched.
    pub async fn update(&self, id: &str, patch: &R::Patch) -> Result<R::Record, ClientError> {
        let kind = R::kind();
        let result = self.http.patch(&kind.item_path(id), patch).await;
        self.commit(Mutation::update(kind, id), result)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let kind = R::kind();
        let result = self.http.delete(&kind.item_path(id)).await;
        self.commit(Mutation::delete(kind, id), result)
    }

    fn commit<T>(&self, mutation: Mutation, result: Result<T, ClientError>) -> Result<T, ClientError> {
        let keys = invalidated_keys(&mutation, &result);
        match &result {
            Ok(_) => {
                tracing::debug!(
                    resource = %mutation.resource,
                    operation = ?mutation.operation,
                    id = mutation.id.as_deref().unwrap_or("-"),
                    "mutation committed"
                );
                self.cache.invalidate(&keys);
            }
            Err(e) => {
                tracing::debug!(
                    resource = %mutation.resource,
                    operation = ?mutation.operation,
                    "mutation failed, cache untouched: {}",
                    e
                );
            }
        }
        result
    }
}
