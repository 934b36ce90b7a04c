mod common;

use anyhow::Result;
use cmms_client::api::{Resource, ResourceApi};
use cmms_client::cache::{QueryCache, QueryKey};
use cmms_client::types::Record;
use cmms_client::ClientError;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// After a delete, fetching the entity fails and the list no longer has it.
async fn deleted_record_is_gone<R: Resource>(
    api: ResourceApi<R>,
    cache: &QueryCache,
    id: &str,
) -> Result<()> {
    let kind = api.kind();
    assert!(api.list().await?.iter().any(|r| r.id() == id));
    api.get(id).await?;

    api.delete(id).await?;

    assert!(!cache.contains(&QueryKey::One(kind, id.to_string())));
    assert!(!cache.contains(&QueryKey::List(kind)));
    assert!(
        matches!(api.get(id).await, Err(ClientError::NotFound(_))),
        "{kind}: {id} still fetchable after delete"
    );
    assert!(api.list().await?.iter().all(|r| r.id() != id));
    Ok(())
}

/// After a create, the next list read contains the new record.
async fn created_record_is_listed<R: Resource>(
    api: ResourceApi<R>,
    cache: &QueryCache,
    payload: Value,
) -> Result<()>
where
    R::Create: DeserializeOwned,
{
    let kind = api.kind();
    let before = api.list().await?.len();

    let payload: R::Create = serde_json::from_value(payload)?;
    let created = api.create(&payload).await?;
    assert!(!cache.contains(&QueryKey::List(kind)));

    let after = api.list().await?;
    assert_eq!(after.len(), before + 1, "{kind}");
    assert!(after.iter().any(|r| r.id() == created.id()));
    Ok(())
}

#[tokio::test]
async fn delete_then_fetch_fails_for_every_resource() -> Result<()> {
    let server = common::spawn().await?;
    let client = server.login_as(common::ADMIN).await?;
    let cache = client.cache();

    deleted_record_is_gone(client.assets(), cache, "A1").await?;
    deleted_record_is_gone(client.work_orders(), cache, "W2").await?;
    deleted_record_is_gone(client.parts(), cache, "P1").await?;
    deleted_record_is_gone(client.users(), cache, "5").await?;
    Ok(())
}

#[tokio::test]
async fn create_then_list_includes_record_for_every_resource() -> Result<()> {
    let server = common::spawn().await?;
    let client = server.login_as(common::ADMIN).await?;
    let cache = client.cache();

    created_record_is_listed(
        client.assets(),
        cache,
        json!({
            "name": "Lathe",
            "location": "Plant 1",
            "status": "operational",
            "asset_type": "machine"
        }),
    )
    .await?;
    created_record_is_listed(
        client.work_orders(),
        cache,
        json!({
            "title": "Oil lathe",
            "asset": "A1",
            "status": "open",
            "priority": "low"
        }),
    )
    .await?;
    created_record_is_listed(
        client.parts(),
        cache,
        json!({"name": "Coolant", "quantity": 12, "unit_cost": "4.20"}),
    )
    .await?;
    Ok(())
}
