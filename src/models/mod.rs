pub mod asset;
pub mod part;
pub mod user;
pub mod work_order;

pub use asset::{Asset, AssetPatch, AssetStatus, AssetType, NewAsset};
pub use part::{NewPart, Part, PartPatch};
pub use user::{NewUser, Role, User, UserPatch};
pub use work_order::{NewWorkOrder, WorkOrder, WorkOrderPatch, WorkOrderPriority, WorkOrderStatus};

/// Server-assigned identifiers arrive either as JSON strings (UUIDs) or as
/// integer primary keys. Both are normalized to `String` on the client.
pub(crate) mod id {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn normalize<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("expected string or integer id, got {}", other))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize(value)?.ok_or_else(|| serde::de::Error::custom("missing id"))
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize(value)
    }

    /// Patch field: absent stays `None` through `#[serde(default)]`, an
    /// explicit null or empty string becomes `Some(None)`.
    pub fn deserialize_patch<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<String>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize(value).map(Some)
    }
}
