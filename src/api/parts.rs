use super::resource::{Resource, ResourceApi};
use crate::error::ClientError;
use crate::models::{NewPart, Part, PartPatch};

/// `parts/` collection (inventory).
pub struct Parts;

impl Resource for Parts {
    type Record = Part;
    type Create = NewPart;
    type Patch = PartPatch;
}

pub type PartsApi = ResourceApi<Parts>;

impl ResourceApi<Parts> {
    /// Parts whose stock is at or below their reorder point.
    pub async fn below_reorder_point(&self) -> Result<Vec<Part>, ClientError> {
        let parts = self.list().await?;
        Ok(parts.into_iter().filter(Part::needs_reorder).collect())
    }
}
