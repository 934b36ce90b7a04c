use super::resource::{Resource, ResourceApi};
use crate::models::{Asset, AssetPatch, NewAsset};

/// `assets/` collection.
pub struct Assets;

impl Resource for Assets {
    type Record = Asset;
    type Create = NewAsset;
    type Patch = AssetPatch;
}

pub type AssetsApi = ResourceApi<Assets>;
