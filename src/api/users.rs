use super::resource::{Resource, ResourceApi};
use crate::models::{NewUser, User, UserPatch};

/// Admin-scoped `admin/users/` collection.
pub struct Users;

impl Resource for Users {
    type Record = User;
    type Create = NewUser;
    type Patch = UserPatch;
}

pub type UsersApi = ResourceApi<Users>;
