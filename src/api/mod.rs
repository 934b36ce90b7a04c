//! Remote API bindings, one per resource, sharing a token-aware transport.

pub mod assets;
pub mod auth;
pub mod http;
pub mod parts;
pub mod resource;
pub mod users;
pub mod work_orders;

pub use assets::{Assets, AssetsApi};
pub use auth::{AuthApi, Credentials};
pub use http::{Credential, HttpClient};
pub use parts::{Parts, PartsApi};
pub use resource::{Resource, ResourceApi};
pub use users::{Users, UsersApi};
pub use work_orders::{WorkOrders, WorkOrdersApi};
