use super::resource::{Resource, ResourceApi};
use crate::cache::key::list_tags;
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::models::{NewWorkOrder, Role, User, WorkOrder, WorkOrderPatch};
use crate::types::ResourceKind;

/// `work-orders/` collection.
pub struct WorkOrders;

impl Resource for WorkOrders {
    type Record = WorkOrder;
    type Create = NewWorkOrder;
    type Patch = WorkOrderPatch;
}

pub type WorkOrdersApi = ResourceApi<WorkOrders>;

/// Roles that can be picked in the "assigned to" field.
pub const ASSIGNABLE_ROLES: [Role; 3] = [Role::Technician, Role::Manager, Role::Admin];

const USER_DIRECTORY: &str = "auth/users/";

impl ResourceApi<WorkOrders> {
    /// Users that work can be assigned to. Read from the general user
    /// directory and filtered client-side. Tagged with every fetched user,
    /// so a role change on any of them refreshes the list.
    pub async fn technicians(&self) -> Result<Vec<User>, ClientError> {
        if let Some(users) = self.cache().get(&QueryKey::Technicians) {
            return Ok(users);
        }

        let ticket = self.cache().begin(QueryKey::Technicians);
        match self.http().get::<Vec<User>>(USER_DIRECTORY).await {
            Ok(users) => {
                let tags = list_tags(ResourceKind::Users, &users);
                let users: Vec<User> = users
                    .into_iter()
                    .filter(|user| ASSIGNABLE_ROLES.contains(&user.role))
                    .collect();
                self.cache().store(ticket, &users, tags);
                Ok(users)
            }
            Err(e) => {
                self.cache().abandon(ticket);
                Err(e)
            }
        }
    }

    /// Work orders assigned to `user_id`.
    pub async fn assigned_to(&self, user_id: &str) -> Result<Vec<WorkOrder>, ClientError> {
        let orders = self.list().await?;
        Ok(orders
            .into_iter()
            .filter(|order| order.assigned_to.as_deref() == Some(user_id))
            .collect())
    }
}
