use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// Snapshot of the authenticated caller used for every authorization
/// decision. Produced by the session layer; the engine only ever borrows it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub is_active: bool,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
