//! Role- and department-scoped authorization engine for the store suite.
//!
//! Every screen of the dashboard funnels its access decisions through this
//! crate: the static resource map gates route entry, the role-permission
//! matrix answers fine-grained capability checks, and the department scope
//! filter narrows queries and result sets to the caller's department.
//! Decision operations are synchronous over already-loaded state; only
//! catalog and matrix mutations touch the backing store.

pub mod actor;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod resources;
pub mod role;
pub mod scope;
pub mod session;
pub mod store;

pub use actor::Actor;
pub use catalog::{Permission, PermissionFilter};
pub use engine::{AccessEngine, Decision, DenyReason};
pub use error::{AuthzError, SessionError};
pub use matrix::{Action, RoleLoadWarning, RolePermission};
pub use resources::ResourceMap;
pub use role::Role;
pub use scope::{
    can_access_department, scope_collection, scope_query, DepartmentScoped, ListQuery, SortOrder,
};
pub use session::{Credentials, SessionContext, SessionStore};
pub use store::{AccessStore, PermissionChanges, PermissionDraft};
