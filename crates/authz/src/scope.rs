//! Department scoping: pure functions narrowing queries and collections to
//! the actor's own department. Orthogonal to the role-permission matrix.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Typed query parameters for list endpoints. A department constraint is
/// either present or absent; there is no untyped parameter bag to probe.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListQuery {
    pub department: Option<Uuid>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

/// Domain records the engine can filter by department without owning them.
pub trait DepartmentScoped {
    fn department_id(&self) -> Option<Uuid>;
}

/// Narrow `params` to the actor's department. Admins pass through
/// unchanged. Every other role, manager included, is pinned to its own
/// department: an absent constraint is filled in, a differing one is
/// overwritten. An actor without a department leaves the constraint as
/// requested; the collection filter still hides foreign records.
pub fn scope_query(mut params: ListQuery, actor: &Actor) -> ListQuery {
    if actor.is_admin() {
        return params;
    }
    if let Some(own) = actor.department_id {
        params.department = Some(own);
    }
    params
}

/// Keep records with no department, or with the actor's department.
/// Admins see everything.
pub fn scope_collection<T: DepartmentScoped>(records: Vec<T>, actor: &Actor) -> Vec<T> {
    if actor.is_admin() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| match record.department_id() {
            None => true,
            Some(dept) => Some(dept) == actor.department_id,
        })
        .collect()
}

/// Single-department access check. Manager is checked identically to staff:
/// a manager's authority covers exactly one department in this model.
pub fn can_access_department(department_id: Uuid, actor: &Actor) -> bool {
    actor.is_admin() || actor.department_id == Some(department_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn actor(role: Role, department_id: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
            department_id,
            employee_id: None,
            is_active: true,
        }
    }

    struct Record {
        department_id: Option<Uuid>,
    }

    impl DepartmentScoped for Record {
        fn department_id(&self) -> Option<Uuid> {
            self.department_id
        }
    }

    #[test]
    fn admin_scoping_is_identity() {
        let other = Uuid::new_v4();
        let admin = actor(Role::Admin, None);
        let params = ListQuery {
            department: Some(other),
            status: Some("open".into()),
            search: None,
            sort: Some(SortOrder::Desc),
        };
        assert_eq!(scope_query(params.clone(), &admin), params);

        let records = vec![
            Record {
                department_id: Some(other),
            },
            Record {
                department_id: None,
            },
        ];
        assert_eq!(scope_collection(records, &admin).len(), 2);
        assert!(can_access_department(other, &admin));
    }

    #[test]
    fn staff_requesting_foreign_department_is_overwritten() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let staff = actor(Role::Staff, Some(own));
        let scoped = scope_query(
            ListQuery {
                department: Some(other),
                ..ListQuery::default()
            },
            &staff,
        );
        assert_eq!(scoped.department, Some(own));
    }

    #[test]
    fn manager_has_no_cross_department_query_rights() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let manager = actor(Role::Manager, Some(own));
        let scoped = scope_query(
            ListQuery {
                department: Some(other),
                ..ListQuery::default()
            },
            &manager,
        );
        assert_eq!(scoped.department, Some(own));
        assert!(!can_access_department(other, &manager));
        assert!(can_access_department(own, &manager));
    }

    #[test]
    fn absent_constraint_is_filled_from_actor() {
        let own = Uuid::new_v4();
        let lead = actor(Role::Lead, Some(own));
        let scoped = scope_query(ListQuery::default(), &lead);
        assert_eq!(scoped.department, Some(own));
    }

    #[test]
    fn collection_filter_never_leaks_foreign_departments() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let staff = actor(Role::Staff, Some(own));
        let records = vec![
            Record {
                department_id: Some(own),
            },
            Record {
                department_id: Some(other),
            },
            Record {
                department_id: None,
            },
        ];
        let kept = scope_collection(records, &staff);
        assert_eq!(kept.len(), 2);
        assert!(kept
            .iter()
            .all(|r| r.department_id.is_none() || r.department_id == Some(own)));
    }

    #[test]
    fn departmentless_actor_sees_only_unscoped_records() {
        let other = Uuid::new_v4();
        let staff = actor(Role::Staff, None);
        let records = vec![
            Record {
                department_id: Some(other),
            },
            Record {
                department_id: None,
            },
        ];
        let kept = scope_collection(records, &staff);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].department_id.is_none());
        assert!(!can_access_department(other, &staff));
    }
}
