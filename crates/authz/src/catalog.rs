use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named permission, grouped by an optional free-form category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Listing filter: category match and/or case-insensitive name substring.
#[derive(Clone, Debug, Default)]
pub struct PermissionFilter {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// In-memory view of the persisted permission table. Name lookups drive
/// `can_perform`; the matrix references permissions by id only.
#[derive(Debug, Default)]
pub struct PermissionCatalog {
    by_id: HashMap<Uuid, Permission>,
}

impl PermissionCatalog {
    pub fn replace(&mut self, permissions: Vec<Permission>) {
        self.by_id = permissions.into_iter().map(|p| (p.id, p)).collect();
    }

    pub fn upsert(&mut self, permission: Permission) {
        self.by_id.insert(permission.id, permission);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Permission> {
        self.by_id.remove(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Permission> {
        self.by_id.get(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<Uuid> {
        self.by_id
            .values()
            .find(|p| p.name == name)
            .map(|p| p.id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_id.values().any(|p| p.name == name)
    }

    /// Permissions matching `filter`, sorted by name for stable rendering.
    pub fn list(&self, filter: &PermissionFilter) -> Vec<Permission> {
        let needle = filter.q.as_deref().map(str::to_lowercase);
        let mut out: Vec<Permission> = self
            .by_id
            .values()
            .filter(|p| match &filter.category {
                Some(category) => p.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .filter(|p| match &needle {
                Some(needle) => p.name.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(name: &str, category: Option<&str>) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category: category.map(Into::into),
        }
    }

    #[test]
    fn lists_sorted_and_filtered() {
        let mut catalog = PermissionCatalog::default();
        catalog.replace(vec![
            perm("task_management", Some("operations")),
            perm("employee_management", Some("people")),
            perm("inventory_management", Some("operations")),
        ]);

        let all = catalog.list(&PermissionFilter::default());
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["employee_management", "inventory_management", "task_management"]
        );

        let ops = catalog.list(&PermissionFilter {
            category: Some("operations".into()),
            q: Some("TASK".into()),
        });
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "task_management");
    }

    #[test]
    fn resolves_names_to_ids() {
        let mut catalog = PermissionCatalog::default();
        let p = perm("task_management", None);
        let id = p.id;
        catalog.upsert(p);
        assert_eq!(catalog.id_of("task_management"), Some(id));
        assert_eq!(catalog.id_of("missing"), None);
        catalog.remove(id);
        assert!(!catalog.contains_name("task_management"));
    }
}
