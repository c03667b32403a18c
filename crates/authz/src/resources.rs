use std::collections::{HashMap, HashSet};

use crate::actor::Actor;
use crate::role::Role;

/// Fixed mapping from named screens/routes to the roles coarsely allowed to
/// enter them. Built once at process start; an unlisted resource is
/// admin-only until explicitly opened.
#[derive(Clone, Debug, Default)]
pub struct ResourceMap {
    entries: HashMap<String, HashSet<Role>>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store dashboard's screens and who may enter them.
    pub fn standard() -> Self {
        use Role::{Admin, Lead, Manager, Staff};
        Self::new()
            .allow("dashboard", &[Admin, Manager, Lead, Staff])
            .allow("tasks", &[Admin, Manager, Lead, Staff])
            .allow("announcements", &[Admin, Manager, Lead, Staff])
            .allow("reminders", &[Admin, Manager, Lead, Staff])
            .allow("temperature", &[Admin, Manager, Lead, Staff])
            .allow("inventory", &[Admin, Manager, Lead])
            .allow("equipment", &[Admin, Manager, Lead])
            .allow("complaints", &[Admin, Manager, Lead])
            .allow("preorders", &[Admin, Manager, Lead])
            .allow("employees", &[Admin, Manager])
            .allow("departments", &[Admin, Manager])
            .allow("training", &[Admin, Manager])
            .allow("users", &[Admin])
            .allow("permissions", &[Admin])
    }

    pub fn allow(mut self, resource: &str, roles: &[Role]) -> Self {
        self.entries
            .entry(resource.to_string())
            .or_default()
            .extend(roles.iter().copied());
        self
    }

    /// Coarse entry gate. Admins always pass; everyone else needs an
    /// explicit listing for the resource.
    pub fn can_enter(&self, resource: &str, actor: &Actor) -> bool {
        if actor.is_admin() {
            return true;
        }
        self.entries
            .get(resource)
            .map(|roles| roles.contains(&actor.role))
            .unwrap_or(false)
    }
}
