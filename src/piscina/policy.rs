//! Allow-list authorization policy.
//!
//! Authorization is explicit membership in a static table injected at
//! construction. The role attached to each entry is orthogonal metadata for
//! downstream handlers; it is never itself a grant, and any email not listed
//! falls back to [`Role::User`] and is unauthorized.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Tester,
    User,
}

#[derive(Clone, Debug, Default)]
pub struct AllowList {
    roles: HashMap<String, Role>,
}

impl AllowList {
    #[must_use]
    pub fn new(roles: HashMap<String, Role>) -> Self {
        let roles = roles
            .into_iter()
            .map(|(email, role)| (normalize(&email), role))
            .collect();
        Self { roles }
    }

    /// Authorization is membership, independent of authentication validity.
    #[must_use]
    pub fn is_authorized(&self, email: &str) -> bool {
        self.roles.contains_key(&normalize(email))
    }

    #[must_use]
    pub fn role_of(&self, email: &str) -> Role {
        self.roles
            .get(&normalize(email))
            .copied()
            .unwrap_or(Role::User)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
