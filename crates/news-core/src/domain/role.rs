use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ports::GroupRepository;

/// Built-in user groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Baseline group every registered user belongs to.
    Common,
    /// Users allowed to publish posts.
    Authors,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Common, Role::Authors];

    /// Name of the backing group row.
    pub fn group_name(self) -> &'static str {
        match self {
            Role::Common => "common",
            Role::Authors => "authors",
        }
    }

    /// Permissions granted by membership.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Common => &[],
            Role::Authors => &[
                Permission::AddPost,
                Permission::ChangePost,
                Permission::DeletePost,
            ],
        }
    }
}

/// Model permissions checked by the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    AddPost,
    ChangePost,
    DeletePost,
    AddCategory,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::AddPost,
        Permission::ChangePost,
        Permission::DeletePost,
        Permission::AddCategory,
    ];

    pub fn codename(self) -> &'static str {
        match self {
            Permission::AddPost => "add_post",
            Permission::ChangePost => "change_post",
            Permission::DeletePost => "delete_post",
            Permission::AddCategory => "add_category",
        }
    }

    pub fn from_codename(codename: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.codename() == codename)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

/// Group ids of the built-in roles, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRegistry {
    common: i32,
    authors: i32,
}

impl RoleRegistry {
    pub fn new(common: i32, authors: i32) -> Self {
        Self { common, authors }
    }

    /// Look up every role's group by name.
    ///
    /// Fails when a group is missing, which means the migrations were not run.
    pub async fn resolve(groups: &dyn GroupRepository) -> Result<Self, DomainError> {
        let mut ids = [0; 2];
        for (slot, role) in ids.iter_mut().zip(Role::ALL) {
            *slot = groups
                .find_by_name(role.group_name())
                .await?
                .ok_or_else(|| {
                    DomainError::Internal(format!(
                        "group '{}' is missing, run the migrations",
                        role.group_name()
                    ))
                })?;
        }
        tracing::info!(common = ids[0], authors = ids[1], "Role groups resolved");
        Ok(Self::new(ids[0], ids[1]))
    }

    pub fn group_id(&self, role: Role) -> i32 {
        match role {
            Role::Common => self.common,
            Role::Authors => self.authors,
        }
    }

    pub fn role_of(&self, group_id: i32) -> Option<Role> {
        Role::ALL.into_iter().find(|r| self.group_id(*r) == group_id)
    }
}
