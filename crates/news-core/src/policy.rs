//! Authorization: one predicate decides every protected action.

use std::collections::BTreeSet;

use crate::domain::{Author, Comment, Permission, Post, Role, User};
use crate::error::DomainError;

/// The logged-in user with everything authorization needs.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub roles: Vec<Role>,
    pub permissions: BTreeSet<Permission>,
    pub author: Option<Author>,
}

impl Actor {
    /// Combine role permissions with explicit grants.
    pub fn new(
        user: User,
        roles: Vec<Role>,
        grants: impl IntoIterator<Item = Permission>,
        author: Option<Author>,
    ) -> Self {
        let permissions = roles
            .iter()
            .flat_map(|r| r.permissions().iter().copied())
            .chain(grants)
            .collect();
        Self {
            user,
            roles,
            permissions,
            author,
        }
    }

    pub fn id(&self) -> i32 {
        self.user.id
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn owns(&self, post: &Post) -> bool {
        self.author.is_some_and(|a| a.id == post.author_id)
    }
}

/// Protected operations.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreatePost,
    EditPost(&'a Post),
    DeletePost(&'a Post),
    CreateCategory,
    Subscribe,
    Comment,
    DeleteComment(&'a Comment),
    BecomeAuthor,
}

/// Decide whether `actor` may perform `action`.
///
/// Anonymous visitors get [`DomainError::Unauthenticated`], except for
/// category creation which is refused outright.
pub fn authorize(actor: Option<&Actor>, action: Action<'_>) -> Result<(), DomainError> {
    let Some(actor) = actor else {
        return match action {
            Action::CreateCategory => Err(forbidden_permission(Permission::AddCategory)),
            _ => Err(DomainError::Unauthenticated),
        };
    };

    match action {
        Action::CreatePost => require(actor, Permission::AddPost),
        Action::EditPost(post) => {
            require_owner(actor, post)?;
            require(actor, Permission::ChangePost)
        }
        Action::DeletePost(post) => {
            require_owner(actor, post)?;
            require(actor, Permission::DeletePost)
        }
        Action::CreateCategory => require(actor, Permission::AddCategory),
        Action::Subscribe | Action::Comment | Action::BecomeAuthor => Ok(()),
        Action::DeleteComment(comment) => {
            if comment.user_id == actor.id() {
                Ok(())
            } else {
                Err(DomainError::Forbidden(
                    "Only comment authors may delete their comments".to_string(),
                ))
            }
        }
    }
}

fn require(actor: &Actor, permission: Permission) -> Result<(), DomainError> {
    if actor.has_perm(permission) {
        Ok(())
    } else {
        Err(forbidden_permission(permission))
    }
}

fn forbidden_permission(permission: Permission) -> DomainError {
    DomainError::Forbidden(format!(
        "You do not have the '{}' permission.",
        permission
    ))
}

/// Non-owners are refused whatever their permissions. The post's content is
/// echoed so nothing typed into the form is lost.
fn require_owner(actor: &Actor, post: &Post) -> Result<(), DomainError> {
    if actor.owns(post) {
        return Ok(());
    }
    tracing::warn!(
        user_id = actor.id(),
        post_id = post.id,
        "Post modification refused: not the author"
    );
    Err(DomainError::Forbidden(format!(
        "Only the author of a post may modify it.\n\
         \n\
         Title: {}\n\
         Text:\n\
         {}",
        post.title, post.text
    )))
}
