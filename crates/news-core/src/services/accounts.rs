use std::sync::Arc;

use crate::domain::{NewUser, Permission, Role, RoleRegistry, User};
use crate::error::{DomainError, RepoError};
use crate::forms::{FormErrors, LoginForm, NON_FIELD, SignupForm};
use crate::policy::{self, Action, Actor};
use crate::ports::{AuthorRepository, PasswordService, UserRepository};

/// Accounts, roles and the author upgrade.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    authors: Arc<dyn AuthorRepository>,
    passwords: Arc<dyn PasswordService>,
    roles: RoleRegistry,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        authors: Arc<dyn AuthorRepository>,
        passwords: Arc<dyn PasswordService>,
        roles: RoleRegistry,
    ) -> Self {
        Self {
            users,
            authors,
            passwords,
            roles,
        }
    }

    /// Load the actor for a session. `None` if the user no longer exists.
    pub async fn actor(&self, user_id: i32) -> Result<Option<Actor>, DomainError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let roles = self
            .users
            .group_ids(user_id)
            .await?
            .into_iter()
            .filter_map(|g| self.roles.role_of(g))
            .collect();
        let grants = self.users.grants(user_id).await?;
        let author = self.authors.find_by_user(user_id).await?;
        Ok(Some(Actor::new(user, roles, grants, author)))
    }

    /// Create an account. Every user joins "common"; opting in to authorship
    /// also joins "authors" and creates the author record.
    pub async fn signup(&self, form: SignupForm) -> Result<User, DomainError> {
        if self.users.find_by_username(&form.username).await?.is_some() {
            return Err(taken_username());
        }

        let password_hash = self
            .passwords
            .hash(&form.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                username: form.username,
                email: form.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepoError::Constraint(_) => taken_username(),
                other => other.into(),
            })?;

        self.join(user.id, Role::Common).await?;
        if form.become_author {
            self.join(user.id, Role::Authors).await?;
            self.authors.create(user.id).await?;
        }

        tracing::info!(
            user_id = user.id,
            author = form.become_author,
            "User signed up"
        );
        Ok(user)
    }

    /// Check a username/password pair.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<User, DomainError> {
        let user = self.users.find_by_username(&form.username).await?;
        let valid = match &user {
            Some(user) => self
                .passwords
                .verify(&form.password, &user.password_hash)
                .map_err(|e| DomainError::Internal(e.to_string()))?,
            None => false,
        };
        match user {
            Some(user) if valid => Ok(user),
            _ => {
                tracing::debug!("Login rejected");
                Err(DomainError::Validation(FormErrors::single(
                    NON_FIELD,
                    "The username and/or password you specified are not correct.",
                )))
            }
        }
    }

    /// Make the actor an author.
    ///
    /// "common" membership and "authors" membership are checked separately.
    /// A member of "authors" without an author record is left as is.
    pub async fn upgrade(&self, actor: Option<&Actor>) -> Result<(), DomainError> {
        policy::authorize(actor, Action::BecomeAuthor)?;
        let Some(actor) = actor else {
            return Err(DomainError::Unauthenticated);
        };

        if !actor.has_role(Role::Common) {
            self.join(actor.id(), Role::Common).await?;
        }
        if !actor.has_role(Role::Authors) {
            if actor.author.is_none() {
                self.authors.create(actor.id()).await?;
            }
            self.join(actor.id(), Role::Authors).await?;
            tracing::info!(user_id = actor.id(), "User upgraded to author");
        }
        Ok(())
    }

    /// Grant a permission outside of any group. Deployments do the same with
    /// a row in `user_permissions` (see the migration crate).
    pub async fn grant(&self, user_id: i32, permission: Permission) -> Result<(), DomainError> {
        self.users.grant(user_id, permission).await?;
        Ok(())
    }

    async fn join(&self, user_id: i32, role: Role) -> Result<(), DomainError> {
        self.users
            .add_to_group(user_id, self.roles.group_id(role))
            .await?;
        Ok(())
    }
}

fn taken_username() -> DomainError {
    DomainError::Validation(FormErrors::single(
        "username",
        "A user with that username already exists.",
    ))
}
