use std::sync::Arc;

use crate::domain::Category;
use crate::error::{DomainError, RepoError};
use crate::forms::CategoryForm;
use crate::policy::{self, Action, Actor};
use crate::ports::CategoryRepository;

/// Category creation and subscriptions.
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    pub async fn list(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.categories.list().await?)
    }

    pub async fn create(
        &self,
        actor: Option<&Actor>,
        pairs: &[(String, String)],
    ) -> Result<Category, DomainError> {
        policy::authorize(actor, Action::CreateCategory)?;
        let form = CategoryForm::parse(pairs).map_err(DomainError::Validation)?;
        let category = self
            .categories
            .create(&form.name)
            .await
            .map_err(|e| match e {
                RepoError::Constraint(_) => DomainError::Duplicate(format!(
                    "Category \"{}\" already exists",
                    form.name
                )),
                other => other.into(),
            })?;
        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Add the actor to the category's subscribers. Idempotent.
    pub async fn subscribe(
        &self,
        actor: Option<&Actor>,
        category_id: i32,
    ) -> Result<Category, DomainError> {
        let (actor, category) = self.target(actor, category_id).await?;
        self.categories
            .add_subscriber(category.id, actor.id())
            .await?;
        tracing::debug!(category_id, user_id = actor.id(), "Subscribed");
        Ok(category)
    }

    /// Remove the actor from the category's subscribers. Idempotent.
    pub async fn unsubscribe(
        &self,
        actor: Option<&Actor>,
        category_id: i32,
    ) -> Result<Category, DomainError> {
        let (actor, category) = self.target(actor, category_id).await?;
        self.categories
            .remove_subscriber(category.id, actor.id())
            .await?;
        tracing::debug!(category_id, user_id = actor.id(), "Unsubscribed");
        Ok(category)
    }

    /// Categories the actor subscribes to; none for anonymous visitors.
    pub async fn subscribed_ids(&self, actor: Option<&Actor>) -> Result<Vec<i32>, DomainError> {
        match actor {
            Some(actor) => Ok(self.categories.subscribed_ids(actor.id()).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn target<'a>(
        &self,
        actor: Option<&'a Actor>,
        category_id: i32,
    ) -> Result<(&'a Actor, Category), DomainError> {
        policy::authorize(actor, Action::Subscribe)?;
        let Some(actor) = actor else {
            return Err(DomainError::Unauthenticated);
        };
        let category = self
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", category_id))?;
        Ok((actor, category))
    }
}
