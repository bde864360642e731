use async_trait::async_trait;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use news_core::domain::{Category, User};
use news_core::error::RepoError;
use news_core::ports::CategoryRepository;

use super::query_err;
use crate::database::entity::{category, category_subscriber, post_category, user};

/// PostgreSQL category repository, subscriptions included.
pub struct PostgresCategoryRepository {
    db: DbConn,
}

impl PostgresCategoryRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, name: &str) -> Result<Category, RepoError> {
        let model = category::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
        }
        .insert(&self.db)
        .await
        .map_err(query_err)?;

        Ok(model.into())
    }

    async fn for_post(&self, post_id: i32) -> Result<Vec<Category>, RepoError> {
        let tagged = Query::select()
            .column(post_category::Column::CategoryId)
            .from(post_category::Entity)
            .and_where(post_category::Column::PostId.eq(post_id))
            .to_owned();

        let rows = category::Entity::find()
            .filter(category::Column::Id.in_subquery(tagged))
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError> {
        let subscription = category_subscriber::ActiveModel {
            category_id: Set(category_id),
            user_id: Set(user_id),
        };
        category_subscriber::Entity::insert(subscription)
            .on_conflict(
                OnConflict::columns([
                    category_subscriber::Column::CategoryId,
                    category_subscriber::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn remove_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError> {
        category_subscriber::Entity::delete_many()
            .filter(category_subscriber::Column::CategoryId.eq(category_id))
            .filter(category_subscriber::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn subscribers(&self, category_id: i32) -> Result<Vec<User>, RepoError> {
        let subscribed = Query::select()
            .column(category_subscriber::Column::UserId)
            .from(category_subscriber::Entity)
            .and_where(category_subscriber::Column::CategoryId.eq(category_id))
            .to_owned();

        let rows = user::Entity::find()
            .filter(user::Column::Id.in_subquery(subscribed))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn subscribed_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        let rows = category_subscriber::Entity::find()
            .filter(category_subscriber::Column::UserId.eq(user_id))
            .order_by_asc(category_subscriber::Column::CategoryId)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|r| r.category_id).collect())
    }
}
