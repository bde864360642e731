use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use news_core::domain::{Author, NewUser, Permission, User};
use news_core::error::RepoError;
use news_core::ports::{AuthorRepository, GroupRepository, UserRepository};

use super::query_err;
use crate::database::entity::{author, group, user, user_group, user_permission};

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            joined_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(query_err)?;

        Ok(model.into())
    }

    async fn group_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        let rows = user_group::Entity::find()
            .filter(user_group::Column::UserId.eq(user_id))
            .order_by_asc(user_group::Column::GroupId)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|r| r.group_id).collect())
    }

    async fn add_to_group(&self, user_id: i32, group_id: i32) -> Result<(), RepoError> {
        let membership = user_group::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        };
        user_group::Entity::insert(membership)
            .on_conflict(
                OnConflict::columns([user_group::Column::UserId, user_group::Column::GroupId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn grants(&self, user_id: i32) -> Result<Vec<Permission>, RepoError> {
        let rows = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows
            .iter()
            .filter_map(|r| Permission::from_codename(&r.codename))
            .collect())
    }

    async fn grant(&self, user_id: i32, permission: Permission) -> Result<(), RepoError> {
        let grant = user_permission::ActiveModel {
            user_id: Set(user_id),
            codename: Set(permission.codename().to_string()),
        };
        user_permission::Entity::insert(grant)
            .on_conflict(
                OnConflict::columns([
                    user_permission::Column::UserId,
                    user_permission::Column::Codename,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }
}

/// PostgreSQL group lookup.
pub struct PostgresGroupRepository {
    db: DbConn,
}

impl PostgresGroupRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<i32>, RepoError> {
        let result = group::Entity::find()
            .filter(group::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(|g| g.id))
    }
}

/// PostgreSQL author repository.
pub struct PostgresAuthorRepository {
    db: DbConn,
}

impl PostgresAuthorRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, RepoError> {
        let result = author::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_user(&self, user_id: i32) -> Result<Option<Author>, RepoError> {
        let result = author::Entity::find()
            .filter(author::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, user_id: i32) -> Result<Author, RepoError> {
        let model = author::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
        }
        .insert(&self.db)
        .await
        .map_err(query_err)?;

        Ok(model.into())
    }
}
