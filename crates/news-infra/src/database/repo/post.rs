use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use news_core::clock::DayWindow;
use news_core::domain::{NewPost, Post, PostChanges};
use news_core::error::RepoError;
use news_core::filter::{PostFilter, PostOrdering};
use news_core::ports::{CategoryDiff, PostRepository};

use super::{contains_pattern, query_err};
use crate::database::entity::{author, post, post_category, user};

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn filtered(filter: &PostFilter) -> Select<post::Entity> {
    let mut select = post::Entity::find();

    if let Some(title) = &filter.title {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((post::Entity, post::Column::Title))))
                .like(contains_pattern(title)),
        );
    }
    if let Some(name) = &filter.author {
        let by_username = Query::select()
            .column((author::Entity, author::Column::Id))
            .from(author::Entity)
            .inner_join(
                user::Entity,
                Expr::col((user::Entity, user::Column::Id))
                    .equals((author::Entity, author::Column::UserId)),
            )
            .and_where(
                Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Username))))
                    .like(contains_pattern(name)),
            )
            .to_owned();
        select = select.filter(post::Column::AuthorId.in_subquery(by_username));
    }
    if let Some(category_id) = filter.category {
        let tagged = Query::select()
            .column(post_category::Column::PostId)
            .from(post_category::Entity)
            .and_where(post_category::Column::CategoryId.eq(category_id))
            .to_owned();
        select = select.filter(post::Column::Id.in_subquery(tagged));
    }
    if let Some(post_type) = filter.post_type {
        select = select.filter(post::Column::PostType.eq(post::Kind::from(post_type)));
    }
    if let Some(since) = filter.published_since {
        select = select.filter(post::Column::PublishTime.gte(since));
    }

    select
}

fn ordered(select: Select<post::Entity>, ordering: PostOrdering) -> Select<post::Entity> {
    match ordering {
        PostOrdering::Newest => select
            .order_by_desc(post::Column::PublishTime)
            .order_by_desc(post::Column::Id),
        PostOrdering::Oldest => select
            .order_by_asc(post::Column::PublishTime)
            .order_by_asc(post::Column::Id),
        PostOrdering::TitleAsc => select
            .order_by_asc(post::Column::Title)
            .order_by_asc(post::Column::Id),
        PostOrdering::TitleDesc => select
            .order_by_desc(post::Column::Title)
            .order_by_desc(post::Column::Id),
    }
}

async fn published_in<C: ConnectionTrait>(
    conn: &C,
    author_id: i32,
    window: DayWindow,
) -> Result<u64, DbErr> {
    post::Entity::find()
        .filter(post::Column::AuthorId.eq(author_id))
        .filter(post::Column::PublishTime.gte(window.start))
        .filter(post::Column::PublishTime.lt(window.end))
        .count(conn)
        .await
}

/// Make `wanted` the post's category set.
async fn link_categories<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
    wanted: &[i32],
) -> Result<CategoryDiff, DbErr> {
    let current: BTreeSet<i32> = post_category::Entity::find()
        .filter(post_category::Column::PostId.eq(post_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.category_id)
        .collect();
    let wanted: BTreeSet<i32> = wanted.iter().copied().collect();

    let diff = CategoryDiff {
        added: wanted.difference(&current).copied().collect(),
        removed: current.difference(&wanted).copied().collect(),
    };

    if !diff.removed.is_empty() {
        post_category::Entity::delete_many()
            .filter(post_category::Column::PostId.eq(post_id))
            .filter(post_category::Column::CategoryId.is_in(diff.removed.clone()))
            .exec(conn)
            .await?;
    }
    if !diff.added.is_empty() {
        let rows = diff.added.iter().map(|&category_id| post_category::ActiveModel {
            post_id: Set(post_id),
            category_id: Set(category_id),
        });
        post_category::Entity::insert_many(rows)
            .exec_without_returning(conn)
            .await?;
    }

    Ok(diff)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        let result = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        filtered(filter).count(&self.db).await.map_err(query_err)
    }

    async fn fetch(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let rows = ordered(filtered(filter), filter.ordering)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_published(&self, author_id: i32, window: DayWindow) -> Result<u64, RepoError> {
        published_in(&self.db, author_id, window)
            .await
            .map_err(query_err)
    }

    async fn create_within_limit(
        &self,
        new_post: NewPost,
        window: DayWindow,
        limit: u64,
    ) -> Result<Option<Post>, RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;

        // Serializes concurrent publishes by the same author.
        author::Entity::find_by_id(new_post.author_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(query_err)?;

        let published = published_in(&txn, new_post.author_id, window)
            .await
            .map_err(query_err)?;
        if published >= limit {
            txn.rollback().await.map_err(query_err)?;
            return Ok(None);
        }

        let model = post::ActiveModel {
            id: NotSet,
            post_type: Set(new_post.post_type.into()),
            title: Set(new_post.title),
            text: Set(new_post.text),
            author_id: Set(new_post.author_id),
            publish_time: Set(new_post.publish_time.into()),
        }
        .insert(&txn)
        .await
        .map_err(query_err)?;

        // An error here drops the transaction, rolling the insert back.
        link_categories(&txn, model.id, &new_post.category_ids)
            .await
            .map_err(query_err)?;

        txn.commit().await.map_err(query_err)?;
        Ok(Some(model.into()))
    }

    async fn update(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<(Post, CategoryDiff), RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;

        let model = post::ActiveModel {
            id: Set(id),
            post_type: Set(changes.post_type.into()),
            title: Set(changes.title),
            text: Set(changes.text),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => query_err(other),
        })?;
        let diff = link_categories(&txn, id, &changes.category_ids)
            .await
            .map_err(query_err)?;

        txn.commit().await.map_err(query_err)?;
        Ok((model.into(), diff))
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let result = post::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn category_ids(&self, post_id: i32) -> Result<Vec<i32>, RepoError> {
        let rows = post_category::Entity::find()
            .filter(post_category::Column::PostId.eq(post_id))
            .order_by_asc(post_category::Column::CategoryId)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|r| r.category_id).collect())
    }
}
