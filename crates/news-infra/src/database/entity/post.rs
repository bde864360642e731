//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;

use news_core::domain::PostType;

/// Stored form of [`PostType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Kind {
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "news")]
    News,
}

impl From<Kind> for PostType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Article => PostType::Article,
            Kind::News => PostType::News,
        }
    }
}

impl From<PostType> for Kind {
    fn from(post_type: PostType) -> Self {
        match post_type {
            PostType::Article => Kind::Article,
            PostType::News => Kind::News,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub post_type: Kind,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub author_id: i32,
    pub publish_time: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for news_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_type: model.post_type.into(),
            title: model.title,
            text: model.text,
            author_id: model.author_id,
            publish_time: model.publish_time.into(),
        }
    }
}
