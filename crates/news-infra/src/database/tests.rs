use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};

use crate::database::entity::{author, post, post_category};
use crate::database::{PostgresPostRepository, PostgresUserRepository};
use news_core::clock::DayWindow;
use news_core::domain::{NewPost, PostType};
use news_core::ports::{PostRepository, UserRepository};

fn post_model(id: i32, title: &str) -> post::Model {
    post::Model {
        id,
        post_type: post::Kind::News,
        title: title.to_owned(),
        text: "Body".to_owned(),
        author_id: 1,
        publish_time: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap().into(),
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::from(n))])
}

fn window() -> DayWindow {
    DayWindow {
        start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
    }
}

fn new_post() -> NewPost {
    NewPost {
        post_type: PostType::News,
        title: "Fourth".to_owned(),
        text: "Body".to_owned(),
        author_id: 1,
        publish_time: Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap(),
        category_ids: vec![4],
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(7, "Test Post")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo.find_by_id(7).await.unwrap().unwrap();
    assert_eq!(post.id, 7);
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.post_type, PostType::News);
}

#[tokio::test]
async fn test_create_within_limit_refuses_at_limit() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![author::Model { id: 1, user_id: 1 }]])
        .append_query_results(vec![vec![count_row(3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let created = repo
        .create_within_limit(new_post(), window(), 3)
        .await
        .unwrap();
    assert!(created.is_none());
}

#[tokio::test]
async fn test_create_within_limit_inserts_below_limit() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![author::Model { id: 1, user_id: 1 }]])
        .append_query_results(vec![vec![count_row(2)]])
        .append_query_results(vec![vec![post_model(12, "Fourth")]])
        .append_query_results(vec![Vec::<post_category::Model>::new()])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let created = repo
        .create_within_limit(new_post(), window(), 3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.id, 12);
}

#[tokio::test]
async fn test_create_within_limit_fails_when_linking_fails() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![author::Model { id: 1, user_id: 1 }]])
        .append_query_results(vec![vec![count_row(0)]])
        .append_query_results(vec![vec![post_model(12, "Fourth")]])
        .append_query_results(vec![Vec::<post_category::Model>::new()])
        .append_exec_errors(vec![DbErr::Custom(
            "violates foreign key constraint".to_owned(),
        )])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.create_within_limit(new_post(), window(), 3).await.is_err());
}

#[tokio::test]
async fn test_missing_user_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<crate::database::entity::user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    assert!(repo.find_by_username("nobody").await.unwrap().is_none());
}
