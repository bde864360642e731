//! Schema migrations of the news portal.
//!
//! The post permissions come with the "authors" group. `add_category`
//! belongs to no group and is granted per user once the schema is up:
//!
//! ```sql
//! INSERT INTO user_permissions (user_id, codename)
//! SELECT id, 'add_category' FROM users WHERE username = 'editor'
//! ON CONFLICT DO NOTHING;
//! ```

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts;
mod m20240101_000002_create_news;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts::Migration),
            Box::new(m20240101_000002_create_news::Migration),
        ]
    }
}
