//! Application state - shared across all handlers.

use std::sync::Arc;

use news_core::domain::RoleRegistry;
use news_core::error::DomainError;
use news_core::notify::Notifier;
use news_core::ports::{
    AuthorRepository, CategoryRepository, CommentRepository, GroupRepository, PasswordService,
    PostRepository, TokenService, UserRepository,
};
use news_core::services::{AccountService, CategoryService, CommentService, PostService};
use news_core::SiteClock;
use news_infra::{
    Argon2PasswordService, DatabaseConnections, InMemoryStore, JwtTokenService, LogNotifier,
    WebhookNotifier,
};

#[cfg(feature = "postgres")]
use news_infra::database::{
    PostgresAuthorRepository, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::{AppConfig, SiteConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub categories: Arc<CategoryService>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: SiteClock,
    pub cookie_secure: bool,
    pub db: Option<Arc<DatabaseConnections>>,
}

/// One implementation of every repository port.
struct Repositories {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    authors: Arc<dyn AuthorRepository>,
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            authors: store.clone(),
            categories: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(conn: &DatabaseConnections) -> Self {
        let db = &conn.main;
        Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            groups: Arc::new(PostgresGroupRepository::new(db.clone())),
            authors: Arc::new(PostgresAuthorRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        }
    }
}

fn notifier(site: &SiteConfig) -> Arc<dyn Notifier> {
    match &site.notify_webhook_url {
        Some(url) => {
            tracing::info!("Notification webhook configured");
            Arc::new(WebhookNotifier::new(
                url.clone(),
                site.notify_from.clone(),
                site.url.clone(),
            ))
        }
        None => Arc::new(LogNotifier::new(
            site.notify_from.clone(),
            site.url.clone(),
        )),
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Fails when the role groups cannot be resolved.
    pub async fn new(config: &AppConfig) -> Result<Self, DomainError> {
        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = Repositories::postgres(&connections);
                    (Some(Arc::new(connections)), repos)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, Repositories::in_memory())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Repositories::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (db, repos) = {
            tracing::info!("Running without postgres feature - using in-memory store");
            (None, Repositories::in_memory())
        };

        let state = Self::assemble(config, repos, db).await?;
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub async fn in_memory(config: &AppConfig) -> Self {
        Self::assemble(config, Repositories::in_memory(), None)
            .await
            .expect("in-memory store seeds the role groups")
    }

    async fn assemble(
        config: &AppConfig,
        repos: Repositories,
        db: Option<Arc<DatabaseConnections>>,
    ) -> Result<Self, DomainError> {
        let roles = RoleRegistry::resolve(repos.groups.as_ref()).await?;
        let clock = SiteClock::new(config.utc_offset);
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        Ok(Self {
            accounts: Arc::new(AccountService::new(
                repos.users.clone(),
                repos.authors.clone(),
                passwords,
                roles,
            )),
            posts: Arc::new(PostService::new(
                repos.posts.clone(),
                repos.authors.clone(),
                repos.users.clone(),
                repos.categories.clone(),
                repos.comments.clone(),
                notifier(&config.site),
                clock,
            )),
            comments: Arc::new(CommentService::new(
                repos.comments.clone(),
                repos.posts.clone(),
                clock,
            )),
            categories: Arc::new(CategoryService::new(repos.categories.clone())),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            clock,
            cookie_secure: config.cookie_secure,
            db,
        })
    }
}
