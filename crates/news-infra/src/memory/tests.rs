//! Service behaviour over the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use news_core::clock::SiteClock;
use chrono::Utc;

use news_core::domain::{NewPost, Permission, PostChanges, PostType, Role, RoleRegistry};
use news_core::error::{DomainError, RepoError};
use news_core::filter::PostFilter;
use news_core::forms::{LoginForm, PostDraft, SignupForm};
use news_core::notify::{CategoryNotice, Notifier, NotifyError};
use news_core::pagination::PageRequest;
use news_core::policy::Actor;
use news_core::ports::{
    AuthError, AuthorRepository, CategoryRepository, PasswordService, PostRepository,
};
use news_core::services::{AccountService, CategoryService, CommentService, PostService};

use super::InMemoryStore;

struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{}", password))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<CategoryNotice>>,
}

impl RecordingNotifier {
    fn categories(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.category.name.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: CategoryNotice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

struct Harness {
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    accounts: AccountService,
    posts: PostService,
    comments: CommentService,
    categories: CategoryService,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = SiteClock::utc();
    let roles = RoleRegistry::resolve(store.as_ref()).await.unwrap();

    Harness {
        accounts: AccountService::new(
            store.clone(),
            store.clone(),
            Arc::new(PlainPasswords),
            roles,
        ),
        posts: PostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifier.clone(),
            clock,
        ),
        comments: CommentService::new(store.clone(), store.clone(), clock),
        categories: CategoryService::new(store.clone()),
        store,
        notifier,
    }
}

impl Harness {
    async fn member(&self, username: &str, become_author: bool) -> Actor {
        let user = self
            .accounts
            .signup(SignupForm {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: "long enough secret".to_string(),
                become_author,
            })
            .await
            .unwrap();
        self.reload(user.id).await
    }

    async fn reload(&self, user_id: i32) -> Actor {
        self.accounts.actor(user_id).await.unwrap().unwrap()
    }

    async fn category(&self, name: &str) -> i32 {
        CategoryRepository::create(self.store.as_ref(), name)
            .await
            .unwrap()
            .id
    }
}

fn draft(title: &str, categories: &[i32]) -> PostDraft {
    PostDraft {
        post_type: "news".to_string(),
        categories: categories.iter().map(i32::to_string).collect(),
        title: title.to_string(),
        text: format!("Body of {}", title),
    }
}

#[tokio::test]
async fn test_fourth_post_of_the_day_is_refused() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let world = h.category("World").await;

    for title in ["One", "Two", "Three"] {
        h.posts
            .create(Some(&ann), &draft(title, &[world]))
            .await
            .unwrap();
    }

    let err = h
        .posts
        .create(Some(&ann), &draft("Four", &[world]))
        .await
        .unwrap_err();
    match err {
        DomainError::DailyLimitExceeded { title, text } => {
            assert_eq!(title, "Four");
            assert_eq!(text, "Body of Four");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let page = h.posts.list(PageRequest::first(10)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(h.notifier.categories().len(), 3);
}

#[tokio::test]
async fn test_limit_is_per_author() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let ben = h.member("ben", true).await;
    let world = h.category("World").await;

    for title in ["One", "Two", "Three"] {
        h.posts
            .create(Some(&ann), &draft(title, &[world]))
            .await
            .unwrap();
    }

    assert!(
        h.posts
            .create(Some(&ben), &draft("Ben's first", &[world]))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_notifies_only_newly_added_categories() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let reader = h.member("reader", false).await;
    let science = h.category("Science").await;
    let sport = h.category("Sport").await;
    h.categories.subscribe(Some(&reader), science).await.unwrap();
    h.categories.subscribe(Some(&reader), sport).await.unwrap();

    let post = h
        .posts
        .create(Some(&ann), &draft("Comet", &[science]))
        .await
        .unwrap();
    assert_eq!(h.notifier.categories(), vec!["Science"]);

    h.posts
        .update(Some(&ann), post.id, &draft("Comet", &[science, sport]))
        .await
        .unwrap();
    assert_eq!(h.notifier.categories(), vec!["Science", "Sport"]);

    // Removing a category or editing text notifies nobody.
    h.posts
        .update(Some(&ann), post.id, &draft("Comet, updated", &[sport]))
        .await
        .unwrap();
    assert_eq!(h.notifier.categories().len(), 2);

    let notices = h.notifier.notices.lock().unwrap();
    assert_eq!(notices[1].recipients.len(), 1);
    assert_eq!(notices[1].recipients[0].username, "reader");
}

#[tokio::test]
async fn test_invalid_category_choice_is_a_form_error() {
    let h = harness().await;
    let ann = h.member("ann", true).await;

    let err = h
        .posts
        .create(Some(&ann), &draft("Lost", &[999]))
        .await
        .unwrap_err();
    match err {
        DomainError::Validation(errors) => assert_eq!(errors.get("category").len(), 1),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_subscriptions_are_idempotent() {
    let h = harness().await;
    let reader = h.member("reader", false).await;
    let science = h.category("Science").await;

    h.categories.subscribe(Some(&reader), science).await.unwrap();
    h.categories.subscribe(Some(&reader), science).await.unwrap();
    let subscribers = h.store.subscribers(science).await.unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(
        h.categories.subscribed_ids(Some(&reader)).await.unwrap(),
        vec![science]
    );

    h.categories
        .unsubscribe(Some(&reader), science)
        .await
        .unwrap();
    h.categories
        .unsubscribe(Some(&reader), science)
        .await
        .unwrap();
    assert!(h.store.subscribers(science).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscribe_to_unknown_category_is_not_found() {
    let h = harness().await;
    let reader = h.member("reader", false).await;

    assert!(matches!(
        h.categories.subscribe(Some(&reader), 404).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.categories.subscribe(None, 404).await,
        Err(DomainError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_only_the_author_may_modify_a_post() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let ben = h.member("ben", true).await;
    let world = h.category("World").await;
    let post = h
        .posts
        .create(Some(&ann), &draft("Ann's", &[world]))
        .await
        .unwrap();

    assert!(matches!(
        h.posts
            .update(Some(&ben), post.id, &draft("Hijacked", &[world]))
            .await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.posts.delete(Some(&ben), post.id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.posts.edit_draft(Some(&ben), post.id).await,
        Err(DomainError::Forbidden(_))
    ));

    let unchanged = h.posts.get(post.id).await.unwrap();
    assert_eq!(unchanged.title, "Ann's");
}

#[tokio::test]
async fn test_common_user_may_not_post() {
    let h = harness().await;
    let reader = h.member("reader", false).await;
    let world = h.category("World").await;

    assert!(matches!(
        h.posts.create(Some(&reader), &draft("Nope", &[world])).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.posts.create(None, &draft("Nope", &[world])).await,
        Err(DomainError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_deleting_a_post_removes_its_comments() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let world = h.category("World").await;
    let post = h
        .posts
        .create(Some(&ann), &draft("Short-lived", &[world]))
        .await
        .unwrap();
    let comment = h
        .comments
        .add(Some(&ann), post.id, &[("text".into(), "First!".into())])
        .await
        .unwrap();

    h.posts.delete(Some(&ann), post.id).await.unwrap();

    assert!(matches!(
        h.posts.get(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.comments.delete(Some(&ann), comment.comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_comments_belong_to_their_writer() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let ben = h.member("ben", false).await;
    let world = h.category("World").await;
    let post = h
        .posts
        .create(Some(&ann), &draft("Discuss", &[world]))
        .await
        .unwrap();

    let created = h
        .comments
        .add(Some(&ben), post.id, &[("text".into(), "Nice".into())])
        .await
        .unwrap();
    assert_eq!(created.username, "ben");

    assert!(matches!(
        h.comments.delete(Some(&ann), created.comment.id).await,
        Err(DomainError::Forbidden(_))
    ));
    h.comments
        .delete(Some(&ben), created.comment.id)
        .await
        .unwrap();

    let detail = h.posts.detail(post.id).await.unwrap();
    assert!(detail.comments.is_empty());
}

#[tokio::test]
async fn test_empty_comment_and_missing_post() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let world = h.category("World").await;
    let post = h
        .posts
        .create(Some(&ann), &draft("Discuss", &[world]))
        .await
        .unwrap();

    assert!(matches!(
        h.comments
            .add(Some(&ann), post.id, &[("text".into(), "   ".into())])
            .await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        h.comments
            .add(Some(&ann), 999, &[("text".into(), "Hello".into())])
            .await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_signup_assigns_groups() {
    let h = harness().await;

    let reader = h.member("reader", false).await;
    assert_eq!(reader.roles, vec![Role::Common]);
    assert!(reader.author.is_none());

    let writer = h.member("writer", true).await;
    assert!(writer.has_role(Role::Common));
    assert!(writer.has_role(Role::Authors));
    assert!(writer.author.is_some());
    assert!(writer.has_perm(Permission::AddPost));
    assert!(!writer.has_perm(Permission::AddCategory));
}

#[tokio::test]
async fn test_signup_rejects_taken_username() {
    let h = harness().await;
    h.member("ann", false).await;

    let err = h
        .accounts
        .signup(SignupForm {
            username: "ann".to_string(),
            email: "other@example.com".to_string(),
            password: "long enough secret".to_string(),
            become_author: false,
        })
        .await
        .unwrap_err();
    match err {
        DomainError::Validation(errors) => assert!(!errors.get("username").is_empty()),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_authenticate() {
    let h = harness().await;
    h.member("ann", false).await;

    let ok = LoginForm {
        username: "ann".to_string(),
        password: "long enough secret".to_string(),
    };
    assert_eq!(h.accounts.authenticate(&ok).await.unwrap().username, "ann");

    let wrong = LoginForm {
        password: "guess".to_string(),
        ..ok
    };
    assert!(matches!(
        h.accounts.authenticate(&wrong).await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn test_upgrade_is_idempotent() {
    let h = harness().await;
    let reader = h.member("reader", false).await;

    h.accounts.upgrade(Some(&reader)).await.unwrap();
    let upgraded = h.reload(reader.id()).await;
    assert!(upgraded.has_role(Role::Authors));
    let author = upgraded.author.unwrap();

    h.accounts.upgrade(Some(&upgraded)).await.unwrap();
    let again = h.reload(reader.id()).await;
    assert_eq!(again.author, Some(author));
    assert_eq!(again.roles.len(), 2);
    assert_eq!(
        h.store.find_by_user(reader.id()).await.unwrap(),
        Some(author)
    );

    assert!(matches!(
        h.accounts.upgrade(None).await,
        Err(DomainError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_category_creation_needs_an_explicit_grant() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let name = [("name".to_string(), "Culture".to_string())];

    assert!(matches!(
        h.categories.create(Some(&ann), &name).await,
        Err(DomainError::Forbidden(_))
    ));

    h.accounts
        .grant(ann.id(), Permission::AddCategory)
        .await
        .unwrap();
    let ann = h.reload(ann.id()).await;
    let created = h.categories.create(Some(&ann), &name).await.unwrap();
    assert_eq!(created.name, "Culture");

    assert!(matches!(
        h.categories.create(Some(&ann), &name).await,
        Err(DomainError::Duplicate(_))
    ));
}

#[tokio::test]
async fn test_search_combines_filters() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let ben = h.member("ben", true).await;
    let science = h.category("Science").await;
    let sport = h.category("Sport").await;

    h.posts
        .create(Some(&ann), &draft("Mars rover lands", &[science]))
        .await
        .unwrap();
    h.posts
        .create(Some(&ben), &draft("Mars bars recalled", &[sport]))
        .await
        .unwrap();
    h.posts
        .create(Some(&ann), &draft("Cup final", &[sport]))
        .await
        .unwrap();

    let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    let clock = SiteClock::utc();

    let filter = PostFilter::from_pairs(&pairs(&[("title", "MARS")]), &clock);
    let page = h.posts.search(&filter, PageRequest::first(4)).await.unwrap();
    assert_eq!(page.total, 2);

    let filter = PostFilter::from_pairs(
        &pairs(&[("title", "mars"), ("author", "An")]),
        &clock,
    );
    let page = h.posts.search(&filter, PageRequest::first(4)).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].author_name, "ann");
    assert_eq!(page.items[0].categories[0].name, "Science");

    let category = sport.to_string();
    let filter = PostFilter::from_pairs(
        &pairs(&[("category", category.as_str()), ("ordering", "title")]),
        &clock,
    );
    let page = h.posts.search(&filter, PageRequest::first(4)).await.unwrap();
    let titles: Vec<&str> = page.items.iter().map(|v| v.post.title.as_str()).collect();
    assert_eq!(titles, vec!["Cup final", "Mars bars recalled"]);
}

#[tokio::test]
async fn test_pages() {
    let h = harness().await;

    let empty = h.posts.list(PageRequest::first(10)).await.unwrap();
    assert_eq!(empty.num_pages, 1);
    assert!(empty.items.is_empty());

    let past_end = PageRequest::parse(Some("2"), 10).unwrap();
    assert!(matches!(
        h.posts.list(past_end).await,
        Err(DomainError::InvalidPage(_))
    ));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let ben = h.member("ben", true).await;
    let world = h.category("World").await;

    h.posts
        .create(Some(&ann), &draft("Older", &[world]))
        .await
        .unwrap();
    h.posts
        .create(Some(&ben), &draft("Newer", &[world]))
        .await
        .unwrap();

    let page = h.posts.list(PageRequest::first(10)).await.unwrap();
    assert_eq!(page.items[0].post.title, "Newer");
    assert_eq!(page.items[1].post.title, "Older");
}

#[tokio::test]
async fn test_edit_is_refused_once_the_daily_limit_is_reached() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let world = h.category("World").await;
    let mut ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let post = h
            .posts
            .create(Some(&ann), &draft(title, &[world]))
            .await
            .unwrap();
        ids.push(post.id);
    }

    let err = h
        .posts
        .update(Some(&ann), ids[0], &draft("Rewritten", &[world]))
        .await
        .unwrap_err();
    match err {
        DomainError::DailyLimitExceeded { title, text } => {
            assert_eq!(title, "Rewritten");
            assert_eq!(text, "Body of Rewritten");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.posts.get(ids[0]).await.unwrap().title, "One");
}

#[tokio::test]
async fn test_create_with_unknown_category_writes_nothing() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let author_id = ann.author.as_ref().unwrap().id;
    let world = h.category("World").await;

    let result = PostRepository::create_within_limit(
        h.store.as_ref(),
        NewPost {
            post_type: PostType::News,
            title: "Orphan".to_string(),
            text: "Body".to_string(),
            author_id,
            publish_time: Utc::now(),
            category_ids: vec![world, 999],
        },
        SiteClock::utc().today(),
        3,
    )
    .await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
    let page = h.posts.list(PageRequest::first(10)).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_update_with_unknown_category_changes_nothing() {
    let h = harness().await;
    let ann = h.member("ann", true).await;
    let world = h.category("World").await;
    let post = h
        .posts
        .create(Some(&ann), &draft("Stable", &[world]))
        .await
        .unwrap();

    let result = PostRepository::update(
        h.store.as_ref(),
        post.id,
        PostChanges {
            post_type: PostType::Article,
            title: "Changed".to_string(),
            text: "Changed".to_string(),
            category_ids: vec![999],
        },
    )
    .await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
    assert_eq!(h.posts.get(post.id).await.unwrap().title, "Stable");
    assert_eq!(
        PostRepository::category_ids(h.store.as_ref(), post.id)
            .await
            .unwrap(),
        vec![world]
    );
}
