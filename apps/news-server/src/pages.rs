//! HTML pages rendered with askama.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use askama::Template;

use news_core::SiteClock;
use news_core::domain::{Category, PostType};
use news_core::filter::PostOrdering;
use news_core::forms::{FormErrors, PostDraft};
use news_core::pagination::Page;
use news_core::services::{CommentView, PostView};

/// An entry of the site-wide navigation.
pub struct MenuItem {
    pub title: &'static str,
    pub url: &'static str,
}

pub const MENU: &[MenuItem] = &[
    MenuItem {
        title: "Home",
        url: "/",
    },
    MenuItem {
        title: "Search",
        url: "/search/",
    },
    MenuItem {
        title: "Add post",
        url: "/add/",
    },
    MenuItem {
        title: "Add category",
        url: "/#add-category",
    },
    MenuItem {
        title: "About Us",
        url: "#",
    },
    MenuItem {
        title: "Contact Us",
        url: "#",
    },
    MenuItem {
        title: "Login",
        url: "/accounts/login/",
    },
    MenuItem {
        title: "Logout",
        url: "/accounts/logout/",
    },
];

pub trait TemplateExt {
    fn to_response(&self) -> HttpResponse {
        self.to_response_with(StatusCode::OK)
    }

    fn to_response_with(&self, status: StatusCode) -> HttpResponse;
}

impl<T: Template> TemplateExt for T {
    fn to_response_with(&self, status: StatusCode) -> HttpResponse {
        match self.render() {
            Ok(body) => HttpResponse::build(status)
                .content_type(ContentType::html())
                .body(body),
            Err(e) => {
                tracing::error!(error = %e, "Template rendering failed");
                HttpResponse::InternalServerError()
                    .content_type(ContentType::plaintext())
                    .body(format!("Template error: {}", e))
            }
        }
    }
}

/// An option of a select or checkbox group.
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// A post as shown in listings.
pub struct PostCard {
    pub url: String,
    pub edit_url: String,
    pub delete_url: String,
    pub title: String,
    pub preview: String,
    pub kind: &'static str,
    pub author: String,
    pub published: String,
    pub categories: Vec<String>,
    pub own: bool,
}

impl PostCard {
    pub fn new(view: &PostView, clock: &SiteClock, own: bool) -> Self {
        let post = &view.post;
        Self {
            url: post.url(),
            edit_url: format!("{}edit/", post.url()),
            delete_url: format!("{}delete/", post.url()),
            title: post.title.clone(),
            preview: post.preview(50),
            kind: post.post_type.label(),
            author: view.author_name.clone(),
            published: clock.format(post.publish_time),
            categories: view.categories.iter().map(|c| c.name.clone()).collect(),
            own,
        }
    }
}

/// Previous/next links; `query` is prepended to the page parameter.
pub struct Pager {
    pub number: u64,
    pub num_pages: u64,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Pager {
    pub fn new<T>(page: &Page<T>, query: &str) -> Self {
        let link = |n: u64| {
            if query.is_empty() {
                format!("?page={}", n)
            } else {
                format!("?{}&page={}", query, n)
            }
        };
        Self {
            number: page.number,
            num_pages: page.num_pages,
            previous: page.has_previous().then(|| link(page.number - 1)),
            next: page.has_next().then(|| link(page.number + 1)),
        }
    }
}

#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub posts: Vec<PostCard>,
    pub pager: Pager,
    pub can_add_category: bool,
    pub can_upgrade: bool,
}

/// Subscribe/unsubscribe toggle for one category.
pub struct CategoryToggle {
    pub name: String,
    pub subscribed: bool,
    pub subscribe_url: String,
    pub unsubscribe_url: String,
}

impl CategoryToggle {
    pub fn new(category: &Category, subscribed_ids: &[i32]) -> Self {
        Self {
            name: category.name.clone(),
            subscribed: subscribed_ids.contains(&category.id),
            subscribe_url: category.subscribe_url(),
            unsubscribe_url: category.unsubscribe_url(),
        }
    }
}

pub struct CommentItem {
    pub text: String,
    pub username: String,
    pub published: String,
    pub delete_url: String,
    pub own: bool,
}

impl CommentItem {
    pub fn new(view: &CommentView, clock: &SiteClock, viewer: Option<i32>) -> Self {
        Self {
            text: view.comment.text.clone(),
            username: view.username.clone(),
            published: clock.format(view.comment.publish_time),
            delete_url: view.comment.delete_url(),
            own: viewer == Some(view.comment.user_id),
        }
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub post: PostCard,
    pub text: String,
    pub toggles: Vec<CategoryToggle>,
    pub comments: Vec<CommentItem>,
    pub add_comment_url: String,
}

/// Sticky state of the search form.
pub struct SearchForm {
    pub title: String,
    pub author: String,
    pub published_after: String,
    pub categories: Vec<Choice>,
    pub types: Vec<Choice>,
    pub orderings: Vec<Choice>,
}

impl SearchForm {
    pub fn new(pairs: &[(String, String)], categories: &[Category]) -> Self {
        let value = |name: &str| {
            news_core::forms::field(pairs, name)
                .unwrap_or_default()
                .to_string()
        };
        let category = value("category");
        let post_type = value("type");
        let ordering = value("ordering");

        Self {
            title: value("title"),
            author: value("author"),
            published_after: value("published_after"),
            categories: categories
                .iter()
                .map(|c| {
                    let id = c.id.to_string();
                    let selected = id == category;
                    Choice::new(id, c.name.clone(), selected)
                })
                .collect(),
            types: PostType::ALL
                .iter()
                .map(|t| Choice::new(t.as_str(), t.label(), t.as_str() == post_type))
                .collect(),
            orderings: PostOrdering::CHOICES
                .iter()
                .map(|(v, label)| Choice::new(*v, *label, *v == ordering))
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "post_search.html")]
pub struct PostSearchPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub form: SearchForm,
    pub posts: Vec<PostCard>,
    pub total: u64,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub heading: &'static str,
    pub action: String,
    pub types: Vec<Choice>,
    pub categories: Vec<Choice>,
    pub title: String,
    pub text: String,
    pub errors: FormErrors,
}

impl PostFormPage {
    pub fn new(
        username: Option<String>,
        heading: &'static str,
        action: String,
        draft: &PostDraft,
        categories: &[Category],
        errors: FormErrors,
    ) -> Self {
        Self {
            menu: MENU,
            username,
            heading,
            action,
            types: PostType::ALL
                .iter()
                .map(|t| Choice::new(t.as_str(), t.label(), draft.post_type == t.as_str()))
                .collect(),
            categories: categories
                .iter()
                .map(|c| Choice::new(c.id.to_string(), c.name.clone(), draft.has_category(c.id)))
                .collect(),
            title: draft.title.clone(),
            text: draft.text.clone(),
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub login: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub login: String,
    pub email: String,
    pub become_author: bool,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub menu: &'static [MenuItem],
    pub username: Option<String>,
    pub status: u16,
    pub reason: &'static str,
    pub lines: Vec<String>,
}

impl ErrorPage {
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            menu: MENU,
            username: None,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            lines: message.lines().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_core::pagination::PageRequest;

    #[test]
    fn test_pager_keeps_filter_params() {
        let page = Page::new(vec![(); 4], PageRequest::parse(Some("2"), 4).unwrap(), 12);
        let pager = Pager::new(&page, "title=mars");

        assert_eq!(pager.previous.as_deref(), Some("?title=mars&page=1"));
        assert_eq!(pager.next.as_deref(), Some("?title=mars&page=3"));
    }

    #[test]
    fn test_error_page_splits_lines() {
        let page = ErrorPage::new(StatusCode::FORBIDDEN, "first\nsecond");
        assert_eq!(page.lines, vec!["first", "second"]);
        let html = page.render().unwrap();
        assert!(html.contains("403"));
        assert!(html.contains("About Us"));
    }
}
