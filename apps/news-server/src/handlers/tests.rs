use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};

use news_core::domain::{Category, Permission, PostType};
use news_core::forms::{PostDraft, SignupForm};

use super::{configure_routes, not_found, path_error};
use crate::config::AppConfig;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::error_handlers;
use crate::state::AppState;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(error_handlers())
                .app_data(web::Data::new($state.clone()))
                .app_data(web::PathConfig::default().error_handler(path_error))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

async fn state() -> AppState {
    AppState::in_memory(&AppConfig::for_tests()).await
}

/// Sign a user up directly and return their session cookie.
async fn login(state: &AppState, username: &str, author: bool) -> (i32, Cookie<'static>) {
    let user = state
        .accounts
        .signup(SignupForm {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct horse".to_string(),
            become_author: author,
        })
        .await
        .unwrap();
    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .unwrap();
    (user.id, Cookie::new(SESSION_COOKIE, token))
}

async fn category(state: &AppState, name: &str) -> Category {
    let (id, _) = login(state, &format!("editor-{}", name.to_lowercase()), false).await;
    state
        .accounts
        .grant(id, Permission::AddCategory)
        .await
        .unwrap();
    let editor = state.accounts.actor(id).await.unwrap().unwrap();
    state
        .categories
        .create(Some(&editor), &[("name".to_string(), name.to_string())])
        .await
        .unwrap()
}

async fn publish(state: &AppState, user_id: i32, category: &Category, title: &str) -> i32 {
    let actor = state.accounts.actor(user_id).await.unwrap().unwrap();
    let draft = PostDraft {
        post_type: PostType::News.as_str().to_string(),
        categories: vec![category.id.to_string()],
        title: title.to_string(),
        text: "Body".to_string(),
    };
    state.posts.create(Some(&actor), &draft).await.unwrap().id
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[actix_rt::test]
async fn test_home_page_renders() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Search"));
}

#[actix_rt::test]
async fn test_unknown_resources_are_404() {
    let state = state().await;
    let app = app!(state);

    for uri in ["/nowhere/", "/42/", "/abc/edit/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_anonymous_add_redirects_to_login() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/add/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/accounts/login/?next=%2Fadd%2F");
}

#[actix_rt::test]
async fn test_signup_starts_a_session() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/signup/")
        .set_form([
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password1", "long enough"),
            ("password2", "long enough"),
            ("become_author", "on"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));
}

#[actix_rt::test]
async fn test_signup_errors_rerender_form() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/accounts/signup/")
        .set_form([
            ("username", "dave"),
            ("email", "not-an-email"),
            ("password1", "long enough"),
            ("password2", "different"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Enter a valid email address."));
}

#[actix_rt::test]
async fn test_login_follows_next() {
    let state = state().await;
    let app = app!(state);
    login(&state, "erin", false).await;

    let req = test::TestRequest::post()
        .uri("/accounts/login/")
        .set_form([
            ("username", "erin"),
            ("password", "correct horse"),
            ("next", "/search/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/search/");

    let req = test::TestRequest::post()
        .uri("/accounts/login/")
        .set_form([("username", "erin"), ("password", "wrong")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_author_publishes_post() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (_, cookie) = login(&state, "frank", true).await;

    let category_id = science.id.to_string();
    let req = test::TestRequest::post()
        .uri("/add/")
        .cookie(cookie)
        .set_form([
            ("type", "news"),
            ("category", category_id.as_str()),
            ("title", "Water on Mars"),
            ("text", "Found at last."),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Water on Mars"));
}

#[actix_rt::test]
async fn test_fourth_post_of_the_day_is_forbidden() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (id, cookie) = login(&state, "grace", true).await;
    for n in 1..=3 {
        publish(&state, id, &science, &format!("Post {}", n)).await;
    }

    let category_id = science.id.to_string();
    let req = test::TestRequest::post()
        .uri("/add/")
        .cookie(cookie)
        .set_form([
            ("type", "article"),
            ("category", category_id.as_str()),
            ("title", "Fourth"),
            ("text", "One too many"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Daily post limit exceeded."));
    assert!(body.contains("Fourth"));
}

#[actix_rt::test]
async fn test_edit_is_forbidden_at_the_daily_limit() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (id, cookie) = login(&state, "gwen", true).await;
    let mut post_id = 0;
    for n in 1..=3 {
        post_id = publish(&state, id, &science, &format!("Post {}", n)).await;
    }

    let category_id = science.id.to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/{}/edit/", post_id))
        .cookie(cookie)
        .set_form([
            ("type", "news"),
            ("category", category_id.as_str()),
            ("title", "Corrected"),
            ("text", "Typo fixed"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Daily post limit exceeded."));
    assert!(body.contains("Corrected"));
    assert!(body.contains("Typo fixed"));
    assert_eq!(state.posts.get(post_id).await.unwrap().title, "Post 3");
}

#[actix_rt::test]
async fn test_only_the_author_edits_or_deletes() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (owner, _) = login(&state, "olga", true).await;
    let (_, intruder) = login(&state, "mallory", true).await;
    let post_id = publish(&state, owner, &science, "Owned").await;

    let category_id = science.id.to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/{}/edit/", post_id))
        .cookie(intruder.clone())
        .set_form([
            ("type", "news"),
            ("category", category_id.as_str()),
            ("title", "Taken over"),
            ("text", "Replaced"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Only the author of a post may modify it."));
    assert!(body.contains("Title: Owned"));
    assert!(body.contains("Body"));

    let req = test::TestRequest::post()
        .uri(&format!("/{}/delete/", post_id))
        .cookie(intruder)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert_eq!(state.posts.get(post_id).await.unwrap().title, "Owned");
}

#[actix_rt::test]
async fn test_delete_returns_to_the_referer() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (id, cookie) = login(&state, "rita", true).await;

    let first = publish(&state, id, &science, "First").await;
    let req = test::TestRequest::post()
        .uri(&format!("/{}/delete/", first))
        .cookie(cookie.clone())
        .insert_header((header::REFERER, "http://localhost:8080/?page=2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "http://localhost:8080/?page=2");

    let second = publish(&state, id, &science, "Second").await;
    let own_url = format!("http://localhost:8080/{}/delete/", second);
    let req = test::TestRequest::post()
        .uri(&format!("/{}/delete/", second))
        .cookie(cookie.clone())
        .insert_header((header::REFERER, own_url.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let third = publish(&state, id, &science, "Third").await;
    let req = test::TestRequest::post()
        .uri(&format!("/{}/delete/", third))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_rt::test]
async fn test_upgrade_twice_then_add() {
    let state = state().await;
    let app = app!(state);
    let (_, cookie) = login(&state, "uma", false).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/upgrade/")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");
    }

    let req = test::TestRequest::get()
        .uri("/add/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_common_user_cannot_add_post() {
    let state = state().await;
    let app = app!(state);
    let (_, cookie) = login(&state, "heidi", false).await;

    let req = test::TestRequest::get()
        .uri("/add/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_comment_json() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (id, cookie) = login(&state, "ivan", true).await;
    let post_id = publish(&state, id, &science, "Commented").await;

    let req = test::TestRequest::post()
        .uri(&format!("/{}/add_comment/", post_id))
        .cookie(cookie.clone())
        .set_form([("text", "Great read")])
        .to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["comment_text"], "Great read");
    assert_eq!(json["comment_user"], "ivan");
    let time = json["comment_publish_time"].as_str().unwrap();
    assert_eq!(time.len(), 19, "{}", time);
    for (i, c) in time.char_indices() {
        match i {
            2 | 5 => assert_eq!(c, '.', "{}", time),
            10 => assert_eq!(c, ' ', "{}", time),
            13 | 16 => assert_eq!(c, ':', "{}", time),
            _ => assert!(c.is_ascii_digit(), "{}", time),
        }
    }

    let req = test::TestRequest::post()
        .uri(&format!("/{}/add_comment/", post_id))
        .cookie(cookie)
        .set_form([("text", "  ")])
        .to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["errors"]["text"][0], "This field is required.");
}

#[actix_rt::test]
async fn test_only_the_writer_deletes_a_comment() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (id, writer) = login(&state, "walt", true).await;
    let (_, other) = login(&state, "xena", false).await;
    let post_id = publish(&state, id, &science, "Discussed").await;

    let req = test::TestRequest::post()
        .uri(&format!("/{}/add_comment/", post_id))
        .cookie(writer.clone())
        .set_form([("text", "Mine")])
        .to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let delete_url = json["comment_delete_url"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&delete_url)
        .cookie(other)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&delete_url)
        .cookie(writer)
        .to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json, serde_json::json!({ "deleted": true }));
}

#[actix_rt::test]
async fn test_subscription_toggle() {
    let state = state().await;
    let app = app!(state);
    let science = category(&state, "Science").await;
    let (_, cookie) = login(&state, "judy", false).await;

    let req = test::TestRequest::get()
        .uri(&science.subscribe_url())
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let req = test::TestRequest::post()
        .uri(&science.subscribe_url())
        .cookie(cookie)
        .to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["url"], science.unsubscribe_url());
}

#[actix_rt::test]
async fn test_anonymous_add_category_is_forbidden() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/add_category/")
        .set_form([("name", "Sports")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_invalid_page_is_404() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/?page=abc").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_search_with_blank_params() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/search/?title=&author=&category=&type=&published_after=")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_health_reports_store() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Store").unwrap().to_str().unwrap(), "memory");
    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "ok");
}
