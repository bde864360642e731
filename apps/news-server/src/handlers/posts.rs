//! Post listing, search and authoring pages.

use actix_web::{HttpRequest, HttpResponse, web};

use news_core::domain::{Permission, Role};
use news_core::error::DomainError;
use news_core::filter::{PostFilter, echo_params};
use news_core::forms::{FormErrors, PostDraft, field};
use news_core::pagination::{Page, PageRequest};
use news_core::policy::{self, Action, Actor};
use news_core::services::PostView;
use news_core::{LIST_PAGE_SIZE, SEARCH_PAGE_SIZE, SiteClock};

use super::{Pairs, redirect, referer_or};
use crate::middleware::auth::CurrentActor;
use crate::middleware::error::AppResult;
use crate::pages::{
    CategoryToggle, CommentItem, MENU, Pager, PostCard, PostDetailPage, PostFormPage,
    PostListPage, PostSearchPage, SearchForm, TemplateExt,
};
use crate::state::AppState;

fn cards(page: &Page<PostView>, actor: Option<&Actor>, clock: &SiteClock) -> Vec<PostCard> {
    page.items
        .iter()
        .map(|view| {
            let own = actor.is_some_and(|a| a.owns(&view.post));
            PostCard::new(view, clock, own)
        })
        .collect()
}

/// GET /
pub async fn list(
    state: web::Data<AppState>,
    actor: CurrentActor,
    query: web::Query<Pairs>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(field(&query.0, "page"), LIST_PAGE_SIZE)?;
    let page = state.posts.list(page).await?;

    let viewer = actor.get();
    Ok(PostListPage {
        menu: MENU,
        username: actor.username(),
        posts: cards(&page, viewer, &state.clock),
        pager: Pager::new(&page, ""),
        can_add_category: viewer.is_some_and(|a| a.has_perm(Permission::AddCategory)),
        can_upgrade: viewer.is_some_and(|a| !a.has_role(Role::Authors)),
    }
    .to_response())
}

/// GET /{id}/
pub async fn detail(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.detail(path.into_inner()).await?;
    let viewer = actor.get();
    let subscribed = state.categories.subscribed_ids(viewer).await?;
    let post = &detail.view.post;

    Ok(PostDetailPage {
        menu: MENU,
        username: actor.username(),
        post: PostCard::new(
            &detail.view,
            &state.clock,
            viewer.is_some_and(|a| a.owns(post)),
        ),
        text: post.text.clone(),
        toggles: detail
            .view
            .categories
            .iter()
            .map(|c| CategoryToggle::new(c, &subscribed))
            .collect(),
        comments: detail
            .comments
            .iter()
            .map(|c| CommentItem::new(c, &state.clock, viewer.map(Actor::id)))
            .collect(),
        add_comment_url: format!("{}add_comment/", post.url()),
    }
    .to_response())
}

/// GET /search/
pub async fn search(
    state: web::Data<AppState>,
    actor: CurrentActor,
    query: web::Query<Pairs>,
) -> AppResult<HttpResponse> {
    let pairs = query.into_inner();
    let filter = PostFilter::from_pairs(&pairs, &state.clock);
    let page = PageRequest::parse(field(&pairs, "page"), SEARCH_PAGE_SIZE)?;
    let page = state.posts.search(&filter, page).await?;
    let categories = state.posts.category_choices().await?;

    Ok(PostSearchPage {
        menu: MENU,
        username: actor.username(),
        form: SearchForm::new(&pairs, &categories),
        posts: cards(&page, actor.get(), &state.clock),
        total: page.total,
        pager: Pager::new(&page, &echo_params(&pairs)),
    }
    .to_response())
}

async fn form_page(
    state: &AppState,
    actor: &CurrentActor,
    heading: &'static str,
    action: String,
    draft: &PostDraft,
    errors: FormErrors,
) -> AppResult<HttpResponse> {
    let categories = state.posts.category_choices().await?;
    Ok(
        PostFormPage::new(actor.username(), heading, action, draft, &categories, errors)
            .to_response(),
    )
}

/// GET /add/
pub async fn add_form(state: web::Data<AppState>, actor: CurrentActor) -> AppResult<HttpResponse> {
    policy::authorize(actor.get(), Action::CreatePost)?;
    form_page(
        &state,
        &actor,
        "Add post",
        "/add/".to_string(),
        &PostDraft::default(),
        FormErrors::new(),
    )
    .await
}

/// POST /add/
pub async fn add(
    state: web::Data<AppState>,
    actor: CurrentActor,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    let draft = PostDraft::from_pairs(&form.0);
    match state.posts.create(actor.get(), &draft).await {
        Ok(_) => Ok(redirect("/")),
        Err(DomainError::Validation(errors)) => {
            form_page(&state, &actor, "Add post", "/add/".to_string(), &draft, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let draft = state.posts.edit_draft(actor.get(), id).await?;
    form_page(
        &state,
        &actor,
        "Edit post",
        format!("/{}/edit/", id),
        &draft,
        FormErrors::new(),
    )
    .await
}

/// POST /{id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let draft = PostDraft::from_pairs(&form.0);
    match state.posts.update(actor.get(), id, &draft).await {
        Ok(post) => Ok(redirect(&post.url())),
        Err(DomainError::Validation(errors)) => {
            form_page(
                &state,
                &actor,
                "Edit post",
                format!("/{}/edit/", id),
                &draft,
                errors,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /{id}/delete/
pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.posts.delete(actor.get(), path.into_inner()).await?;
    Ok(redirect(&referer_or(&req, "/")))
}
