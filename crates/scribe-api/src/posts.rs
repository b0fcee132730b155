use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    response::Response,
};
use tracing::{debug, info};

use scribe_db::PostFilter;
use scribe_db::models::{GroupRow, PostRow};
use scribe_types::api::{Claims, PageQuery, PostFormData};
use scribe_types::models::Post;

use crate::error::{ApiError, ApiResult};
use crate::forms::{FieldErrors, PostForm};
use crate::pagination::{Paginator, page_context};
use crate::render::{Context, found, render};
use crate::state::AppState;
use crate::views;

const CREATE_TEMPLATE: &str = "posts/create_post.html";

// ── Listings ────────────────────────────────────────────────────────────

/// Resolve the requested page of `filter` and build its pagination context.
async fn listing_context(state: &AppState, filter: PostFilter, raw_page: Option<String>) -> ApiResult<Context> {
    let per_page = state.config.posts_per_page;
    let requested = raw_page.clone();

    let (paginator, number, rows) = state
        .with_store(move |store| {
            let paginator = Paginator::new(store.count_posts(filter)?, per_page);
            let number = paginator.resolve(requested.as_deref());
            let rows = store.list_posts(filter, paginator.per_page, paginator.offset(number))?;
            Ok((paginator, number, rows))
        })
        .await?;

    let posts: Vec<Post> = rows.into_iter().map(views::post).collect();
    page_context(&paginator.page(number, posts), raw_page.as_deref())
}

/// GET /: every post, newest first.
pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Response> {
    let context = listing_context(&state, PostFilter::All, query.page).await?;
    Ok(render("posts/index.html", context))
}

/// GET /group/{slug}/: the requested page plus the group's full post list.
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let (group, all_posts) = state
        .with_store(move |store| {
            let Some(group) = store.get_group_by_slug(&slug)? else {
                return Ok(None);
            };
            let filter = PostFilter::Group(group.id);
            let rows = store.list_posts(filter, store.count_posts(filter)?, 0)?;
            Ok(Some((group, rows)))
        })
        .await?
        .ok_or(ApiError::NotFound)?;

    let all_posts: Vec<Post> = all_posts.into_iter().map(views::post).collect();

    let mut context = Context::new();
    context.extend(listing_context(&state, PostFilter::Group(group.id), query.page).await?);
    context.insert("group", &views::group(group))?;
    context.insert("posts", &all_posts)?;
    Ok(render("posts/group_list.html", context))
}

/// GET /profile/{username}/
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let (author, post_count) = state
        .with_store(move |store| {
            let Some(author) = store.get_user_by_username(&username)? else {
                return Ok(None);
            };
            let count = store.count_posts(PostFilter::Author(author.id))?;
            Ok(Some((author, count)))
        })
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut context = Context::new();
    context.extend(listing_context(&state, PostFilter::Author(author.id), query.page).await?);
    context.insert("author", &views::user(&author))?;
    context.insert("post_count", &post_count)?;
    Ok(render("posts/profile.html", context))
}

/// GET /posts/{post_id}/: a single post and its author's post count.
pub async fn post_detail(State(state): State<AppState>, Path(post_id): Path<String>) -> ApiResult<Response> {
    let post_id = parse_post_id(&post_id)?;

    let (post, post_count) = state
        .with_store(move |store| {
            let Some(post) = store.get_post(post_id)? else {
                return Ok(None);
            };
            let count = store.count_posts(PostFilter::Author(post.author_id))?;
            Ok(Some((post, count)))
        })
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut context = Context::new();
    context.insert("post", &views::post(post))?;
    context.insert("post_count", &post_count)?;
    Ok(render("posts/post_detail.html", context))
}

// ── Create / edit ───────────────────────────────────────────────────────

/// GET /create/
pub async fn create_form(State(state): State<AppState>) -> ApiResult<Response> {
    let groups = load_groups(&state).await?;
    form_page(&PostForm::new(), &FieldErrors::new(), groups, None)
}

/// POST /create/: on success the post belongs to the current user and the
/// response redirects to their profile.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(data): Form<PostFormData>,
) -> ApiResult<Response> {
    let groups = load_groups(&state).await?;
    let form = PostForm::new().bind(data);

    let draft = match form.validate(&groups) {
        Ok(draft) => draft.with_author(claims.sub),
        Err(errors) => return form_page(&form, &errors, groups, None),
    };

    let post_id = state.with_store(move |store| draft.save(store)).await?;
    info!("User {} created post {}", claims.username, post_id);

    Ok(found(&profile_url(&claims.username)))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Response> {
    let (post, groups) = load_post_and_groups(&state, &post_id).await?;
    if post.author_id != claims.sub && state.config.forbid_foreign_edits {
        return Err(ApiError::Forbidden);
    }
    form_page(&PostForm::for_instance(&post), &FieldErrors::new(), groups, Some(post.id))
}

/// POST /posts/{post_id}/edit/: only the author's submissions are applied.
/// Anyone else gets the untouched form back (or 403 with
/// `forbid_foreign_edits`).
pub async fn edit_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Form(data): Form<PostFormData>,
) -> ApiResult<Response> {
    let (post, groups) = load_post_and_groups(&state, &post_id).await?;

    if post.author_id != claims.sub {
        if state.config.forbid_foreign_edits {
            return Err(ApiError::Forbidden);
        }
        debug!("User {} is not the author of post {}, edit ignored", claims.sub, post.id);
        return form_page(&PostForm::for_instance(&post), &FieldErrors::new(), groups, Some(post.id));
    }

    let form = PostForm::for_instance(&post).bind(data);
    let draft = match form.validate(&groups) {
        Ok(draft) => draft,
        Err(errors) => return form_page(&form, &errors, groups, Some(post.id)),
    };

    let post_id = state.with_store(move |store| draft.save(store)).await?;
    info!("User {} edited post {}", claims.username, post_id);

    Ok(found(&detail_url(post_id)))
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Renders the create/edit page. `edit_of` is the post being edited, if any.
fn form_page(form: &PostForm, errors: &FieldErrors, groups: Vec<GroupRow>, edit_of: Option<i64>) -> ApiResult<Response> {
    let groups: Vec<_> = groups.into_iter().map(views::group).collect();

    let mut context = Context::new();
    context.insert("form", &form.context(errors))?;
    context.insert("groups", &groups)?;
    if let Some(post_id) = edit_of {
        context.insert("is_edit", &true)?;
        context.insert("post_id", &post_id)?;
    }
    Ok(render(CREATE_TEMPLATE, context))
}

async fn load_groups(state: &AppState) -> ApiResult<Vec<GroupRow>> {
    state.with_store(|store| store.list_groups()).await
}

async fn load_post_and_groups(state: &AppState, raw_id: &str) -> ApiResult<(PostRow, Vec<GroupRow>)> {
    let post_id = parse_post_id(raw_id)?;
    state
        .with_store(move |store| {
            let Some(post) = store.get_post(post_id)? else {
                return Ok(None);
            };
            Ok(Some((post, store.list_groups()?)))
        })
        .await?
        .ok_or(ApiError::NotFound)
}

/// Post ids are integers; anything else cannot name a post.
fn parse_post_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}
