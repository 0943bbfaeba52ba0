//! Request handlers of the ad management workflow.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::{Form, FormRejection};
use classifieds_authz::{can_create, can_modify, Principal, NOT_OWNER_MESSAGE};
use classifieds_http::{
    auth::CurrentUser,
    error::AppError,
    session::{Flash, FlashMessage},
    view::Views,
};
use classifieds_kernel::settings::AdsSettings;
use serde::Serialize;

use super::form::{AdForm, FormErrors, FormView};
use super::models::Ad;
use super::pagination::Paginator;
use super::repository::AdRepository;
use super::routes::{AdRoute, Segment};
use super::slug::unique_slug;

/// Everything the handlers share.
#[derive(Clone)]
pub struct AdsState {
    pub repo: Arc<dyn AdRepository>,
    pub views: Arc<Views>,
    pub settings: AdsSettings,
}

pub fn router(state: AdsState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/new", get(new_form).post(create))
        .route("/{segment}", get(page_or_show))
        .route("/{slug}/edit", get(edit_form).post(update))
        .route("/{slug}/delete", get(delete).post(delete))
        .with_state(state)
}

type FormBody = Result<Form<AdForm>, FormRejection>;

#[derive(Serialize)]
struct Nav {
    index: String,
    create: String,
}

/// Context shared by every page; flashes are consumed by rendering it.
#[derive(Serialize)]
struct Page<T: Serialize> {
    flashes: Vec<FlashMessage>,
    user: Option<String>,
    nav: Nav,
    #[serde(flatten)]
    body: T,
}

fn render<T: Serialize>(
    state: &AdsState,
    name: &str,
    user: &CurrentUser,
    flash: &Flash,
    body: T,
) -> Result<Html<String>, AppError> {
    let page = Page {
        flashes: flash.drain(),
        user: user.principal().map(|p| p.name.clone()),
        nav: Nav {
            index: AdRoute::Index { page: 1 }.path(),
            create: AdRoute::Create.path(),
        },
        body,
    };
    state.views.render(name, page)
}

#[derive(Serialize)]
struct AdView<'a> {
    #[serde(flatten)]
    ad: &'a Ad,
    price_label: String,
    url: String,
    edit_url: String,
    delete_url: String,
    can_modify: bool,
}

impl<'a> AdView<'a> {
    fn new(ad: &'a Ad, principal: Option<&Principal>) -> Self {
        Self {
            ad,
            price_label: format!("{:.2} €", ad.price),
            url: AdRoute::Show { slug: &ad.slug }.path(),
            edit_url: AdRoute::Edit { slug: &ad.slug }.path(),
            delete_url: AdRoute::Delete { slug: &ad.slug }.path(),
            can_modify: principal.is_some_and(|p| can_modify(p, ad.author_id)),
        }
    }
}

#[derive(Serialize)]
struct PaginationView {
    page: u64,
    pages: u64,
    previous_url: Option<String>,
    next_url: Option<String>,
}

#[derive(Serialize)]
struct IndexBody<'a> {
    ads: Vec<AdView<'a>>,
    pagination: PaginationView,
}

#[derive(Serialize)]
struct ShowBody<'a> {
    ad: AdView<'a>,
}

#[derive(Serialize)]
struct FormBodyView<'a> {
    form: FormView,
    errors: &'a FormErrors,
    action: String,
    submit: &'static str,
    ad: Option<AdView<'a>>,
}

async fn index(
    State(state): State<AdsState>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Html<String>, AppError> {
    list(&state, 1, &user, &flash).await
}

/// `/ads/{page}` and `/ads/{slug}` share a path shape; digits select a page.
async fn page_or_show(
    State(state): State<AdsState>,
    Path(segment): Path<String>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Html<String>, AppError> {
    match Segment::parse(&segment) {
        Segment::Page(page) => list(&state, page, &user, &flash).await,
        Segment::Slug(slug) => show(&state, slug, &user, &flash).await,
    }
}

async fn list(
    state: &AdsState,
    page: u64,
    user: &CurrentUser,
    flash: &Flash,
) -> Result<Html<String>, AppError> {
    let total = state.repo.count().await?;
    let paginator = Paginator::new(page, state.settings.page_limit(), total);
    let ads = if paginator.is_past_end() {
        Vec::new()
    } else {
        state.repo.find_window(paginator.window()).await?
    };

    let body = IndexBody {
        ads: ads.iter().map(|ad| AdView::new(ad, user.principal())).collect(),
        pagination: PaginationView {
            page: paginator.page,
            pages: paginator.pages,
            previous_url: paginator.previous().map(|page| AdRoute::Index { page }.path()),
            next_url: paginator.next().map(|page| AdRoute::Index { page }.path()),
        },
    };
    render(state, "ads/index.html", user, flash, body)
}

async fn show(
    state: &AdsState,
    slug: &str,
    user: &CurrentUser,
    flash: &Flash,
) -> Result<Html<String>, AppError> {
    let ad = find(state, slug).await?;
    let body = ShowBody {
        ad: AdView::new(&ad, user.principal()),
    };
    render(state, "ads/show.html", user, flash, body)
}

async fn find(state: &AdsState, slug: &str) -> Result<Ad, AppError> {
    state
        .repo
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no ad with slug '{slug}'")))
}

fn ensure_can_create(state: &AdsState, user: &CurrentUser) -> Result<(), AppError> {
    if can_create(user.principal(), state.settings.require_login_to_create) {
        return Ok(());
    }
    tracing::warn!("anonymous ad creation refused");
    Err(AppError::unauthorized("You must be signed in to post an ad"))
}

fn ensure_can_modify(user: &CurrentUser, ad: &Ad) -> Result<(), AppError> {
    let Some(principal) = user.principal() else {
        tracing::warn!(slug = %ad.slug, "anonymous modification refused");
        return Err(AppError::unauthorized("You must be signed in to modify an ad"));
    };
    if can_modify(principal, ad.author_id) {
        return Ok(());
    }
    tracing::warn!(slug = %ad.slug, user_id = %principal.user_id, "modification by non-owner refused");
    Err(AppError::forbidden(NOT_OWNER_MESSAGE))
}

fn bind(body: FormBody) -> Result<AdForm, AppError> {
    body.map(|Form(form)| form)
        .map_err(|rejection| AppError::bad_request(rejection.to_string()))
}

fn render_create(
    state: &AdsState,
    user: &CurrentUser,
    flash: &Flash,
    form: &AdForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let body = FormBodyView {
        form: form.view(),
        errors,
        action: AdRoute::Create.path(),
        submit: "Post",
        ad: None,
    };
    render(state, "ads/new.html", user, flash, body)
}

fn render_edit(
    state: &AdsState,
    user: &CurrentUser,
    flash: &Flash,
    ad: &Ad,
    form: &AdForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let body = FormBodyView {
        form: form.view(),
        errors,
        action: AdRoute::Edit { slug: &ad.slug }.path(),
        submit: "Save",
        ad: Some(AdView::new(ad, user.principal())),
    };
    render(state, "ads/edit.html", user, flash, body)
}

async fn new_form(
    State(state): State<AdsState>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Html<String>, AppError> {
    ensure_can_create(&state, &user)?;
    render_create(&state, &user, &flash, &AdForm::default(), &FormErrors::default())
}

async fn create(
    State(state): State<AdsState>,
    user: CurrentUser,
    flash: Flash,
    body: FormBody,
) -> Result<Response, AppError> {
    ensure_can_create(&state, &user)?;
    let form = bind(body)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(render_create(&state, &user, &flash, &form, &errors)?.into_response())
        }
    };

    let slug = unique_slug(state.repo.as_ref(), &input.title).await?;
    let ad = Ad::create(input, slug, user.principal());
    state.repo.save(&ad).await?;

    tracing::info!(slug = %ad.slug, user_id = ?ad.author_id, images = ad.images.len(), "ad created");
    flash.success(format!("The ad “{}” has been saved", ad.title));

    Ok(Redirect::to(&AdRoute::Show { slug: &ad.slug }.path()).into_response())
}

async fn edit_form(
    State(state): State<AdsState>,
    Path(slug): Path<String>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Html<String>, AppError> {
    let ad = find(&state, &slug).await?;
    ensure_can_modify(&user, &ad)?;

    render_edit(&state, &user, &flash, &ad, &AdForm::from(&ad), &FormErrors::default())
}

/// Saves then renders the edit view again, with the confirmation.
async fn update(
    State(state): State<AdsState>,
    Path(slug): Path<String>,
    user: CurrentUser,
    flash: Flash,
    body: FormBody,
) -> Result<Html<String>, AppError> {
    let mut ad = find(&state, &slug).await?;
    ensure_can_modify(&user, &ad)?;
    let form = bind(body)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_edit(&state, &user, &flash, &ad, &form, &errors),
    };

    ad.apply(input);
    state.repo.save(&ad).await?;

    tracing::info!(slug = %ad.slug, images = ad.images.len(), "ad updated");
    flash.success(format!("The ad “{}” has been updated", ad.title));

    render_edit(&state, &user, &flash, &ad, &AdForm::from(&ad), &FormErrors::default())
}

/// The confirmation is queued before the removal, so it survives a failed removal.
async fn delete(
    State(state): State<AdsState>,
    Path(slug): Path<String>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Redirect, AppError> {
    let ad = find(&state, &slug).await?;
    ensure_can_modify(&user, &ad)?;

    flash.success(format!("The ad “{}” has been deleted", ad.title));
    state.repo.remove(&ad).await?;

    tracing::info!(slug = %ad.slug, "ad deleted");
    Ok(Redirect::to(&AdRoute::Index { page: 1 }.path()))
}
