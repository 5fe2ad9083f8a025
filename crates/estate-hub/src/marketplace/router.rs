use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::credentials::PasswordHasher;
use super::domain::{ListingOrigin, ListingSubmission, PropertyId, Registration};
use super::search::SearchCriteria;
use super::service::{MarketplaceError, MarketplaceService, Notice};
use super::sessions::SessionToken;
use super::uploads::ImageStore;

type SharedService<H, I> = Arc<MarketplaceService<H, I>>;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InterestQuery {
    #[serde(default)]
    pub(crate) origin: Option<ListingOrigin>,
}

/// Router exposing registration, login and listing endpoints.
pub fn marketplace_router<H, I>(service: SharedService<H, I>) -> Router
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    Router::new()
        .route("/", get(index_handler::<H, I>))
        .route("/register", post(register_handler::<H, I>))
        .route("/login", post(login_handler::<H, I>))
        .route("/logout", get(logout_handler::<H, I>))
        .route(
            "/buyer_dashboard",
            get(buyer_dashboard_handler::<H, I>).post(buyer_search_handler::<H, I>),
        )
        .route("/seller_dashboard", get(seller_dashboard_handler::<H, I>))
        .route("/post_property", post(post_property_handler::<H, I>))
        .route(
            "/edit_property/:property_id",
            get(edit_form_handler::<H, I>).post(edit_property_handler::<H, I>),
        )
        .route(
            "/delete_property/:property_id",
            post(delete_property_handler::<H, I>),
        )
        .route("/interested/:property_id", get(interested_handler::<H, I>))
        .with_state(service)
}

pub(crate) fn error_response(error: MarketplaceError) -> Response {
    let payload = json!({ "notice": error.notice() });
    (error.status_code(), Json(payload)).into_response()
}

pub(crate) async fn index_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    let payload = json!({
        "authenticated": session.principal().is_some(),
        "principal": session.principal(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn register_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    Json(registration): Json<Registration>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    match service.register(registration) {
        Ok(()) => {
            let notice = Notice::success("You have successfully registered!", "/login");
            (StatusCode::CREATED, Json(json!({ "notice": notice }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn login_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    match service.login(&form.email, &form.password) {
        Ok(outcome) => {
            // The new cookie replaces whatever session this client held before.
            service.logout(SessionToken::from_headers(&headers).as_ref());
            let notice = Notice::success("Login successful!", outcome.principal.role.dashboard());
            let payload = json!({ "notice": notice, "principal": outcome.principal });
            (
                StatusCode::OK,
                [(header::SET_COOKIE, outcome.token.to_cookie_header())],
                Json(payload),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn logout_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    service.logout(SessionToken::from_headers(&headers).as_ref());
    let notice = Notice::success("You have been logged out.", "/");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, SessionToken::expired_cookie_header())],
        Json(json!({ "notice": notice })),
    )
        .into_response()
}

pub(crate) async fn buyer_dashboard_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.buyer_dashboard(&session, None) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn buyer_search_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Json(criteria): Json<SearchCriteria>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.buyer_dashboard(&session, Some(&criteria)) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn seller_dashboard_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.seller_dashboard(&session) {
        Ok(properties) => {
            (StatusCode::OK, Json(json!({ "properties": properties }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn post_property_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Json(submission): Json<ListingSubmission>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.post_property(&session, submission) {
        Ok(property) => {
            let notice = Notice::success("Property posted successfully!", "/seller_dashboard");
            let payload = json!({ "notice": notice, "property": property });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_form_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Path(property_id): Path<u64>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.edit_form(&session, PropertyId(property_id)) {
        Ok(property) => (StatusCode::OK, Json(json!({ "property": property }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_property_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Path(property_id): Path<u64>,
    Json(submission): Json<ListingSubmission>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.edit_property(&session, PropertyId(property_id), submission) {
        Ok(property) => {
            let notice = Notice::success("Property updated successfully!", "/seller_dashboard");
            let payload = json!({ "notice": notice, "property": property });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_property_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Path(property_id): Path<u64>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.delete_property(&session, PropertyId(property_id)) {
        Ok(()) => {
            let notice = Notice::success("Property deleted successfully!", "/seller_dashboard");
            (StatusCode::OK, Json(json!({ "notice": notice }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn interested_handler<H, I>(
    State(service): State<SharedService<H, I>>,
    headers: HeaderMap,
    Path(property_id): Path<u64>,
    Query(query): Query<InterestQuery>,
) -> Response
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    let session = service.session(SessionToken::from_headers(&headers).as_ref());
    match service.interested(&session, PropertyId(property_id), query.origin) {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(error) => error_response(error),
    }
}
