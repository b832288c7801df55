use crate::api::handlers::{
    auth::{self, admin, session},
    graph, health,
    ledger::{expense, income},
};
use axum::middleware;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Routes added in `api::app` (the `/admin` page, login aliases and
/// `OPTIONS /health`) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // Every admin route requires a session whose user is an administrator.
    let admin_routes = OpenApiRouter::new()
        .routes(routes!(admin::get_user, admin::create_user))
        .route_layer(middleware::from_fn(auth::require_admin));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(session::login))
        .routes(routes!(session::logout))
        .routes(routes!(expense::list, expense::add))
        .routes(routes!(expense::delete))
        .routes(routes!(income::list, income::add))
        .routes(routes!(income::delete))
        .routes(routes!(graph::graph))
        .merge(admin_routes);

    router.get_openapi_mut().tags = Some(vec![
        tag("health", "Service and database health"),
        tag("auth", "Session login and logout"),
        tag("admin", "User administration, administrators only"),
        tag("ledger", "Expenses, incomes and the summary graph"),
    ]);

    router
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

// Only the first of the `;` separated Cargo authors is used.
fn cargo_contact() -> Option<Contact> {
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|trimmed| !trimmed.is_empty())
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, rest)) => (
            optional_str(name),
            optional_str(rest.trim_end_matches('>')),
        ),
        None => (optional_str(author), None),
    }
}
