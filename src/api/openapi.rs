use super::handlers::{
    auth::{code, gateway, session},
    health, records,
};
use axum::middleware;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Record routes are merged from a sub-router wrapped in the session gateway;
/// `validate-code` only gets the same-origin check.
/// Routes added outside (like `/` or `OPTIONS /health`) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let code_router = OpenApiRouter::new()
        .routes(routes!(code::validate_code))
        .layer(middleware::from_fn(gateway::require_same_origin));

    let records_router = OpenApiRouter::new()
        .routes(routes!(records::add))
        .routes(routes!(records::search))
        .routes(routes!(records::inactive))
        .routes(routes!(records::followup))
        .routes(routes!(records::today_entries))
        .routes(routes!(records::new_entry))
        .layer(middleware::from_fn(gateway::require_session));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(session::check_session))
        .routes(routes!(session::logout))
        .merge(code_router)
        .merge(records_router);

    let mut noteora_tag = Tag::new("noteora");
    noteora_tag.description = Some("Project outreach log".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Access code validation and sessions".to_string());

    let mut records_tag = Tag::new("records");
    records_tag.description = Some("Record reports, gated by a valid session".to_string());

    router.get_openapi_mut().tags = Some(vec![noteora_tag, auth_tag, records_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

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

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (
            non_empty(name.trim()),
            non_empty(email.trim_end_matches('>').trim()),
        ),
        None => (non_empty(author.trim()), None),
    }
}
