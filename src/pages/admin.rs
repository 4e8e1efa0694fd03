//! Admin pages. Everything except the login and reset pages sits behind the
//! auth middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use super::{document, escape, html_response, pretty_json};
use crate::auth::middleware::safe_redirect_target;
use crate::db::documents;
use crate::error::AppError;
use crate::routes::singletons::load;
use crate::schema::{
    BlogPost, CaseStudy, Collection, ContactStatus, ContactSubmission, ContentBlock,
    FooterSettings, HeroSection, IndustryCard, Resource, Singleton, TeamCategory, Testimonial,
    TrustedCompany, WhyChooseUs,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(login))
        .route("/admin/reset-password", get(reset_password))
        .route("/admin", get(dashboard))
        .route("/admin/contact", get(contact_submissions))
        .route("/admin/footer", get(footer_editor))
        .route("/admin/why-choose-us", get(why_choose_us_editor))
        .route("/admin/{path}", get(collection))
}

fn nav() -> String {
    let mut nav = String::from("<a href=\"/admin\">Dashboard</a>");
    for c in Collection::MANAGED {
        nav.push_str(&format!("<a href=\"/admin/{}\">{}</a>", c.path(), c.title()));
    }
    nav.push_str(
        "<a href=\"/admin/contact\">Contact</a><a href=\"/admin/footer\">Footer</a>\
         <a href=\"/admin/why-choose-us\">Why choose us</a>\
         <form data-api=\"/api/auth/logout\" data-redirect=\"/admin/login\" style=\"display:inline\">\
         <button type=\"submit\">Log out</button></form>",
    );
    nav
}

fn admin_page(state: &AppState, status: StatusCode, title: &str, main: &str) -> Response {
    html_response(status, document(title, &state.config.site, &nav(), main, ""))
}

/// Multipart field a create/edit form's file input writes to.
fn image_field(collection: Collection) -> Option<&'static str> {
    match collection {
        Collection::CaseStudies => Some("headerImage"),
        Collection::TeamCategories | Collection::ContactSubmissions => None,
        _ => Some("image"),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    redirect: Option<String>,
}

/// GET /admin/login
pub async fn login(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Response {
    let target = safe_redirect_target(query.redirect.as_deref());
    let main = format!(
        "<h1>Admin login</h1>\
         <form data-api=\"/api/auth/login\" data-json data-redirect=\"{}\">\
         <p><label>Username <input name=\"username\" autocomplete=\"username\" required></label></p>\
         <p><label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\" required></label></p>\
         <p><button type=\"submit\">Sign in</button></p><p class=\"result\"></p></form>\
         <details><summary>Forgot password?</summary>\
         <form data-api=\"/api/auth/forgot-password\" data-json data-redirect=\"/admin/login\">\
         <p><label>Username <input name=\"username\" required></label></p>\
         <p><button type=\"submit\">Send reset link</button></p><p class=\"result\"></p></form></details>",
        escape(&target)
    );
    html_response(StatusCode::OK, document("Login", &state.config.site, "", &main, ""))
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    token: Option<String>,
}

/// GET /admin/reset-password
pub async fn reset_password(State(state): State<AppState>, Query(query): Query<ResetQuery>) -> Response {
    let main = format!(
        "<h1>Choose a new password</h1>\
         <form data-api=\"/api/auth/reset-password\" data-json data-redirect=\"/admin/login\">\
         <input type=\"hidden\" name=\"token\" value=\"{}\">\
         <p><label>New password <input type=\"password\" name=\"password\" minlength=\"8\" required></label></p>\
         <p><button type=\"submit\">Update password</button></p><p class=\"result\"></p></form>",
        escape(query.token.as_deref().unwrap_or_default())
    );
    html_response(
        StatusCode::OK,
        document("Reset password", &state.config.site, "", &main, ""),
    )
}

/// GET /admin
pub async fn dashboard(State(state): State<AppState>) -> Result<Response, AppError> {
    let mut rows = String::new();
    for c in Collection::MANAGED.into_iter().chain([Collection::ContactSubmissions]) {
        let count = state.store().count(c).await?;
        rows.push_str(&format!(
            "<tr><td><a href=\"/admin/{}\">{}</a></td><td>{}</td></tr>",
            c.path(),
            c.title(),
            count
        ));
    }
    let main = format!(
        "<h1>Dashboard</h1><table><thead><tr><th>Collection</th><th>Documents</th></tr></thead>\
         <tbody>{rows}</tbody></table>\
         <p><a href=\"/admin/footer\">Footer settings</a> | <a href=\"/admin/why-choose-us\">Why choose us</a></p>"
    );
    Ok(admin_page(&state, StatusCode::OK, "Dashboard", &main))
}

/// GET /admin/{path}
pub async fn collection(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    match Collection::from_path(&path) {
        Some(Collection::BlogPosts) => collection_page::<BlogPost>(&state).await,
        Some(Collection::CaseStudies) => collection_page::<CaseStudy>(&state).await,
        Some(Collection::Industries) => collection_page::<IndustryCard>(&state).await,
        Some(Collection::TeamCategories) => collection_page::<TeamCategory>(&state).await,
        Some(Collection::Testimonials) => collection_page::<Testimonial>(&state).await,
        Some(Collection::TrustedCompanies) => collection_page::<TrustedCompany>(&state).await,
        Some(Collection::HeroSections) => collection_page::<HeroSection>(&state).await,
        Some(Collection::ContentBlocks) => collection_page::<ContentBlock>(&state).await,
        Some(Collection::ContactSubmissions) => contact_submissions(State(state)).await,
        None => Ok(admin_page(
            &state,
            StatusCode::NOT_FOUND,
            "Not found",
            "<h1>Unknown section</h1>",
        )),
    }
}

fn file_input(collection: Collection) -> String {
    match image_field(collection) {
        Some(field) => format!(
            "<p><label>Image <input type=\"file\" name=\"{field}\" accept=\"image/*\"></label></p>"
        ),
        None => String::new(),
    }
}

async fn collection_page<R: Resource>(state: &AppState) -> Result<Response, AppError> {
    let collection = R::COLLECTION;
    let api = format!("/api/{}", collection.path());
    let docs = documents::list::<R>(state.store()).await?;

    let mut rows = String::new();
    for doc in &docs {
        let item = format!("{api}/{}", doc.id);
        let slug = doc
            .body
            .slug()
            .map(|s| format!("<code>{}</code>", escape(s)))
            .unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td>\
             <td><details><summary>Edit</summary>\
             <form data-api=\"{item}\" data-method=\"PATCH\">\
             <textarea name=\"data\">{}</textarea>{}\
             <button type=\"submit\">Save</button><p class=\"result\"></p></form></details></td>\
             <td><form data-api=\"{item}\" data-method=\"DELETE\">\
             <button type=\"submit\">Delete</button><p class=\"result\"></p></form></td></tr>",
            escape(doc.body.label()),
            slug,
            doc.created_at.format("%Y-%m-%d %H:%M"),
            escape(&pretty_json(&doc.body)),
            file_input(collection),
        ));
    }

    let main = format!(
        "<h1>{}</h1><table><thead><tr><th>Name</th><th>Slug</th><th>Created</th><th></th><th></th></tr>\
         </thead><tbody>{rows}</tbody></table>\
         <h2>Create</h2><form data-api=\"{api}\">\
         <textarea name=\"data\">{}</textarea>{}\
         <p><button type=\"submit\">Create</button></p><p class=\"result\"></p></form>",
        collection.title(),
        escape(&pretty_json(&R::default())),
        file_input(collection),
    );
    Ok(admin_page(state, StatusCode::OK, collection.title(), &main))
}

/// GET /admin/contact
pub async fn contact_submissions(State(state): State<AppState>) -> Result<Response, AppError> {
    let submissions = documents::list::<ContactSubmission>(state.store()).await?;

    let mut rows = String::new();
    for doc in &submissions {
        let s = &doc.body;
        let item = format!("/api/contact/{}", doc.id);
        let options: String = ContactStatus::ALL
            .iter()
            .map(|status| {
                format!(
                    "<option value=\"{0}\"{1}>{0}</option>",
                    status.as_str(),
                    if *status == s.status { " selected" } else { "" }
                )
            })
            .collect();
        rows.push_str(&format!(
            "<tr><td>{} {}</td><td>{}<br>{}</td><td>{}</td><td>{}</td>\
             <td><form data-api=\"{item}\" data-method=\"PATCH\" data-json>\
             <select name=\"status\">{options}</select><button type=\"submit\">Update</button>\
             <p class=\"result\"></p></form></td>\
             <td><form data-api=\"{item}\" data-method=\"DELETE\">\
             <button type=\"submit\">Delete</button></form></td></tr>",
            escape(&s.first_name),
            escape(&s.last_name),
            escape(&s.email),
            escape(&s.phone),
            escape(&s.message),
            doc.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }

    let main = format!(
        "<h1>Contact submissions</h1><table><thead><tr><th>Name</th><th>Contact</th>\
         <th>Message</th><th>Received</th><th>Status</th><th></th></tr></thead>\
         <tbody>{rows}</tbody></table>"
    );
    Ok(admin_page(&state, StatusCode::OK, "Contact submissions", &main))
}

async fn singleton_editor<S: Singleton>(
    state: &AppState,
    title: &str,
    api: &str,
) -> Result<Response, AppError> {
    let current = load::<S>(state.store()).await?;
    let main = format!(
        "<h1>{}</h1><form data-api=\"{api}\" data-method=\"PUT\">\
         <textarea name=\"data\">{}</textarea>\
         <p><button type=\"submit\">Save</button></p><p class=\"result\"></p></form>",
        escape(title),
        escape(&pretty_json(&current)),
    );
    Ok(admin_page(state, StatusCode::OK, title, &main))
}

/// GET /admin/footer
pub async fn footer_editor(State(state): State<AppState>) -> Result<Response, AppError> {
    singleton_editor::<FooterSettings>(&state, "Footer", "/api/footer").await
}

/// GET /admin/why-choose-us
pub async fn why_choose_us_editor(State(state): State<AppState>) -> Result<Response, AppError> {
    singleton_editor::<WhyChooseUs>(&state, "Why choose us", "/api/why-choose-us").await
}
