//! Public site pages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use super::{document, escape, html_response, render_footer};
use crate::db::{documents, ContentStore};
use crate::error::AppError;
use crate::routes::singletons::load;
use crate::schema::{
    BlogPost, CaseStudy, ContentBlock, FooterSettings, HeroSection, IndustryCard, Resource,
    TeamCategory, Testimonial, TrustedCompany, WhyChooseUs,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(blog_post))
        .route("/case-studies", get(case_study_index))
        .route("/case-studies/{slug}", get(case_study))
        .route("/industries", get(industries))
        .route("/team", get(team))
        .route("/contact", get(contact))
}

const NAV: &str = "<a href=\"/\">Home</a><a href=\"/blog\">Blog</a>\
<a href=\"/case-studies\">Case studies</a><a href=\"/industries\">Industries</a>\
<a href=\"/team\">Team</a><a href=\"/contact\">Contact</a>";

async fn page(state: &AppState, status: StatusCode, title: &str, main: &str) -> Result<Response, AppError> {
    let footer = load::<FooterSettings>(state.store()).await?;
    let html = document(title, &state.config.site, NAV, main, &render_footer(&footer));
    Ok(html_response(status, html))
}

async fn not_found(state: &AppState) -> Result<Response, AppError> {
    page(
        state,
        StatusCode::NOT_FOUND,
        "Not found",
        "<h1>Page not found</h1><p><a href=\"/\">Back to the home page</a></p>",
    )
    .await
}

fn image(src: &str, alt: &str) -> String {
    if src.is_empty() {
        String::new()
    } else {
        format!("<img src=\"{}\" alt=\"{}\">", escape(src), escape(alt))
    }
}

fn tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let items: Vec<String> = tags.iter().map(|t| format!("<li>{}</li>", escape(t))).collect();
    format!("<ul class=\"tags\">{}</ul>", items.join(""))
}

fn hero(hero: &HeroSection) -> String {
    let button = if hero.button_text.is_empty() {
        String::new()
    } else {
        format!(
            "<a class=\"button\" href=\"{}\">{}</a>",
            escape(&hero.button_link),
            escape(&hero.button_text)
        )
    };
    format!(
        "<section class=\"hero\"><h1>{}</h1><p>{}</p>{}{}</section>",
        escape(&hero.title),
        escape(&hero.subtitle),
        image(&hero.image, &hero.title),
        button
    )
}

/// Content-block sections shown on the home page.
const HOME_SECTIONS: &[&str] = &["home", "about"];

/// The hero configured for `page_key`, or a plain heading.
async fn heading(store: &dyn ContentStore, page_key: &str, title: &str) -> Result<String, AppError> {
    let heroes = documents::list::<HeroSection>(store).await?;
    Ok(match heroes.iter().find(|h| h.body.page == page_key) {
        Some(h) => hero(&h.body),
        None => format!("<h1>{}</h1>", escape(title)),
    })
}

/// Content blocks of the given sections, by ascending `position`.
async fn content_blocks(store: &dyn ContentStore, sections: &[&str]) -> Result<String, AppError> {
    let mut blocks: Vec<ContentBlock> = documents::list::<ContentBlock>(store)
        .await?
        .into_iter()
        .map(|d| d.body)
        .filter(|b| sections.contains(&b.section.as_str()))
        .collect();
    blocks.sort_by_key(|b| b.position);

    // `body` was sanitized on write.
    Ok(blocks
        .iter()
        .map(|b| {
            format!(
                "<section class=\"block\"><h2>{}</h2>{}<div class=\"content\">{}</div></section>",
                escape(&b.title),
                image(&b.image, &b.title),
                b.body
            )
        })
        .collect())
}

/// GET /
pub async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let companies = documents::list::<TrustedCompany>(store).await?;
    let testimonials = documents::list::<Testimonial>(store).await?;
    let why = load::<WhyChooseUs>(store).await?;

    let mut main = heading(store, "home", &state.config.site.title).await?;
    main.push_str(&content_blocks(store, HOME_SECTIONS).await?);

    if !companies.is_empty() {
        main.push_str("<section><h2>Trusted by</h2><div class=\"cards\">");
        for company in &companies {
            main.push_str(&format!(
                "<div class=\"card\">{}<p>{}</p></div>",
                image(&company.body.image, &company.body.name),
                escape(&company.body.name)
            ));
        }
        main.push_str("</div></section>");
    }

    if !testimonials.is_empty() {
        main.push_str("<section><h2>What clients say</h2><div class=\"cards\">");
        for t in &testimonials {
            main.push_str(&format!(
                "<blockquote class=\"card\">{}<p>{}</p><footer>{} <span>{}</span></footer></blockquote>",
                image(&t.body.image, &t.body.name),
                escape(&t.body.quote),
                escape(&t.body.name),
                escape(&t.body.title)
            ));
        }
        main.push_str("</div></section>");
    }

    if !why.title.is_empty() || !why.benefits.is_empty() {
        main.push_str(&format!("<section><h2>{}</h2>", escape(&why.title)));
        for paragraph in &why.intro {
            main.push_str(&format!("<p>{}</p>", escape(paragraph)));
        }
        if !why.benefits.is_empty() {
            main.push_str("<div class=\"cards\">");
            for benefit in &why.benefits {
                main.push_str(&format!(
                    "<div class=\"card\"><h3>{}</h3><p>{}</p></div>",
                    escape(&benefit.title),
                    escape(&benefit.description)
                ));
            }
            main.push_str("</div>");
        }
        if !why.mission.is_empty() {
            main.push_str(&format!("<h3>Mission</h3><p>{}</p>", escape(&why.mission)));
        }
        if !why.vision.is_empty() {
            main.push_str(&format!("<h3>Vision</h3><p>{}</p>", escape(&why.vision)));
        }
        main.push_str("</section>");
    }

    page(&state, StatusCode::OK, "Home", &main).await
}

/// GET /blog
pub async fn blog_index(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let posts = documents::list::<BlogPost>(store).await?;
    let mut main = heading(store, "blog", "Blog").await?;
    main.push_str("<div class=\"cards\">");
    for post in &posts {
        main.push_str(&format!(
            "<article class=\"card\">{}<h2><a href=\"/blog/{}\">{}</a></h2><p>{}</p>\
             <time datetime=\"{}\">{}</time></article>",
            image(&post.body.image, &post.body.title),
            escape(&post.body.slug),
            escape(&post.body.title),
            escape(&post.body.description),
            post.created_at.to_rfc3339(),
            post.created_at.format("%B %-d, %Y")
        ));
    }
    if posts.is_empty() {
        main.push_str("<p>No posts yet.</p>");
    }
    main.push_str("</div>");
    main.push_str(&content_blocks(store, &["blog"]).await?);
    page(&state, StatusCode::OK, "Blog", &main).await
}

/// GET /blog/{slug}
pub async fn blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let Some(post) = state.store().get_by_slug(BlogPost::COLLECTION, &slug).await? else {
        return not_found(&state).await;
    };
    let post = post.decode::<BlogPost>()?;
    // `content` was sanitized on write.
    let main = format!(
        "<article><h1>{}</h1><p class=\"lead\">{}</p>{}<div class=\"content\">{}</div></article>",
        escape(&post.body.title),
        escape(&post.body.description),
        image(&post.body.image, &post.body.title),
        post.body.content
    );
    page(&state, StatusCode::OK, &post.body.title, &main).await
}

/// GET /case-studies
pub async fn case_study_index(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let studies = documents::list::<CaseStudy>(store).await?;
    let mut main = heading(store, "case-studies", "Case studies").await?;
    main.push_str("<div class=\"cards\">");
    for study in &studies {
        main.push_str(&format!(
            "<article class=\"card\">{}<h2><a href=\"/case-studies/{}\">{}</a></h2><p>{}</p></article>",
            image(&study.body.header_image, &study.body.title),
            escape(&study.body.slug),
            escape(&study.body.title),
            escape(&study.body.header_description)
        ));
    }
    if studies.is_empty() {
        main.push_str("<p>No case studies yet.</p>");
    }
    main.push_str("</div>");
    main.push_str(&content_blocks(store, &["case-studies"]).await?);
    page(&state, StatusCode::OK, "Case studies", &main).await
}

/// GET /case-studies/{slug}
pub async fn case_study(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let Some(record) = state.store().get_by_slug(CaseStudy::COLLECTION, &slug).await? else {
        return not_found(&state).await;
    };
    let study = record.decode::<CaseStudy>()?.body;

    let heading = if study.header_title.is_empty() {
        &study.title
    } else {
        &study.header_title
    };
    let mut main = format!(
        "<article><header class=\"hero\"><h1>{}</h1><p>{}</p>{}</header><div class=\"content\">{}</div>",
        escape(heading),
        escape(&study.header_description),
        image(&study.header_image, &study.title),
        study.content
    );
    if !study.cards.is_empty() {
        main.push_str("<div class=\"cards\">");
        for card in &study.cards {
            main.push_str(&format!(
                "<div class=\"card\">{}<h3>{}</h3><p>{}</p></div>",
                image(&card.image, &card.title),
                escape(&card.title),
                escape(&card.description)
            ));
        }
        main.push_str("</div>");
    }
    main.push_str("</article>");
    page(&state, StatusCode::OK, &study.title, &main).await
}

/// GET /industries
pub async fn industries(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let cards = documents::list::<IndustryCard>(store).await?;
    let mut main = heading(store, "industries", "Industries").await?;
    main.push_str("<div class=\"cards\">");
    for card in &cards {
        main.push_str(&format!(
            "<div class=\"card\">{}<h2>{}</h2><p>{}</p>{}</div>",
            image(&card.body.image, &card.body.title),
            escape(&card.body.title),
            escape(&card.body.description),
            tags(&card.body.tags)
        ));
    }
    main.push_str("</div>");
    main.push_str(&content_blocks(store, &["industries"]).await?);
    page(&state, StatusCode::OK, "Industries", &main).await
}

/// GET /team
pub async fn team(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let categories = documents::list::<TeamCategory>(store).await?;
    let mut main = heading(store, "team", "Team").await?;
    for category in &categories {
        main.push_str(&format!(
            "<section><h2>{}</h2><div class=\"cards\">",
            escape(&category.body.tab_name)
        ));
        for card in &category.body.cards {
            let button = if card.button_text.is_empty() {
                String::new()
            } else {
                format!("<a class=\"button\" href=\"/contact\">{}</a>", escape(&card.button_text))
            };
            main.push_str(&format!(
                "<div class=\"card\">{}<h3>{}</h3><p>{}</p>{}{}</div>",
                image(&card.image, &card.title),
                escape(&card.title),
                escape(&card.description),
                tags(&card.tags),
                button
            ));
        }
        main.push_str("</div></section>");
    }
    main.push_str(&content_blocks(store, &["team"]).await?);
    page(&state, StatusCode::OK, "Team", &main).await
}

/// GET /contact
pub async fn contact(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store();
    let mut main = heading(store, "contact", "Contact us").await?;
    main.push_str(&content_blocks(store, &["contact"]).await?);
    main.push_str(
        "<form data-api=\"/api/contact\" data-redirect=\"/contact?sent=1\">\
        <p><label>First name <input name=\"firstName\" required></label></p>\
        <p><label>Last name <input name=\"lastName\"></label></p>\
        <p><label>Email <input type=\"email\" name=\"email\" required></label></p>\
        <p><label>Phone <input name=\"phone\"></label></p>\
        <p><label>Message <textarea name=\"message\" required></textarea></label></p>\
        <p><button type=\"submit\">Send</button></p><p class=\"result\"></p></form>",
    );
    page(&state, StatusCode::OK, "Contact", &main).await
}
