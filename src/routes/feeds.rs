use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};

use crate::db::documents;
use crate::error::AppError;
use crate::schema::{BlogPost, CaseStudy, Document};
use crate::state::AppState;

/// Most recent posts carried by the feed.
pub const RSS_ITEM_LIMIT: usize = 50;

/// Public pages listed in the sitemap besides the per-slug pages.
pub const STATIC_PATHS: &[&str] = &["/", "/blog", "/case-studies", "/industries", "/team", "/contact"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rss.xml", get(rss_feed))
        .route("/sitemap.xml", get(sitemap))
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn xml_response(content_type: &'static str, xml: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        xml,
    )
        .into_response()
}

pub fn render_rss(base_url: &str, title: &str, description: &str, posts: &[Document<BlogPost>]) -> String {
    let mut items = String::new();
    for post in posts.iter().take(RSS_ITEM_LIMIT) {
        let post_url = format!("{}/blog/{}", base_url, post.body.slug);
        items.push_str(&format!(
            "    <item>\n\
                   <title>{}</title>\n\
                   <link>{}</link>\n\
                   <description>{}</description>\n\
                   <pubDate>{}</pubDate>\n\
                   <guid isPermaLink=\"true\">{}</guid>\n\
                 </item>\n",
            escape_xml(&post.body.title),
            escape_xml(&post_url),
            escape_xml(&post.body.description),
            rfc822(&post.created_at),
            escape_xml(&post_url),
        ));
    }

    let feed_url = format!("{}/rss.xml", base_url);
    let blog_url = format!("{}/blog", base_url);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(title),
        escape_xml(&blog_url),
        escape_xml(description),
        escape_xml(&feed_url),
        posts.first().map(|p| rfc822(&p.created_at)).unwrap_or_default(),
        items,
    )
}

/// GET /rss.xml
pub async fn rss_feed(State(state): State<AppState>) -> Result<Response, AppError> {
    // Listing is newest first.
    let posts = documents::list::<BlogPost>(state.store()).await?;
    let site = &state.config.site;
    let xml = render_rss(&site.url, &site.title, &site.description, &posts);
    Ok(xml_response("application/rss+xml; charset=utf-8", xml))
}

pub fn render_sitemap(base_url: &str, paths: &[String]) -> String {
    let mut urls = String::new();
    for path in paths {
        urls.push_str(&format!(
            "  <url><loc>{}</loc></url>\n",
            escape_xml(&format!("{base_url}{path}"))
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n"
    )
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
    let posts = documents::list::<BlogPost>(state.store()).await?;
    let studies = documents::list::<CaseStudy>(state.store()).await?;

    let mut paths: Vec<String> = STATIC_PATHS.iter().map(|p| p.to_string()).collect();
    paths.extend(
        posts
            .iter()
            .filter(|p| !p.body.slug.is_empty())
            .map(|p| format!("/blog/{}", p.body.slug)),
    );
    paths.extend(
        studies
            .iter()
            .filter(|s| !s.body.slug.is_empty())
            .map(|s| format!("/case-studies/{}", s.body.slug)),
    );

    let xml = render_sitemap(&state.config.site.url, &paths);
    Ok(xml_response("application/xml; charset=utf-8", xml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn post(title: &str, slug: &str) -> Document<BlogPost> {
        Document {
            id: Uuid::new_v4(),
            body: BlogPost {
                title: title.into(),
                slug: slug.into(),
                description: "desc & more".into(),
                ..Default::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<title>"), "&lt;title&gt;");
        assert_eq!(escape_xml("\"quote\""), "&quot;quote&quot;");
    }

    #[test]
    fn test_rfc822_format() {
        use chrono::TimeZone;
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(rfc822(&dt), "Mon, 15 Jan 2024 12:00:00 +0000");
    }

    #[test]
    fn test_render_rss_limits_items() {
        let posts: Vec<_> = (0..60).map(|i| post(&format!("Post {i}"), &format!("post-{i}"))).collect();
        let xml = render_rss("https://example.com", "Blog", "All posts", &posts);
        assert_eq!(xml.matches("<item>").count(), RSS_ITEM_LIMIT);
        assert!(xml.contains("<link>https://example.com/blog/post-0</link>"));
        assert!(xml.contains("desc &amp; more"));
    }

    #[tokio::test]
    async fn test_sitemap_lists_static_and_slug_paths() {
        let (state, _dir) = test_state();
        documents::create(
            state.store(),
            CaseStudy {
                title: "Hello, World!".into(),
                content: "c".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        documents::create(
            state.store(),
            BlogPost {
                title: "First Post".into(),
                description: "d".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let (status, xml) = get_text(router().with_state(state), "/sitemap.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(xml.contains("<loc>http://localhost:3001/</loc>"));
        assert!(xml.contains("<loc>http://localhost:3001/team</loc>"));
        assert!(xml.contains("<loc>http://localhost:3001/blog/first-post</loc>"));
        assert!(xml.contains("<loc>http://localhost:3001/case-studies/hello-world</loc>"));
    }

    #[tokio::test]
    async fn test_rss_endpoint() {
        let (state, _dir) = test_state();
        documents::create(
            state.store(),
            BlogPost {
                title: "Feed Item".into(),
                description: "d".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let (status, xml) = get_text(router().with_state(state), "/rss.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(xml.contains("<title>Feed Item</title>"));
        assert!(xml.starts_with("<?xml"));
    }
}
