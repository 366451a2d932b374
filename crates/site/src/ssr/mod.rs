//! Server-side rendering of page routes.
//!
//! [`render`] is pure: it maps a path and preloaded data to an HTML fragment
//! and fills a [`Head`]. Loading data and wrapping the fragment in the
//! document shell is the host's job (`routes::pages`).

mod head;
mod markdown;

use askama::Template;
use thiserror::Error;

use gamepadtest_core::Blog;

pub use head::{Head, Link, Meta, Script};
pub use markdown::{reading_time_minutes, render_markdown};

/// Site name used in titles and structured data.
pub const SITE_NAME: &str = "GamepadTest";

/// Longest description derived from post content.
const DESCRIPTION_MAX_CHARS: usize = 160;

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// A page the site can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` - the gamepad tester.
    Home,
    /// `/blog`
    BlogIndex,
    /// `/blog/{slug}`
    BlogPost { slug: String },
    /// `/about`
    About,
    /// `/privacy`
    Privacy,
    /// `/admin`
    Admin,
    /// `/admin/login`
    AdminLogin,
    NotFound,
}

impl Route {
    /// Map a request path to a route. A trailing slash is ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Self::Home,
            "/blog" => Self::BlogIndex,
            "/about" => Self::About,
            "/privacy" => Self::Privacy,
            "/admin" => Self::Admin,
            "/admin/login" => Self::AdminLogin,
            other => match other.strip_prefix("/blog/") {
                Some(slug) if !slug.is_empty() && !slug.contains('/') => Self::BlogPost {
                    slug: slug.to_string(),
                },
                _ => Self::NotFound,
            },
        }
    }

    /// Canonical path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::BlogIndex => "/blog".to_string(),
            Self::BlogPost { slug } => format!("/blog/{slug}"),
            Self::About => "/about".to_string(),
            Self::Privacy => "/privacy".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::AdminLogin => "/admin/login".to_string(),
            Self::NotFound => String::new(),
        }
    }

    /// Whether rendering this route with `context` yields the not-found page.
    #[must_use]
    pub fn is_not_found(&self, context: &RenderContext) -> bool {
        match self {
            Self::NotFound => true,
            Self::BlogPost { slug } => context.blog.as_ref().is_none_or(|blog| &blog.slug != slug),
            _ => false,
        }
    }
}

/// Data preloaded for a render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Public base URL, no trailing slash.
    pub base_url: String,
    /// Published posts, newest first (blog index and home page).
    pub blogs: Vec<Blog>,
    /// The post for a `/blog/{slug}` route, if it exists and is published.
    pub blog: Option<Blog>,
}

impl RenderContext {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// The featured image, unless blank.
fn image_url(blog: &Blog) -> Option<&str> {
    blog.featured_image.as_deref().filter(|url| !url.trim().is_empty())
}

/// A blog row prepared for templates.
#[derive(Debug, Clone)]
pub struct BlogView {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published_on: String,
    pub published_iso: String,
    pub reading_time: u32,
    pub content_html: String,
}

impl BlogView {
    fn summary(blog: &Blog) -> Self {
        Self {
            title: blog.title.clone(),
            slug: blog.slug.clone(),
            excerpt: blog.excerpt.clone(),
            featured_image: image_url(blog).map(str::to_owned),
            published_on: blog.created_at.format("%B %-d, %Y").to_string(),
            published_iso: blog.created_at.to_rfc3339(),
            reading_time: reading_time_minutes(&blog.content),
            content_html: String::new(),
        }
    }

    fn full(blog: &Blog) -> Self {
        Self {
            content_html: render_markdown(&blog.content),
            ..Self::summary(blog)
        }
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate {
    latest: Vec<BlogView>,
}

#[derive(Template)]
#[template(path = "blog/index.html")]
struct BlogIndexTemplate {
    posts: Vec<BlogView>,
}

#[derive(Template)]
#[template(path = "blog/show.html")]
struct BlogShowTemplate {
    post: BlogView,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate;

#[derive(Template)]
#[template(path = "pages/privacy.html")]
struct PrivacyTemplate;

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct AdminTemplate;

#[derive(Template)]
#[template(path = "admin/login.html")]
struct AdminLoginTemplate;

#[derive(Template)]
#[template(path = "errors/not_found.html")]
struct NotFoundTemplate<'a> {
    path: &'a str,
}

/// Number of posts linked from the home page.
const HOME_LATEST_POSTS: usize = 3;

/// Render the fragment for `path` and fill `head`.
///
/// Deterministic: the same path, context and empty head always produce the
/// same fragment and head.
///
/// # Errors
///
/// Returns `RenderError::Template` if a template fails to render.
pub fn render(path: &str, context: &RenderContext, head: &mut Head) -> Result<String, RenderError> {
    let route = Route::parse(path);
    if route.is_not_found(context) {
        return render_not_found(path, head);
    }

    let html = match &route {
        Route::Home => {
            page_head(
                head,
                context,
                &route,
                "Gamepad Tester - Test Your Controller Online",
                "Free online gamepad tester. Check buttons, triggers, stick drift and vibration \
                 for Xbox, PlayStation and generic controllers.",
            );
            HomeTemplate {
                latest: context
                    .blogs
                    .iter()
                    .take(HOME_LATEST_POSTS)
                    .map(BlogView::summary)
                    .collect(),
            }
            .render()?
        }
        Route::BlogIndex => {
            page_head(
                head,
                context,
                &route,
                "Blog",
                "Controller troubleshooting guides, stick drift fixes and gamepad reviews.",
            );
            BlogIndexTemplate {
                posts: context.blogs.iter().map(BlogView::summary).collect(),
            }
            .render()?
        }
        Route::BlogPost { .. } => match &context.blog {
            Some(blog) => {
                blog_head(head, context, &route, blog);
                BlogShowTemplate {
                    post: BlogView::full(blog),
                }
                .render()?
            }
            None => return render_not_found(path, head),
        },
        Route::About => {
            page_head(
                head,
                context,
                &route,
                "About",
                "GamepadTest is a free browser-based controller tester.",
            );
            AboutTemplate.render()?
        }
        Route::Privacy => {
            page_head(
                head,
                context,
                &route,
                "Privacy Policy",
                "How GamepadTest handles your data.",
            );
            PrivacyTemplate.render()?
        }
        Route::Admin => {
            admin_head(head, "Blog Admin");
            AdminTemplate.render()?
        }
        Route::AdminLogin => {
            admin_head(head, "Admin Sign In");
            AdminLoginTemplate.render()?
        }
        Route::NotFound => return render_not_found(path, head),
    };

    Ok(html)
}

fn render_not_found(path: &str, head: &mut Head) -> Result<String, RenderError> {
    head.set_title(format!("Page Not Found | {SITE_NAME}"));
    head.meta_name("robots", "noindex");
    Ok(NotFoundTemplate { path }.render()?)
}

fn page_head(
    head: &mut Head,
    context: &RenderContext,
    route: &Route,
    title: &str,
    description: &str,
) {
    let full_title = format!("{title} | {SITE_NAME}");
    let url = context.url(&route.path());

    head.set_title(full_title.clone());
    head.meta_name("description", description);
    head.link("canonical", url.clone());
    head.meta_property("og:site_name", SITE_NAME);
    head.meta_property("og:type", "website");
    head.meta_property("og:title", full_title);
    head.meta_property("og:description", description);
    head.meta_property("og:url", url);
}

fn admin_head(head: &mut Head, title: &str) {
    head.set_title(format!("{title} | {SITE_NAME}"));
    head.meta_name("robots", "noindex, nofollow");
}

/// Plain-text description: the excerpt, or the start of the content.
fn describe(blog: &Blog) -> String {
    let source = if blog.excerpt.trim().is_empty() {
        blog.content.as_str()
    } else {
        blog.excerpt.as_str()
    };
    let words: Vec<&str> = source.split_whitespace().collect();
    let flat = words.join(" ");
    if flat.chars().count() <= DESCRIPTION_MAX_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(DESCRIPTION_MAX_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

fn blog_head(head: &mut Head, context: &RenderContext, route: &Route, blog: &Blog) {
    let url = context.url(&route.path());
    let description = describe(blog);
    let title = format!("{} | {SITE_NAME} Blog", blog.title);

    head.set_title(title);
    head.meta_name("description", description.clone());
    head.link("canonical", url.clone());
    head.meta_property("og:site_name", SITE_NAME);
    head.meta_property("og:type", "article");
    head.meta_property("og:title", blog.title.clone());
    head.meta_property("og:description", description.clone());
    head.meta_property("og:url", url.clone());
    head.meta_property("article:published_time", blog.created_at.to_rfc3339());
    head.meta_property("article:modified_time", blog.updated_at.to_rfc3339());
    if let Some(image) = image_url(blog) {
        head.meta_property("og:image", image);
        head.meta_name("twitter:card", "summary_large_image");
    } else {
        head.meta_name("twitter:card", "summary");
    }

    let mut article = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": blog.title,
        "description": description,
        "datePublished": blog.created_at.to_rfc3339(),
        "dateModified": blog.updated_at.to_rfc3339(),
        "mainEntityOfPage": url,
        "author": {"@type": "Organization", "name": SITE_NAME},
        "publisher": {"@type": "Organization", "name": SITE_NAME},
    });
    if let Some(image) = image_url(blog) {
        article["image"] = serde_json::Value::String(image.to_owned());
    }
    head.json_ld(&article);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use gamepadtest_core::{BlogId, DEFAULT_AUTHOR_ID};

    use super::*;

    const BASE: &str = "https://gamepadtest.com";

    fn blog(title: &str, slug: &str) -> Blog {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        Blog {
            id: BlogId::generate(),
            title: title.to_string(),
            slug: slug.to_string(),
            content: "## Why drift happens\n\nWorn **potentiometers**.".to_string(),
            excerpt: "Why sticks drift and how to fix it.".to_string(),
            featured_image: Some("https://cdn.gamepadtest.com/drift.png".to_string()),
            published: true,
            author_id: DEFAULT_AUTHOR_ID.to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn render_page(path: &str, context: &RenderContext) -> (String, Head) {
        let mut head = Head::new();
        let html = render(path, context, &mut head).unwrap();
        (html, head)
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/blog"), Route::BlogIndex);
        assert_eq!(Route::parse("/blog/"), Route::BlogIndex);
        assert_eq!(
            Route::parse("/blog/stick-drift"),
            Route::BlogPost {
                slug: "stick-drift".to_string()
            }
        );
        assert_eq!(Route::parse("/about"), Route::About);
        assert_eq!(Route::parse("/privacy?ref=footer"), Route::Privacy);
        assert_eq!(Route::parse("/admin"), Route::Admin);
        assert_eq!(Route::parse("/admin/login"), Route::AdminLogin);
        assert_eq!(Route::parse("/admin/other"), Route::NotFound);
        assert_eq!(Route::parse("/blog/a/b"), Route::NotFound);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
    }

    #[test]
    fn test_titles_per_route() {
        let context = RenderContext::new(BASE);
        let cases = [
            ("/", "Gamepad Tester - Test Your Controller Online | GamepadTest"),
            ("/blog", "Blog | GamepadTest"),
            ("/about", "About | GamepadTest"),
            ("/privacy", "Privacy Policy | GamepadTest"),
            ("/admin", "Blog Admin | GamepadTest"),
            ("/admin/login", "Admin Sign In | GamepadTest"),
            ("/missing", "Page Not Found | GamepadTest"),
        ];
        for (path, title) in cases {
            let (_, head) = render_page(path, &context);
            assert_eq!(head.title(), Some(title), "{path}");
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut context = RenderContext::new(BASE);
        context.blog = Some(blog("Stick Drift", "stick-drift"));
        context.blogs = vec![blog("Stick Drift", "stick-drift")];

        for path in ["/", "/blog", "/blog/stick-drift", "/missing"] {
            let first = render_page(path, &context);
            let second = render_page(path, &context);
            assert_eq!(first.0, second.0, "{path}");
            assert_eq!(first.1, second.1, "{path}");
        }
    }

    #[test]
    fn test_blog_post_head() {
        let mut context = RenderContext::new(BASE);
        context.blog = Some(blog("Stick Drift", "stick-drift"));

        let (html, head) = render_page("/blog/stick-drift", &context);
        assert!(html.contains("<strong>potentiometers</strong>"));
        assert!(html.contains("1 min read"));
        assert_eq!(head.title(), Some("Stick Drift | GamepadTest Blog"));
        assert_eq!(head.meta_content("og:type"), Some("article"));
        assert_eq!(
            head.meta_content("og:image"),
            Some("https://cdn.gamepadtest.com/drift.png")
        );
        assert_eq!(
            head.links()[0],
            Link {
                rel: "canonical".to_string(),
                href: "https://gamepadtest.com/blog/stick-drift".to_string()
            }
        );
        assert_eq!(head.scripts().len(), 1);
        assert!(head.scripts()[0].body.contains("\"@type\":\"Article\""));
    }

    #[test]
    fn test_missing_or_mismatched_post_is_not_found() {
        let context = RenderContext::new(BASE);
        let (html, head) = render_page("/blog/unpublished", &context);
        assert!(html.contains("Page not found"));
        assert_eq!(head.meta_content("robots"), Some("noindex"));
        assert!(Route::parse("/blog/unpublished").is_not_found(&context));

        let mut other = RenderContext::new(BASE);
        other.blog = Some(blog("Other", "other"));
        assert!(Route::parse("/blog/unpublished").is_not_found(&other));
        assert!(!Route::parse("/blog/other").is_not_found(&other));
    }

    #[test]
    fn test_blog_index_lists_posts() {
        let mut context = RenderContext::new(BASE);
        context.blogs = vec![blog("First", "first"), blog("Second", "second")];
        let (html, _) = render_page("/blog", &context);
        assert!(html.contains("href=\"/blog/first\""));
        assert!(html.contains("href=\"/blog/second\""));
        assert!(html.contains("March 1, 2025"));
    }

    #[test]
    fn test_describe_truncates_content() {
        let mut long = blog("Long", "long");
        long.excerpt = String::new();
        long.content = "word ".repeat(100);
        let description = describe(&long);
        assert!(description.ends_with("..."));
        assert!(description.chars().count() <= DESCRIPTION_MAX_CHARS);
    }
}
