//! Document `<head>` collected while a page renders.

use askama::Template;

/// A `<meta>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meta {
    /// `<meta name="..." content="...">`
    Name { name: String, content: String },
    /// `<meta property="..." content="...">` (Open Graph)
    Property { property: String, content: String },
}

impl Meta {
    /// Attribute that carries the key: `name` or `property`.
    #[must_use]
    pub const fn attr(&self) -> &'static str {
        match self {
            Self::Name { .. } => "name",
            Self::Property { .. } => "property",
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Name { name, .. } => name,
            Self::Property { property, .. } => property,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Name { content, .. } | Self::Property { content, .. } => content,
        }
    }
}

/// A `<link>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// An inline `<script>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub kind: String,
    /// Already safe to place between `<script>` tags.
    pub body: String,
}

/// Title, meta tags, links and scripts for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    title: Option<String>,
    metas: Vec<Meta>,
    links: Vec<Link>,
    scripts: Vec<Script>,
}

#[derive(Template)]
#[template(path = "partials/head.html")]
struct HeadTemplate<'a> {
    head: &'a Head,
    nonce: &'a str,
}

impl Head {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title, replacing any earlier one.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn meta_name(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.metas.push(Meta::Name {
            name: name.into(),
            content: content.into(),
        });
    }

    pub fn meta_property(&mut self, property: impl Into<String>, content: impl Into<String>) {
        self.metas.push(Meta::Property {
            property: property.into(),
            content: content.into(),
        });
    }

    pub fn link(&mut self, rel: impl Into<String>, href: impl Into<String>) {
        self.links.push(Link {
            rel: rel.into(),
            href: href.into(),
        });
    }

    /// Add a JSON-LD block.
    pub fn json_ld(&mut self, value: &serde_json::Value) {
        // `</` would end the script element early.
        let body = value.to_string().replace("</", "<\\/");
        self.scripts.push(Script {
            kind: "application/ld+json".to_string(),
            body,
        });
    }

    #[must_use]
    pub fn metas(&self) -> &[Meta] {
        &self.metas
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Content of the first meta tag with this name or property.
    #[must_use]
    pub fn meta_content(&self, key: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|meta| meta.key() == key)
            .map(Meta::content)
    }

    /// Render the collected tags. Inline scripts carry `nonce`.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if the template fails to render.
    pub fn to_html(&self, nonce: &str) -> Result<String, askama::Error> {
        HeadTemplate { head: self, nonce }.render()
    }
}
