//! Blog commands against the site's HTTP API.
//!
//! # Usage
//!
//! ```bash
//! gt-cli blog list
//! gt-cli blog list --all --token "$TOKEN"
//! gt-cli blog show stick-drift-explained
//! gt-cli blog create --title "Stick Drift Explained" --content "$(cat post.md)" --publish
//! gt-cli blog update 6f1c2d44-... --title "New title" --unpublish
//! gt-cli blog delete 6f1c2d44-...
//! ```
//!
//! Admin commands use `--token`, or sign in with `GT_ADMIN_EMAIL` and
//! `GT_ADMIN_PASSWORD` when no token is given.

use reqwest::{Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use url::{ParseError, Url};

use gamepadtest_core::{Blog, BlogPatch, NewBlog};

use super::{AdminCredentials, CliError, admin_auth};

/// Client for the site's blog API.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    /// Create a client for the site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, CliError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        })
    }

    /// `base_url` followed by `segments`, each percent-encoded as a single
    /// path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, CliError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(CliError::InvalidSegment((*bad).to_owned()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CliError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, CliError> {
        let url = self.url(segments)?;
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn check(response: Response) -> Result<Response, CliError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(CliError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CliError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, CliError> {
        self.send(self.request(method, segments)?.json(body)).await
    }

    /// Published blogs, or every blog with `all`.
    pub async fn list(&self, all: bool) -> Result<Vec<Blog>, CliError> {
        let segments: &[&str] = if all {
            &["api", "admin", "blogs"]
        } else {
            &["api", "blogs"]
        };
        self.send(self.request(Method::GET, segments)?).await
    }

    /// One published blog.
    pub async fn show(&self, slug: &str) -> Result<Blog, CliError> {
        self.send(self.request(Method::GET, &["api", "blogs", slug])?)
            .await
    }

    pub async fn create(&self, blog: &NewBlog) -> Result<Blog, CliError> {
        self.send_json(Method::POST, &["api", "admin", "blogs"], blog)
            .await
    }

    pub async fn update(&self, id: &str, patch: &BlogPatch) -> Result<Blog, CliError> {
        self.send_json(Method::PATCH, &["api", "admin", "blogs", id], patch)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), CliError> {
        let builder = self.request(Method::DELETE, &["api", "admin", "blogs", id])?;
        Self::check(builder.send().await?).await?;
        Ok(())
    }
}

/// Token for admin commands: the flag, or a fresh sign-in.
///
/// # Errors
///
/// Returns `CliError::MissingToken` when neither a token nor credentials are
/// available, or the sign-in error.
pub async fn admin_token(
    token: Option<String>,
    credentials: Option<AdminCredentials>,
) -> Result<String, CliError> {
    if let Some(token) = token {
        return Ok(token);
    }
    let credentials = credentials.ok_or(CliError::MissingToken)?;

    let auth = admin_auth()?;
    auth.ready().await;
    let session = auth
        .login(&credentials.email, &credentials.password)
        .await?;
    tracing::info!("Signed in as {}", credentials.email);
    Ok(session.access_token)
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print blogs as a table: id, state, slug, title.
#[allow(clippy::print_stdout)]
pub fn print_list(blogs: &[Blog]) {
    for blog in blogs {
        let state = if blog.published { "published" } else { "draft" };
        println!("{}  {:<9}  {}  {}", blog.id, state, blog.slug, blog.title);
    }
    tracing::info!("{} blog(s)", blogs.len());
}

/// `blog list`
pub async fn list(client: &ApiClient, all: bool) -> Result<(), CliError> {
    let blogs = client.list(all).await?;
    print_list(&blogs);
    Ok(())
}

/// `blog show`
pub async fn show(client: &ApiClient, slug: &str) -> Result<(), CliError> {
    print_json(&client.show(slug).await?)
}

/// `blog create`
pub async fn create(client: &ApiClient, blog: NewBlog) -> Result<(), CliError> {
    let created = client.create(&blog).await?;
    tracing::info!("Created {} at /blog/{}", created.id, created.slug);
    print_json(&created)
}

/// `blog update`
pub async fn update(client: &ApiClient, id: &str, patch: BlogPatch) -> Result<(), CliError> {
    let updated = client.update(id, &patch).await?;
    tracing::info!("Updated {}", updated.id);
    print_json(&updated)
}

/// `blog delete`
pub async fn delete(client: &ApiClient, id: &str) -> Result<(), CliError> {
    client.delete(id).await?;
    tracing::info!("Deleted {id}");
    Ok(())
}
