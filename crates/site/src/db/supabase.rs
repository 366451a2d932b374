//! `PostgREST` client for the hosted project.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use gamepadtest_core::{Blog, BlogDraft, BlogId, BlogPatch, Email, Visibility};

use super::{BlogStore, RepositoryError};
use crate::config::SupabaseConfig;

const BLOGS_PATH: &str = "rest/v1/blogs";
const ADMIN_USERS_PATH: &str = "rest/v1/admin_users";

/// Ask `PostgREST` to echo written rows back.
const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

type Query = Vec<(&'static str, String)>;

/// Blog store backed by the project's REST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    blogs_url: Url,
    admin_users_url: Url,
}

impl SupabaseStore {
    /// Create a store for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Config` if the key is not a valid header
    /// value or the endpoints cannot be built, and
    /// `RepositoryError::Request` if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .default_headers(service_headers(&config.key)?)
            .build()?;
        let blogs_url = config
            .endpoint(BLOGS_PATH)
            .map_err(|e| RepositoryError::Config(e.to_string()))?;
        let admin_users_url = config
            .endpoint(ADMIN_USERS_PATH)
            .map_err(|e| RepositoryError::Config(e.to_string()))?;

        Ok(Self {
            client,
            blogs_url,
            admin_users_url,
        })
    }
}

/// Headers every request to the project carries.
///
/// The key goes out both as `apikey` and as the bearer token.
///
/// # Errors
///
/// Returns `RepositoryError::Config` if the key contains bytes that are not
/// allowed in a header.
pub fn service_headers(key: &SecretString) -> Result<HeaderMap, RepositoryError> {
    let key = key.expose_secret();
    let mut headers = HeaderMap::new();

    let mut apikey = HeaderValue::from_str(key)
        .map_err(|e| RepositoryError::Config(format!("invalid API key: {e}")))?;
    apikey.set_sensitive(true);
    headers.insert("apikey", apikey);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
        .map_err(|e| RepositoryError::Config(format!("invalid API key: {e}")))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}

/// Update body: the supplied patch fields plus the new timestamp.
#[derive(Serialize)]
struct UpdateRow<'a> {
    #[serde(flatten)]
    patch: &'a BlogPatch,
    updated_at: DateTime<Utc>,
}

fn visibility_filter(visibility: Visibility) -> Option<(&'static str, String)> {
    match visibility {
        Visibility::Published => Some(("published", "eq.true".to_owned())),
        Visibility::All => None,
    }
}

fn list_query(visibility: Visibility) -> Query {
    let mut query = vec![
        ("select", "*".to_owned()),
        ("order", "created_at.desc".to_owned()),
    ];
    query.extend(visibility_filter(visibility));
    query
}

fn slug_query(slug: &str, visibility: Visibility) -> Query {
    let mut query = vec![
        ("select", "*".to_owned()),
        ("slug", format!("eq.{slug}")),
    ];
    query.extend(visibility_filter(visibility));
    query.push(("limit", "1".to_owned()));
    query
}

fn id_filter(id: BlogId) -> Query {
    vec![("id", format!("eq.{id}"))]
}

fn admin_query(email: &Email) -> Query {
    vec![
        ("select", "id".to_owned()),
        ("email", format!("eq.{email}")),
        ("limit", "1".to_owned()),
    ]
}

/// Fail on a non-success status, keeping the body as the message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(RepositoryError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RepositoryError> {
    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait]
impl BlogStore for SupabaseStore {
    #[instrument(skip(self))]
    async fn list(&self, visibility: Visibility) -> Result<Vec<Blog>, RepositoryError> {
        let response = self
            .client
            .get(self.blogs_url.clone())
            .query(&list_query(visibility))
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self))]
    async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<Blog>, RepositoryError> {
        let response = self
            .client
            .get(self.blogs_url.clone())
            .query(&slug_query(slug, visibility))
            .send()
            .await?;
        let rows: Vec<Blog> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    async fn insert(&self, draft: BlogDraft) -> Result<Blog, RepositoryError> {
        let response = self
            .client
            .post(self.blogs_url.clone())
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&draft)
            .send()
            .await?;
        let rows: Vec<Blog> = read_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Decode("insert returned no row".to_owned()))
    }

    #[instrument(skip(self, patch), fields(blog_id = %id))]
    async fn update(&self, id: BlogId, patch: BlogPatch) -> Result<Option<Blog>, RepositoryError> {
        let body = UpdateRow {
            patch: &patch,
            updated_at: Utc::now(),
        };
        let response = self
            .client
            .patch(self.blogs_url.clone())
            .query(&id_filter(id))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&body)
            .send()
            .await?;
        let rows: Vec<Blog> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self), fields(blog_id = %id))]
    async fn delete(&self, id: BlogId) -> Result<(), RepositoryError> {
        let response = self
            .client
            .delete(self.blogs_url.clone())
            .query(&id_filter(id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn is_admin(&self, email: &Email) -> Result<bool, RepositoryError> {
        let response = self
            .client
            .get(self.admin_users_url.clone())
            .query(&admin_query(email))
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = read_json(response).await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), RepositoryError> {
        let response = self
            .client
            .get(self.blogs_url.clone())
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
